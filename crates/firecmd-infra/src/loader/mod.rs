//! Offline embedding loaders.
//!
//! Read reference rows from a CSV export of the public datasets (UTF-8 or
//! EUC-KR) or a JSON Lines file, embed each row's text and write the
//! records to a vector index in batches of [`PUT_BATCH_SIZE`]. Any failure
//! aborts the load.

pub mod rows;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use firecmd_core::vector::box_embedder::BoxEmbedder;
use firecmd_core::vector::box_index::BoxVectorIndex;
use firecmd_types::vector::{IndexRef, PUT_BATCH_SIZE, VectorRecord, record_key};

use self::rows::ReferenceRow;

/// Outcome of one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub records: usize,
    pub batches: usize,
}

/// Input file layout, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Header row plus records; Korean column names are accepted.
    Csv,
    /// One JSON object per line.
    JsonLines,
}

impl InputFormat {
    /// `.csv` (any case) is CSV; everything else is JSON Lines.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::JsonLines,
        }
    }
}

/// Decode a dataset file: UTF-8 (BOM dropped) when valid, else EUC-KR.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
            if had_errors {
                warn!("input is neither UTF-8 nor clean EUC-KR; undecodable bytes were replaced");
            }
            text.into_owned()
        }
    }
}

/// Parse CSV with a header row. Cells are trimmed; extra columns are ignored.
pub fn parse_csv_rows<R: ReferenceRow>(content: &str) -> Result<Vec<R>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    reader
        .deserialize::<R>()
        .enumerate()
        .map(|(n, row)| row.with_context(|| format!("record {}: invalid {} row", n + 1, R::SOURCE)))
        .collect()
}

/// Parse JSON Lines; blank lines are skipped.
pub fn parse_rows<R: ReferenceRow>(content: &str) -> Result<Vec<R>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<R>(line).with_context(|| format!("line {}: invalid {} row", n + 1, R::SOURCE))
        })
        .collect()
}

/// Embed `rows` and write them to `target`.
///
/// Row `i` is stored under `<source>_<i>`, with `i` counting rows in file
/// order.
pub async fn load_rows<R: ReferenceRow>(
    rows: &[R],
    embedder: &BoxEmbedder,
    index: &BoxVectorIndex,
    target: &IndexRef,
) -> Result<LoadSummary> {
    info!(source = R::SOURCE, rows = rows.len(), index = %target.index, "Starting embedding load");

    let mut batch: Vec<VectorRecord> = Vec::with_capacity(PUT_BATCH_SIZE);
    let mut summary = LoadSummary {
        records: 0,
        batches: 0,
    };

    for (i, row) in rows.iter().enumerate() {
        debug!(row = i + 1, total = rows.len(), name = row.label(), "embedding row");
        let embedding = embedder
            .embed_one(&row.embedding_text())
            .await
            .with_context(|| format!("failed to embed row {i} ({})", row.label()))?;

        batch.push(VectorRecord {
            key: record_key(R::SOURCE, i),
            embedding,
            metadata: row.metadata(),
        });

        if batch.len() == PUT_BATCH_SIZE {
            flush(index, target, &mut batch, &mut summary).await?;
            info!(stored = summary.records, total = rows.len(), "batch stored");
        }
    }
    if !batch.is_empty() {
        flush(index, target, &mut batch, &mut summary).await?;
    }

    info!(source = R::SOURCE, records = summary.records, batches = summary.batches, "Embedding load complete");
    Ok(summary)
}

async fn flush(
    index: &BoxVectorIndex,
    target: &IndexRef,
    batch: &mut Vec<VectorRecord>,
    summary: &mut LoadSummary,
) -> Result<()> {
    index
        .put(target, batch)
        .await
        .with_context(|| format!("failed to write batch to {}/{}", target.bucket, target.index))?;
    summary.records += batch.len();
    summary.batches += 1;
    batch.clear();
    Ok(())
}

/// Read `input` and load it into `target`. The format follows the file
/// extension, see [`InputFormat::from_path`].
pub async fn load_file<R: ReferenceRow>(
    input: &Path,
    embedder: &BoxEmbedder,
    index: &BoxVectorIndex,
    target: &IndexRef,
) -> Result<LoadSummary> {
    let bytes = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let content = decode_text(&bytes);
    let format = InputFormat::from_path(input);
    debug!(path = %input.display(), ?format, "parsing input");

    let rows: Vec<R> = match format {
        InputFormat::Csv => parse_csv_rows(&content),
        InputFormat::JsonLines => parse_rows(&content),
    }
    .with_context(|| format!("failed to parse {}", input.display()))?;
    load_rows(&rows, embedder, index, target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use firecmd_core::vector::embedder::Embedder;
    use firecmd_core::vector::index::VectorIndex;
    use firecmd_types::error::StoreError;
    use firecmd_types::vector::VectorMatch;

    use super::rows::{CctvRow, StationRow};

    struct CountingEmbedder {
        fail_on: Option<String>,
    }

    impl Embedder for CountingEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StoreError> {
            if let Some(bad) = &self.fail_on {
                if texts.iter().any(|t| t.contains(bad.as_str())) {
                    return Err(StoreError::Upstream {
                        status: 400,
                        message: "bad input".into(),
                    });
                }
            }
            Ok(texts.iter().map(|t| vec![t.chars().count() as f32]).collect())
        }

        fn model_name(&self) -> &str {
            "counting"
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    type Batches = Arc<Mutex<Vec<Vec<VectorRecord>>>>;

    struct RecordingIndex {
        batches: Batches,
    }

    fn recording_index() -> (BoxVectorIndex, Batches) {
        let batches = Batches::default();
        let index = BoxVectorIndex::new(RecordingIndex {
            batches: Arc::clone(&batches),
        });
        (index, batches)
    }

    impl VectorIndex for RecordingIndex {
        async fn query(&self, _: &IndexRef, _: &[f32], _: usize) -> Result<Vec<VectorMatch>, StoreError> {
            Ok(vec![])
        }

        async fn put(&self, _: &IndexRef, records: &[VectorRecord]) -> Result<(), StoreError> {
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }

    fn cctv_lines(n: usize) -> String {
        (0..n)
            .map(|i| {
                format!(
                    r#"{{"cctv_id":"C-{i}","name":"카메라{i}","address":"천안","latitude":36.8,"longitude":127.1,"stream_url":"u{i}"}}"#
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_batches_of_fifty_with_final_partial_batch() {
        let rows: Vec<CctvRow> = parse_rows(&cctv_lines(120)).unwrap();
        let (index, recorded) = recording_index();
        let embedder = BoxEmbedder::new(CountingEmbedder { fail_on: None });
        let target = IndexRef::new("cctv-m3u8", "cctv-cheonan");

        let summary = load_rows(&rows, &embedder, &index, &target).await.unwrap();
        assert_eq!(summary, LoadSummary { records: 120, batches: 3 });

        let batches = recorded.lock().unwrap();
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(batches[0][0].key, "cctv_0");
        assert_eq!(batches[2][19].key, "cctv_119");
        assert_eq!(batches[1][0].metadata["cctv_id"], "C-50");
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_with_context() {
        let content = r#"{"name":"서초소방서","latitude":37.4,"longitude":127.0}
{"name":"오류소방서","latitude":37.5,"longitude":127.1}"#;
        let rows: Vec<StationRow> = parse_rows(content).unwrap();
        let (index, recorded) = recording_index();
        let embedder = BoxEmbedder::new(CountingEmbedder {
            fail_on: Some("오류".to_string()),
        });
        let target = IndexRef::new("firestation-location-xy", "fire-station");

        let err = load_rows(&rows, &embedder, &index, &target).await.unwrap_err();
        assert!(err.to_string().contains("failed to embed row 1 (오류소방서)"));
        assert!(recorded.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_line_is_reported() {
        let err = parse_rows::<StationRow>("{\"name\":\"x\",\"latitude\":1,\"longitude\":2}\n\nnot json")
            .unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    const STATION_CSV: &str = "연번,소방서 및 안전센터명,상위 본부명,유형,주소,전화번호,X좌표,Y좌표
1,서초소방서,서울소방재난본부,소방서,서울특별시 서초구 남부순환로 2584,02-6981-7300,37.4837,127.0324
2, 양재119안전센터 ,서울소방재난본부,안전센터,서울특별시 서초구 강남대로 224,,37.4701,127.0382
";

    #[tokio::test]
    async fn test_load_file_reads_euc_kr_csv() {
        let (encoded, _, unmappable) = encoding_rs::EUC_KR.encode(STATION_CSV);
        assert!(!unmappable);
        assert!(std::str::from_utf8(&encoded).is_err());

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("firestation.csv");
        tokio::fs::write(&path, &encoded).await.unwrap();

        let (index, recorded) = recording_index();
        let summary = load_file::<StationRow>(
            &path,
            &BoxEmbedder::new(CountingEmbedder { fail_on: None }),
            &index,
            &IndexRef::new("firestation-location-xy", "fire-station"),
        )
        .await
        .unwrap();
        assert_eq!(summary, LoadSummary { records: 2, batches: 1 });

        let batches = recorded.lock().unwrap();
        let first = &batches[0][0];
        assert_eq!(first.key, "firestation_0");
        assert_eq!(first.metadata["name"], "서초소방서");
        assert_eq!(first.metadata["headquarters"], "서울소방재난본부");
        assert_eq!(first.metadata["latitude"], "37.4837");
        let second = &batches[0][1];
        assert_eq!(second.metadata["name"], "양재119안전센터");
        assert_eq!(second.metadata["phone"], "");
        assert_eq!(second.metadata["type"], "안전센터");
    }

    #[test]
    fn test_decode_text_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("설치위치명,위도".as_bytes());
        assert_eq!(decode_text(&bytes), "설치위치명,위도");
    }

    #[test]
    fn test_csv_row_error_names_record() {
        let content = "설치위치명,위도,경도\n천안IC,36.8,127.15\n천안역,북쪽,127.1\n";
        let err = parse_csv_rows::<CctvRow>(content).unwrap_err();
        assert!(err.to_string().contains("record 2"), "{err}");
    }

    #[test]
    fn test_format_follows_extension() {
        assert_eq!(InputFormat::from_path(Path::new("cctv.CSV")), InputFormat::Csv);
        assert_eq!(InputFormat::from_path(Path::new("cctv.jsonl")), InputFormat::JsonLines);
        assert_eq!(InputFormat::from_path(Path::new("cctv")), InputFormat::JsonLines);
    }

    #[tokio::test]
    async fn test_load_file_reads_jsonl() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("cctv.jsonl");
        tokio::fs::write(&path, cctv_lines(3)).await.unwrap();

        let (index, _recorded) = recording_index();
        let summary = load_file::<CctvRow>(
            &path,
            &BoxEmbedder::new(CountingEmbedder { fail_on: None }),
            &index,
            &IndexRef::new("b", "i"),
        )
        .await
        .unwrap();
        assert_eq!(summary.records, 3);
    }
}
