//! `firecmd load`: offline embedding loads.

use std::path::Path;

use firecmd_infra::loader::load_file;
use firecmd_infra::loader::rows::{CctvRow, StationRow};
use firecmd_types::config::AssistantConfig;
use firecmd_types::vector::IndexRef;

use super::Dataset;
use crate::state::{aws_client, vector_services};

/// Configured index for `dataset`, with CLI overrides applied.
pub fn target_index(
    config: &AssistantConfig,
    dataset: Dataset,
    bucket: Option<String>,
    index: Option<String>,
) -> IndexRef {
    let (default_bucket, default_index) = match dataset {
        Dataset::Stations => (&config.station.bucket, &config.station.index),
        Dataset::Cctv => (&config.cctv.bucket, &config.cctv.index),
    };
    IndexRef::new(
        bucket.unwrap_or_else(|| default_bucket.clone()),
        index.unwrap_or_else(|| default_index.clone()),
    )
}

pub async fn load(
    config: &AssistantConfig,
    dataset: Dataset,
    input: &Path,
    bucket: Option<String>,
    index: Option<String>,
) -> anyhow::Result<()> {
    let target = target_index(config, dataset, bucket, index);
    let aws = aws_client(config, reqwest::Client::new())?;
    let (embedder, vectors) = vector_services(config, &aws);

    let summary = match dataset {
        Dataset::Stations => load_file::<StationRow>(input, &embedder, &vectors, &target).await?,
        Dataset::Cctv => load_file::<CctvRow>(input, &embedder, &vectors, &target).await?,
    };

    println!(
        "  {} {} records stored in {}/{} ({} batches)",
        console::style("✓").green(),
        summary.records,
        target.bucket,
        target.index,
        summary.batches
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_defaults_and_overrides() {
        let config = AssistantConfig::default();
        assert_eq!(
            target_index(&config, Dataset::Stations, None, None),
            IndexRef::new("firestation-location-xy", "fire-station")
        );
        assert_eq!(
            target_index(&config, Dataset::Cctv, None, None),
            IndexRef::new("cctv-m3u8", "cctv-cheonan")
        );
        assert_eq!(
            target_index(&config, Dataset::Cctv, Some("b".into()), None),
            IndexRef::new("b", "cctv-cheonan")
        );
    }
}
