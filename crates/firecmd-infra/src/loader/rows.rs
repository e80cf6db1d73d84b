//! Reference row shapes read by the embedding loaders.
//!
//! Field names follow the English metadata keys; the Korean column names of
//! the public CSV datasets are accepted as aliases.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::de::DeserializeOwned;

/// A row that can be embedded and stored in a vector index.
pub trait ReferenceRow: DeserializeOwned {
    /// Key prefix, see [`record_key`](firecmd_types::vector::record_key).
    const SOURCE: &'static str;

    /// Text that is embedded.
    fn embedding_text(&self) -> String;

    /// Flat string metadata stored next to the embedding.
    fn metadata(&self) -> BTreeMap<String, String>;

    /// Short label for progress logs.
    fn label(&self) -> &str;
}

fn metadata(pairs: &[(&str, String)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A fire station or safety center.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRow {
    #[serde(alias = "소방서 및 안전센터명")]
    pub name: String,
    #[serde(alias = "주소", default)]
    pub address: String,
    #[serde(alias = "전화번호", default)]
    pub phone: String,
    #[serde(alias = "X좌표")]
    pub latitude: f64,
    #[serde(alias = "Y좌표")]
    pub longitude: f64,
    #[serde(rename = "type", alias = "유형", default)]
    pub kind: String,
    #[serde(alias = "상위 본부명", default)]
    pub headquarters: String,
}

impl ReferenceRow for StationRow {
    const SOURCE: &'static str = "firestation";

    fn embedding_text(&self) -> String {
        format!(
            "{} , 위치: {} , 소속: {} , 위도: {:.6} , 경도: {:.6}",
            self.name, self.address, self.headquarters, self.latitude, self.longitude
        )
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        metadata(&[
            ("name", self.name.clone()),
            ("address", self.address.clone()),
            ("phone", self.phone.clone()),
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("type", self.kind.clone()),
            ("headquarters", self.headquarters.clone()),
        ])
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// A traffic CCTV camera with a live stream.
#[derive(Debug, Clone, Deserialize)]
pub struct CctvRow {
    #[serde(alias = "CCTV관리번호", default)]
    pub cctv_id: String,
    #[serde(alias = "설치위치명")]
    pub name: String,
    #[serde(alias = "설치위치주소", default)]
    pub address: String,
    #[serde(alias = "위도")]
    pub latitude: f64,
    #[serde(alias = "경도")]
    pub longitude: f64,
    #[serde(alias = "스트리밍 프로토콜(HTTP)주소", default)]
    pub stream_url: String,
}

impl ReferenceRow for CctvRow {
    const SOURCE: &'static str = "cctv";

    fn embedding_text(&self) -> String {
        format!(
            "{}, 위치: {}, 위도: {:.6}, 경도: {:.6}",
            self.name, self.address, self.latitude, self.longitude
        )
    }

    fn metadata(&self) -> BTreeMap<String, String> {
        metadata(&[
            ("cctv_id", self.cctv_id.clone()),
            ("name", self.name.clone()),
            ("address", self.address.clone()),
            ("latitude", self.latitude.to_string()),
            ("longitude", self.longitude.to_string()),
            ("stream_url", self.stream_url.clone()),
        ])
    }

    fn label(&self) -> &str {
        &self.name
    }
}
