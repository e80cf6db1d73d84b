//! Nearest fire station lookup.
//!
//! The incident address is embedded and matched against the station index;
//! ranking is whatever the index returns. Each hit carries a geocode event
//! tag so the map can place a marker.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use firecmd_types::event::{EventEncoding, EventTag, GeocodeEvent};
use firecmd_types::tool::ToolError;
use firecmd_types::vector::{IndexRef, VectorMatch};

use crate::vector::box_embedder::BoxEmbedder;
use crate::vector::box_index::BoxVectorIndex;

use super::{Tool, parse_args, schema_of};

pub const NO_STATION_FOUND: &str = "소방서를 찾을 수 없습니다.";
const NAME_FALLBACK: &str = "소방서";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StationArgs {
    /// 한국 주소 (예: 서울특별시 서초구 방배중앙로 06681)
    pub address: String,
}

/// Render ranked station matches for the model.
pub fn format_stations(address: &str, matches: &[VectorMatch], encoding: EventEncoding) -> String {
    if matches.is_empty() {
        return NO_STATION_FOUND.to_string();
    }

    let mut out = format!(
        "화재 발생 주소: {address}\n\n가까운 소방서 {}곳 :\n\n",
        matches.len()
    );
    for (idx, m) in matches.iter().enumerate() {
        let name = m
            .metadata
            .get("name")
            .map(String::as_str)
            .unwrap_or(NAME_FALLBACK);
        let lat = m.field("latitude");
        let lon = m.field("longitude");

        out.push_str(&format!("{}. {name}\n", idx + 1));
        out.push_str(&format!("   - 위도: {lat}, 경도: {lon}\n"));
        out.push_str(&format!("   - 주소: {}\n", m.field("address")));
        out.push_str(&format!("   - 전화번호: {}\n", m.field("phone")));

        if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
            let tag = EventTag::Geocode(GeocodeEvent {
                lat,
                lon,
                name: name.to_string(),
            });
            out.push_str(&format!("   - {}\n", tag.render(encoding)));
        }
    }
    out
}

pub struct FireStationTool {
    embedder: Arc<BoxEmbedder>,
    index: Arc<BoxVectorIndex>,
    index_ref: IndexRef,
    top_k: usize,
    encoding: EventEncoding,
}

impl FireStationTool {
    pub fn new(
        embedder: Arc<BoxEmbedder>,
        index: Arc<BoxVectorIndex>,
        index_ref: IndexRef,
        top_k: usize,
        encoding: EventEncoding,
    ) -> Self {
        Self {
            embedder,
            index,
            index_ref,
            top_k,
            encoding,
        }
    }
}

#[async_trait]
impl Tool for FireStationTool {
    fn name(&self) -> &str {
        "find_fire_station"
    }

    fn description(&self) -> &str {
        "화재 발생 시 주소를 기반으로 가까운 소방서 5곳을 벡터 검색으로 찾습니다. \
         소방서별 위도, 경도, 주소, 전화번호를 반환하므로 최적의 출동 소방서를 판단할 수 있습니다."
    }

    fn args_schema(&self) -> Value {
        schema_of::<StationArgs>()
    }

    async fn call(&self, args: Value) -> Result<String, ToolError> {
        let args: StationArgs = parse_args(args)?;
        if args.address.trim().is_empty() {
            return Err(ToolError::InvalidInput("address is empty".to_string()));
        }
        info!(address = %args.address, "Searching nearest fire stations");

        let embedding = self.embedder.embed_one(&args.address).await?;
        let matches = self
            .index
            .query(&self.index_ref, &embedding, self.top_k)
            .await?;
        for m in &matches {
            debug!(key = %m.key, distance = ?m.distance, name = m.field("name"), "Station match");
        }

        Ok(format_stations(&args.address, &matches, self.encoding))
    }
}
