//! Configuration types for firecmd.
//!
//! `AssistantConfig` is the top-level `config.toml`. Every field has a
//! default so an empty file (or no file) yields a working configuration,
//! apart from identifiers only a deployment can supply (memory id, runtime
//! ARN). Secrets never live here; they are read from the environment.

use serde::{Deserialize, Serialize};

use crate::event::EventEncoding;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// AWS region hosting every managed service.
    pub region: String,
    /// Encoding of map event tags in tool output.
    pub event_encoding: EventEncoding,
    pub agent: AgentSettings,
    pub memory: MemorySettings,
    pub station: StationSettings,
    pub cctv: CctvSettings,
    pub weather: WeatherSettings,
    pub geocoder: GeocoderSettings,
    pub encyclopedia: EncyclopediaSettings,
    pub news: NewsSettings,
    pub gateway: GatewaySettings,
    pub runtime: RuntimeSettings,
}

pub const DEFAULT_REGION: &str = "us-west-2";

impl AssistantConfig {
    /// Region with the default applied when the file left it empty.
    pub fn region(&self) -> &str {
        if self.region.is_empty() {
            DEFAULT_REGION
        } else {
            &self.region
        }
    }
}

/// Main agent model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub name: String,
    pub model_id: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub max_tool_rounds: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: "FireCommandAssistant".to_string(),
            model_id: "global.anthropic.claude-sonnet-4-5-20250929-v1:0".to_string(),
            max_tokens: 4096,
            temperature: None,
            max_tool_rounds: 8,
        }
    }
}

/// Managed memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Identifier of the managed memory resource. Empty means unset.
    pub memory_id: String,
    /// Turn groups loaded into the system prompt.
    pub recent_turns: usize,
    /// Records retrieved from long-term memory per user message.
    pub retrieve_top_k: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            memory_id: String::new(),
            recent_turns: 5,
            retrieve_top_k: 3,
        }
    }
}

/// Fire station lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StationSettings {
    pub bucket: String,
    pub index: String,
    pub top_k: usize,
    pub embedding_model_id: String,
}

impl Default for StationSettings {
    fn default() -> Self {
        Self {
            bucket: "firestation-location-xy".to_string(),
            index: "fire-station".to_string(),
            top_k: 5,
            embedding_model_id: "amazon.titan-embed-text-v2:0".to_string(),
        }
    }
}

/// CCTV index written by the offline loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CctvSettings {
    pub bucket: String,
    pub index: String,
}

impl Default for CctvSettings {
    fn default() -> Self {
        Self {
            bucket: "cctv-m3u8".to_string(),
            index: "cctv-cheonan".to_string(),
        }
    }
}

/// Point-forecast API settings. The API key comes from `WINDY_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    pub api_url: String,
    pub model: String,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.windy.com/api/point-forecast/v2".to_string(),
            model: "gfs".to_string(),
        }
    }
}

/// Reverse geocoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub url: String,
    pub user_agent: String,
    pub language: String,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: "DisasterMonitoring/1.0".to_string(),
            language: "ko".to_string(),
        }
    }
}

/// Encyclopedia lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncyclopediaSettings {
    pub language: String,
    pub summary_chars: usize,
    pub max_options: usize,
}

impl Default for EncyclopediaSettings {
    fn default() -> Self {
        Self {
            language: "ko".to_string(),
            summary_chars: 500,
            max_options: 5,
        }
    }
}

/// News sub-agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    pub model_id: String,
    pub max_tokens: u32,
    pub max_tool_rounds: u32,
    /// Readable text returned by the browser tool is cut to this many chars.
    pub max_page_chars: usize,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            model_id: "global.anthropic.claude-haiku-4-5-20251001-v1:0".to_string(),
            max_tokens: 4096,
            max_tool_rounds: 6,
            max_page_chars: 20_000,
        }
    }
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    pub bind: String,
    /// ARN of the hosted agent runtime.
    pub runtime_arn: Option<String>,
    /// Unsigned local runtime base URL; takes precedence over the ARN.
    pub runtime_endpoint: Option<String>,
    /// Fixed runtime session id. Derived from actor/session when unset.
    pub runtime_session_id: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8082".to_string(),
            runtime_arn: None,
            runtime_endpoint: None,
            runtime_session_id: None,
            connect_timeout_secs: 600,
            read_timeout_secs: 3000,
        }
    }
}

/// Agent runtime server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub bind: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}
