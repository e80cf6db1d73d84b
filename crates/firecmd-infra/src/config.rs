//! Configuration loader for firecmd.
//!
//! Reads `config.toml` and deserializes it into [`AssistantConfig`]. Falls
//! back to defaults when the file is missing or malformed, then applies
//! environment overrides. Secrets are read from the environment only.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use firecmd_types::config::AssistantConfig;
use firecmd_types::error::ConfigError;

use crate::aws::credentials::non_empty_var;
use crate::web::windy;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "FIRECMD_CONFIG";

/// Resolve the config file path.
///
/// Priority: explicit path (`--config`), then `FIRECMD_CONFIG`, then
/// `<config dir>/firecmd/config.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = non_empty_var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("firecmd").join("config.toml"))
}

/// Read and parse one config file.
pub async fn read_config_file(path: &Path) -> Result<Option<AssistantConfig>, ConfigError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(ConfigError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            });
        }
    };
    toml::from_str::<AssistantConfig>(&content)
        .map(Some)
        .map_err(|err| ConfigError::Parse {
            path: path.display().to_string(),
            message: err.to_string(),
        })
}

/// Load configuration from `path` (see [`resolve_config_path`]).
///
/// - If the file does not exist, the defaults are used.
/// - If the file exists but fails to read or parse, logs a warning and uses the defaults.
///
/// Environment overrides are applied last.
pub async fn load_config(explicit: Option<&Path>) -> AssistantConfig {
    let mut config = match resolve_config_path(explicit) {
        Some(path) => match read_config_file(&path).await {
            Ok(Some(config)) => {
                tracing::debug!("Loaded configuration from {}", path.display());
                config
            }
            Ok(None) => {
                tracing::debug!("No config.toml found at {}, using defaults", path.display());
                AssistantConfig::default()
            }
            Err(err) => {
                tracing::warn!("{err}, using defaults");
                AssistantConfig::default()
            }
        },
        None => AssistantConfig::default(),
    };
    apply_env_overrides(&mut config, non_empty_var);
    config
}

/// Apply `FIRECMD_*` overrides. `lookup` returns a variable's non-empty value.
pub fn apply_env_overrides(config: &mut AssistantConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(region) = lookup("FIRECMD_REGION") {
        config.region = region;
    }
    if let Some(memory_id) = lookup("FIRECMD_MEMORY_ID") {
        config.memory.memory_id = memory_id;
    }
    if let Some(model_id) = lookup("FIRECMD_MODEL_ID") {
        config.agent.model_id = model_id;
    }
    if let Some(arn) = lookup("FIRECMD_RUNTIME_ARN") {
        config.gateway.runtime_arn = Some(arn);
    }
    if let Some(endpoint) = lookup("FIRECMD_RUNTIME_ENDPOINT") {
        config.gateway.runtime_endpoint = Some(endpoint);
    }
}

/// The memory resource id, which has no usable default.
pub fn require_memory_id(config: &AssistantConfig) -> Result<&str, ConfigError> {
    let id = config.memory.memory_id.as_str();
    if id.is_empty() {
        return Err(ConfigError::Missing("memory.memory_id".to_string()));
    }
    Ok(id)
}

/// Secrets from the environment. AWS credentials are resolved separately
/// by [`AwsAuth::from_env`](crate::aws::AwsAuth::from_env).
pub struct Secrets {
    pub windy_api_key: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            windy_api_key: non_empty_var(windy::API_KEY_VAR).map(SecretString::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firecmd_types::event::EventEncoding;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_config_file_missing_returns_none() {
        let tmp = TempDir::new().unwrap();
        let result = read_config_file(&tmp.path().join("config.toml")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn read_config_file_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(
            &config_path,
            r#"
region = "ap-northeast-2"
event_encoding = "positional"

[memory]
memory_id = "FireMemory-xyz"
recent_turns = 3

[news]
model_id = "us.anthropic.claude-haiku"
"#,
        )
        .await
        .unwrap();

        let config = read_config_file(&config_path).await.unwrap().unwrap();
        assert_eq!(config.region(), "ap-northeast-2");
        assert_eq!(config.event_encoding, EventEncoding::Positional);
        assert_eq!(config.memory.recent_turns, 3);
        assert_eq!(config.news.model_id, "us.anthropic.claude-haiku");
        assert_eq!(config.station.top_k, 5);
    }

    #[tokio::test]
    async fn read_config_file_invalid_toml_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "this is not { valid toml !!!")
            .await
            .unwrap();

        assert!(matches!(
            read_config_file(&config_path).await,
            Err(ConfigError::Parse { .. })
        ));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        tokio::fs::write(&config_path, "[agent\nname = 1").await.unwrap();

        let config = load_config(Some(&config_path)).await;
        assert_eq!(config.agent.max_tool_rounds, 8);
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/firecmd-test.toml");
        assert_eq!(resolve_config_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let vars = HashMap::from([
            ("FIRECMD_REGION", "eu-central-1"),
            ("FIRECMD_MEMORY_ID", "FromEnv-1"),
            ("FIRECMD_RUNTIME_ENDPOINT", "http://localhost:8080"),
        ]);
        let mut config = AssistantConfig::default();
        config.memory.memory_id = "FromFile".to_string();

        apply_env_overrides(&mut config, |name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.region(), "eu-central-1");
        assert_eq!(config.memory.memory_id, "FromEnv-1");
        assert_eq!(config.gateway.runtime_endpoint.as_deref(), Some("http://localhost:8080"));
        assert!(config.gateway.runtime_arn.is_none());
        assert_eq!(config.agent.model_id, AssistantConfig::default().agent.model_id);
    }

    #[test]
    fn missing_memory_id_is_reported() {
        let mut config = AssistantConfig::default();
        assert!(matches!(require_memory_id(&config), Err(ConfigError::Missing(_))));
        config.memory.memory_id = "m".to_string();
        assert_eq!(require_memory_id(&config).unwrap(), "m");
    }
}
