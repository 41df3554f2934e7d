use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Engine configuration. Loaded once from a TOML file when present,
/// otherwise every field falls back to its default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reasoning model identifier sent with every request.
    pub model: String,
    /// Messages endpoint of the reasoning service.
    pub endpoint: String,
    /// Per-call timeout in seconds.
    pub request_timeout_secs: u64,
    /// Extra attempts after the first failed reasoning call.
    pub retry_budget: u32,
    /// max_tokens sent with every reasoning request.
    pub max_tokens: u32,
    /// Root directory for the JSON-file storage backend.
    pub data_dir: PathBuf,
    /// Minimum interval between submission syncs, in seconds.
    pub min_sync_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            model: "claude-sonnet-4-5".to_string(),
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            request_timeout_secs: 30,
            retry_budget: 2,
            max_tokens: 2000,
            data_dir: PathBuf::from("data"),
            min_sync_interval_secs: 60,
        }
    }
}

fn get_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("LEETPLAN_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("leetplan.toml")
}

fn load_engine_config_internal() -> EngineConfig {
    let config_path = get_config_path();

    // Try to load from config file
    if let Ok(content) = fs::read_to_string(&config_path) {
        match toml::from_str::<EngineConfig>(&content) {
            Ok(config) => {
                tracing::info!(path = ?config_path, "Loaded engine config");
                return config;
            }
            Err(e) => {
                tracing::warn!(path = ?config_path, error = %e, "Failed to parse config, using defaults");
            }
        }
    }

    // Return defaults if file doesn't exist or parsing fails
    tracing::debug!("Using default engine configuration");
    EngineConfig::default()
}

lazy_static! {
    static ref ENGINE_CONFIG: EngineConfig = load_engine_config_internal();
}

/// Get the cached engine configuration (loaded once at startup).
pub fn get_engine_config() -> &'static EngineConfig {
    &ENGINE_CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        assert_eq!(config.retry_budget, 2);
        assert_eq!(config.min_sync_interval_secs, 60);
        assert!(config.endpoint.starts_with("https://"));
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: EngineConfig =
            toml::from_str("model = \"claude-3-5-haiku\"\nretry_budget = 1\n").unwrap();
        assert_eq!(config.model, "claude-3-5-haiku");
        assert_eq!(config.retry_budget, 1);
        assert_eq!(config.request_timeout_secs, 30);
    }
}
