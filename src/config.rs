use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    #[serde(default)]
    pub engine: EngineSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EngineSettings {
    /// Commit-conflict retries before the error is handed back to the
    /// host's redelivery policy.
    pub max_commit_retries: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_commit_retries: crate::engine::DEFAULT_MAX_COMMIT_RETRIES,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_settings_default() {
        let yaml = r#"
log_level: info
log_dir: ./logs
log_file: p2p_escrow.log
use_json: false
rotation: daily
enable_tracing: true
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine.max_commit_retries, 5);
    }

    #[test]
    fn test_engine_settings_override() {
        let yaml = r#"
log_level: debug
log_dir: ./logs
log_file: p2p_escrow.log
use_json: true
rotation: hourly
enable_tracing: true
engine:
  max_commit_retries: 12
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.engine.max_commit_retries, 12);
        assert!(config.use_json);
    }
}
