use serde::Deserialize;
use std::env;
use std::path::PathBuf;

const DEFAULT_AI_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the persisted layout (`settings.json`, `connections/`).
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub style: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Pick up a local .env before reading the environment.
        let _ = dotenv::dotenv();

        let mut builder = config::Config::builder()
            .set_default(
                "storage.data_dir",
                default_data_dir().to_string_lossy().to_string(),
            )?
            .set_default("ai.timeout_secs", DEFAULT_AI_TIMEOUT_SECS)?
            .set_default("logging.level", "info")?
            .set_default("logging.style", "auto")?;

        // Load from environment variables
        if let Ok(data_dir) = env::var("QUERYDESK_DATA_DIR") {
            builder = builder.set_override("storage.data_dir", data_dir)?;
        }

        if let Ok(timeout) = env::var("QUERYDESK_AI_TIMEOUT_SECS") {
            builder = builder.set_override(
                "ai.timeout_secs",
                timeout.parse::<u64>().unwrap_or(DEFAULT_AI_TIMEOUT_SECS),
            )?;
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            builder = builder.set_override("logging.level", log_level)?;
        }

        if let Ok(log_style) = env::var("RUST_LOG_STYLE") {
            builder = builder.set_override("logging.style", log_style)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Configuration rooted at an explicit data directory, everything else at
    /// defaults. For embedders (and tests) that manage their own layout.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.into(),
            },
            ai: AiConfig {
                timeout_secs: DEFAULT_AI_TIMEOUT_SECS,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                style: "auto".to_string(),
            },
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("querydesk")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        // Clear environment variables for this test
        env::remove_var("QUERYDESK_DATA_DIR");
        env::remove_var("QUERYDESK_AI_TIMEOUT_SECS");

        let config = Config::from_env();
        assert!(config.is_ok());

        let config = config.unwrap();
        assert_eq!(config.ai.timeout_secs, 60);
        assert!(config.storage.data_dir.ends_with("querydesk"));
    }

    #[test]
    fn test_with_data_dir() {
        let config = Config::with_data_dir("/tmp/qd-test");
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/qd-test"));
        assert_eq!(config.logging.level, "info");
    }
}
