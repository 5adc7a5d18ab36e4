//! CoreConfig - ルーティング層の設定
//!
//! 読み込み順（後勝ち）:
//! 1. 組み込みのデフォルト値
//! 2. 設定ファイル（TOML、任意）
//! 3. `TIROUTE_*` 環境変数（例: `TIROUTE_ROUTING_TIMEOUT_MS=10000`）

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "TIROUTE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Bounded capacity of every bus channel.
    pub channel_capacity: usize,
    /// Upper bound for handing a routed message to the database module.
    pub routing_timeout_ms: u64,
    /// Upper bound for handing a notification to the API module.
    pub notification_timeout_ms: u64,
    /// Reject reference-book requests that fail validation instead of only
    /// logging the failure.
    pub reject_invalid_reference_book: bool,
    pub log_level: String,
    /// `"json"` or `"pretty"`.
    pub log_format: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            routing_timeout_ms: 30_000,
            notification_timeout_ms: 5_000,
            reject_invalid_reference_book: false,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl CoreConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("channel_capacity", defaults.channel_capacity as u64)?
            .set_default("routing_timeout_ms", defaults.routing_timeout_ms)?
            .set_default("notification_timeout_ms", defaults.notification_timeout_ms)?
            .set_default(
                "reject_invalid_reference_book",
                defaults.reject_invalid_reference_book,
            )?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_format", defaults.log_format)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: CoreConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "channel_capacity must be at least 1".into(),
            ));
        }
        if self.routing_timeout_ms == 0 || self.notification_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".into(),
            ));
        }
        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::Invalid(format!(
                "unsupported log format '{}'",
                self.log_format
            )));
        }
        Ok(())
    }

    pub fn routing_timeout(&self) -> Duration {
        Duration::from_millis(self.routing_timeout_ms)
    }

    pub fn notification_timeout(&self) -> Duration {
        Duration::from_millis(self.notification_timeout_ms)
    }
}
