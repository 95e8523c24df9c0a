//! Log output configuration.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
///
/// Verbosity is read from `RUST_LOG` and defaults to `info`.
#[derive(Debug, Clone, Default, Args, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    #[serde(default)]
    pub log_format: LogFormat,
}

impl LoggingConfig {
    /// Installs the global tracing subscriber.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
        }
    }
}
