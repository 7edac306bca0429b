//! Logging utilities, available with the `logging` feature.
//!
//! As a library, relic only emits `tracing` events; embedders install
//! their own subscriber. These helpers cover the standalone case and
//! scope the default directives to the relic crates, so an embedding
//! build tool's own events stay at error level.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable consulted by [`init_logging_from_env`]. Takes
/// standard `tracing` filter directives.
pub const LOG_ENV: &str = "RELIC_LOG";

static INIT: Once = Once::new();

/// Log verbosity for relic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// No output.
    Silent,
    /// Only errors.
    Error,
    /// Errors and warnings.
    Warn,
    /// Errors, warnings, and info (default).
    #[default]
    Info,
    /// Everything, including debug.
    Debug,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    /// Filter directives applying this level to the relic crates only.
    fn directives(self) -> String {
        match self {
            LogLevel::Silent => "off".to_string(),
            level => format!(
                "error,relic_target={0},relic_polyfill={0},relic_loader={0},relic_bundler={0}",
                level.as_str()
            ),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "off" => Ok(LogLevel::Silent),
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(format!("invalid log level: {other}")),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn install(filter: EnvFilter) {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().without_time())
            .init();
    });
}

/// Install a global subscriber showing relic events at `level`. Only the
/// first call per process takes effect.
pub fn init_logging(level: LogLevel) {
    install(EnvFilter::new(level.directives()));
}

/// Install a global subscriber configured from the `RELIC_LOG`
/// environment variable, falling back to the default level.
pub fn init_logging_from_env() {
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV)
        .try_from_env()
        .unwrap_or_else(|_| EnvFilter::new(LogLevel::default().directives()));
    install(filter);
}
