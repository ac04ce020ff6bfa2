//! Logging and timing for the QR scanner build tools
//!
//! - Structured logging with tracing
//! - Per-invocation session id for correlating log lines
//! - Duration timers for long-running backend calls

use once_cell::sync::Lazy;
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Install the global subscriber, writing to stderr
///
/// `RUST_LOG` overrides `log_level` when set.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(config.show_target),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(config.show_target)
                    .compact(),
            )
            .try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// One JSON object per event instead of compact text
    pub json: bool,
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json: false,
            show_target: false,
        }
    }
}

impl TelemetryConfig {
    /// Map `-v` counts and `--quiet` onto a log level
    pub fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        let log_level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };

        Self {
            log_level: log_level.to_string(),
            show_target: verbose >= 2,
            ..Self::default()
        }
    }
}

/// Timer for measuring operation duration
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Time elapsed so far
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and log the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::info!(
            operation = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Timer completed"
        );
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(TelemetryConfig::from_verbosity(0, false).log_level, "warn");
        assert_eq!(TelemetryConfig::from_verbosity(1, false).log_level, "info");
        assert_eq!(TelemetryConfig::from_verbosity(2, false).log_level, "debug");
        assert_eq!(TelemetryConfig::from_verbosity(5, false).log_level, "trace");
        assert_eq!(TelemetryConfig::from_verbosity(3, true).log_level, "error");
        assert!(TelemetryConfig::from_verbosity(2, false).show_target);
        assert!(!TelemetryConfig::from_verbosity(2, false).json);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start("gradle assembleRelease");
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.stop();
        assert!(duration.as_millis() >= 10);
    }

    #[test]
    fn test_session_id() {
        let id = session_id();
        assert!(!id.is_empty());
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(id, session_id());
    }
}
