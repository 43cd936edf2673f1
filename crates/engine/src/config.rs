//! Engine configuration.

use std::time::Duration;

/// Environment variable holding the timeout supervisor's wait, in humantime
/// format (`30s`, `5m`, ...).
pub const PROCESSING_TIMEOUT_ENV: &str = "PROCESSING_TIMEOUT_DURATION";

const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a run may stay in `Started` before the supervisor marks it
    /// `Timeout`.
    pub processing_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
        }
    }
}

impl EngineConfig {
    pub fn new(processing_timeout: Duration) -> Self {
        Self { processing_timeout }
    }

    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let processing_timeout = match std::env::var(PROCESSING_TIMEOUT_ENV) {
            Ok(raw) => parse_timeout(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    value = %raw,
                    default = ?DEFAULT_PROCESSING_TIMEOUT,
                    "invalid {PROCESSING_TIMEOUT_ENV}, using default"
                );
                DEFAULT_PROCESSING_TIMEOUT
            }),
            Err(_) => DEFAULT_PROCESSING_TIMEOUT,
        };

        Self { processing_timeout }
    }
}

fn parse_timeout(raw: &str) -> Option<Duration> {
    humantime::parse_duration(raw.trim()).ok()
}
