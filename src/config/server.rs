//! # Server Configuration
//!
//! HTTP listener settings loaded from environment variables.

use super::env_var_or_default;
use crate::constants::*;

/// Settings for the probe/metrics server and the admission webhook server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port serving `/metrics`, `/healthz`, `/readyz` and the class reload endpoint
    pub metrics_port: u16,
    /// Port serving the admission webhook
    pub webhook_port: u16,
    /// How long to wait for the servers to bind before giving up (seconds)
    pub startup_timeout_secs: u64,
    /// Readiness poll interval during startup (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            webhook_port: DEFAULT_WEBHOOK_PORT,
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            webhook_port: env_var_or_default("WEBHOOK_PORT", DEFAULT_WEBHOOK_PORT),
            startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }
}
