//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use super::{env_var_or_default, env_var_or_default_bool, env_var_or_default_str};
use crate::controller::injector::{InjectorError, SidecarDefaults, SidecarResources};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Directory containing one Telegraf class file per class
    pub classes_directory: String,
    /// Class used when a pod does not select one
    pub default_class: String,
    /// Add the Telegraf internal input plugin to every sidecar
    pub enable_internal_plugin: bool,
    /// Default sidecar image
    pub telegraf_image: String,
    /// Default sidecar CPU requests
    pub requests_cpu: String,
    /// Default sidecar memory requests
    pub requests_memory: String,
    /// Default sidecar CPU limits
    pub limits_cpu: String,
    /// Default sidecar memory limits
    pub limits_memory: String,
    /// Prefix of generated configuration secret names
    pub secret_name_prefix: String,
    /// Inject the sidecar as a native sidecar (init container with `restartPolicy: Always`)
    pub enable_native_sidecars: bool,
    /// Maximum concurrent reconciliations
    /// Limits how many pods can be reconciled simultaneously
    pub max_concurrent_reconciliations: u16,
    /// Reconciliation error requeue interval (seconds)
    /// How long to wait before retrying a failed reconciliation
    pub reconciliation_error_requeue_secs: u64,
    /// Requeue interval when a same-named secret belongs to another pod (seconds)
    pub ownership_conflict_requeue_secs: u64,
    /// Interval between automatic class data reloads (seconds, 0 disables)
    pub class_reload_interval_secs: u64,
    /// Watch stream restart delay after stream ends (seconds)
    pub watch_restart_delay_after_end_secs: u64,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            classes_directory: DEFAULT_CLASSES_DIRECTORY.to_string(),
            default_class: DEFAULT_CLASS_NAME.to_string(),
            enable_internal_plugin: false,
            telegraf_image: DEFAULT_TELEGRAF_IMAGE.to_string(),
            requests_cpu: DEFAULT_REQUESTS_CPU.to_string(),
            requests_memory: DEFAULT_REQUESTS_MEMORY.to_string(),
            limits_cpu: DEFAULT_LIMITS_CPU.to_string(),
            limits_memory: DEFAULT_LIMITS_MEMORY.to_string(),
            secret_name_prefix: DEFAULT_SECRET_NAME_PREFIX.to_string(),
            enable_native_sidecars: false,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ownership_conflict_requeue_secs: DEFAULT_OWNERSHIP_CONFLICT_REQUEUE_SECS,
            class_reload_interval_secs: 0,
            watch_restart_delay_after_end_secs: DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            classes_directory: env_var_or_default_str(
                "TELEGRAF_CLASSES_DIRECTORY",
                DEFAULT_CLASSES_DIRECTORY,
            ),
            default_class: env_var_or_default_str("TELEGRAF_DEFAULT_CLASS", DEFAULT_CLASS_NAME),
            enable_internal_plugin: env_var_or_default_bool(
                "TELEGRAF_ENABLE_INTERNAL_PLUGIN",
                false,
            ),
            telegraf_image: env_var_or_default_str("TELEGRAF_IMAGE", DEFAULT_TELEGRAF_IMAGE),
            requests_cpu: env_var_or_default_str("TELEGRAF_REQUESTS_CPU", DEFAULT_REQUESTS_CPU),
            requests_memory: env_var_or_default_str(
                "TELEGRAF_REQUESTS_MEMORY",
                DEFAULT_REQUESTS_MEMORY,
            ),
            limits_cpu: env_var_or_default_str("TELEGRAF_LIMITS_CPU", DEFAULT_LIMITS_CPU),
            limits_memory: env_var_or_default_str("TELEGRAF_LIMITS_MEMORY", DEFAULT_LIMITS_MEMORY),
            secret_name_prefix: env_var_or_default_str(
                "TELEGRAF_SECRET_NAME_PREFIX",
                DEFAULT_SECRET_NAME_PREFIX,
            ),
            enable_native_sidecars: env_var_or_default_bool("ENABLE_NATIVE_SIDECARS", false),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            ),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            ownership_conflict_requeue_secs: env_var_or_default(
                "OWNERSHIP_CONFLICT_REQUEUE_SECS",
                DEFAULT_OWNERSHIP_CONFLICT_REQUEUE_SECS,
            ),
            class_reload_interval_secs: env_var_or_default("CLASS_RELOAD_INTERVAL_SECS", 0),
            watch_restart_delay_after_end_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_AFTER_END_SECS",
                DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS,
            ),
            log_format: env_var_or_default_str("LOG_FORMAT", "text"),
        }
    }

    /// Check the configured default resource quantities
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::InvalidDefaultQuantity`] naming the first invalid setting.
    /// Invalid defaults are fatal at startup.
    pub fn validate(&self) -> Result<(), InjectorError> {
        self.sidecar_defaults().map(|_defaults| ())
    }

    /// Sidecar defaults derived from this configuration, with quantities validated
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::InvalidDefaultQuantity`] for an unparsable quantity.
    pub fn sidecar_defaults(&self) -> Result<SidecarDefaults, InjectorError> {
        Ok(SidecarDefaults {
            image: self.telegraf_image.clone(),
            secret_name_prefix: self.secret_name_prefix.clone(),
            resources: SidecarResources::parse(
                &self.requests_cpu,
                &self.requests_memory,
                &self.limits_cpu,
                &self.limits_memory,
            )?,
            native_sidecars: self.enable_native_sidecars,
        })
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get ownership conflict requeue duration
    pub fn ownership_conflict_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.ownership_conflict_requeue_secs)
    }

    /// Get class reload interval, `None` when periodic reloads are disabled
    pub fn class_reload_interval(&self) -> Option<Duration> {
        (self.class_reload_interval_secs > 0)
            .then(|| Duration::from_secs(self.class_reload_interval_secs))
    }

    /// Get watch restart delay after end duration
    pub fn watch_restart_delay_after_end_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_after_end_secs)
    }
}
