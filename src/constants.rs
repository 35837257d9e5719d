//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Name reported as the manager of generated secrets and as the event reporter
pub const CONTROLLER_NAME: &str = "telegraf-sidecar-operator";

/// Reserved name of the injected sidecar container
pub const SIDECAR_CONTAINER_NAME: &str = "telegraf";

/// Name of the pod volume backed by the generated configuration secret
pub const SIDECAR_CONFIG_VOLUME_NAME: &str = "telegraf-config";

/// Directory the configuration secret is mounted into inside the sidecar
pub const SIDECAR_CONFIG_MOUNT_PATH: &str = "/etc/telegraf";

/// Key of the rendered configuration inside the generated secret
pub const TELEGRAF_CONFIG_SECRET_KEY: &str = "telegraf.conf";

/// Default directory containing one Telegraf class file per class
pub const DEFAULT_CLASSES_DIRECTORY: &str = "/etc/config/classes";

/// Default class used when a pod does not select one
pub const DEFAULT_CLASS_NAME: &str = "default";

/// Default sidecar image
pub const DEFAULT_TELEGRAF_IMAGE: &str = "docker.io/library/telegraf:1.30-alpine";

/// Default sidecar CPU requests
pub const DEFAULT_REQUESTS_CPU: &str = "100m";

/// Default sidecar memory requests
pub const DEFAULT_REQUESTS_MEMORY: &str = "100Mi";

/// Default sidecar CPU limits
pub const DEFAULT_LIMITS_CPU: &str = "200m";

/// Default sidecar memory limits
pub const DEFAULT_LIMITS_MEMORY: &str = "300Mi";

/// Default prefix of generated secret names
pub const DEFAULT_SECRET_NAME_PREFIX: &str = "telegraf-config";

/// Default Prometheus scrape path
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

/// Default Prometheus scrape scheme
pub const DEFAULT_METRICS_SCHEME: &str = "http";

/// Default Prometheus input metric version
pub const DEFAULT_METRIC_VERSION: u8 = 1;

/// Default Prometheus scrape interval (seconds)
pub const DEFAULT_SCRAPE_INTERVAL_SECS: u64 = 10;

/// Maximum length of a Kubernetes resource name
pub const MAX_RESOURCE_NAME_LENGTH: usize = 63;

/// Length of the random suffix appended to generated secret names
pub const RANDOM_SUFFIX_LENGTH: usize = 5;

/// Maximum length of the secret name base before the random suffix is appended
pub const MAX_SECRET_NAME_BASE_LENGTH: usize =
    MAX_RESOURCE_NAME_LENGTH - RANDOM_SUFFIX_LENGTH - 1;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server port for the admission webhook
pub const DEFAULT_WEBHOOK_PORT: u16 = 9443;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default requeue interval when a same-named secret is owned by another pod (seconds)
pub const DEFAULT_OWNERSHIP_CONFLICT_REQUEUE_SECS: u64 = 10;

/// Default maximum number of pods reconciled concurrently
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 4;

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_AFTER_END_SECS: u64 = 1;
