//! # Annotations
//!
//! Pod annotations recognised by the webhook and the reconciler.
//!
//! Every value is a string; numeric and duration values are parsed leniently and a
//! malformed value only produces a warning.

// Sidecar container configuration

/// Overrides the sidecar image
pub const SIDECAR_IMAGE_ANNOTATION: &str = "telegraf.influxdata.com/image";

/// Overrides the sidecar CPU requests
pub const SIDECAR_REQUESTS_CPU_ANNOTATION: &str = "telegraf.influxdata.com/requests-cpu";

/// Overrides the sidecar memory requests
pub const SIDECAR_REQUESTS_MEMORY_ANNOTATION: &str = "telegraf.influxdata.com/requests-memory";

/// Overrides the sidecar CPU limits
pub const SIDECAR_LIMITS_CPU_ANNOTATION: &str = "telegraf.influxdata.com/limits-cpu";

/// Overrides the sidecar memory limits
pub const SIDECAR_LIMITS_MEMORY_ANNOTATION: &str = "telegraf.influxdata.com/limits-memory";

/// Exposes every key of the named secret as environment variables
pub const SIDECAR_ENV_SECRET_ANNOTATION: &str = "telegraf.influxdata.com/secret-env";

/// Exposes every key of the named config map as environment variables
pub const SIDECAR_ENV_CONFIGMAP_ANNOTATION: &str = "telegraf.influxdata.com/configmap-env";

/// Additional volume mounts, as a JSON object of `{ "<volumeName>": "<mountPath>" }`
pub const SIDECAR_VOLUME_MOUNTS_ANNOTATION: &str = "telegraf.influxdata.com/volume-mounts";

// Sidecar container prefix annotations

/// `<prefix><NAME>: <value>` adds a literal environment variable
pub const ENV_LITERAL_PREFIX: &str = "telegraf.influxdata.com/env-literal-";

/// `<prefix><NAME>: <fieldPath>` adds a downward API field reference
pub const ENV_FIELD_REF_PREFIX: &str = "telegraf.influxdata.com/env-fieldref-";

/// `<prefix><NAME>: <secret>.<key>` adds a secret key reference
pub const ENV_SECRET_KEY_REF_PREFIX: &str = "telegraf.influxdata.com/env-secretkeyref-";

/// `<prefix><NAME>: <configmap>.<key>` adds a config map key reference
pub const ENV_CONFIGMAP_KEY_REF_PREFIX: &str = "telegraf.influxdata.com/env-configmapkeyref-";

// Telegraf configuration

/// Selects the configuration class
pub const CLASS_ANNOTATION: &str = "telegraf.influxdata.com/class";

/// Single port to scrape with the Prometheus input.
///
/// Deprecated in favour of [`METRICS_PORTS_ANNOTATION`]; both are appended when present.
pub const METRICS_PORT_ANNOTATION: &str = "telegraf.influxdata.com/port";

/// Comma separated list of ports to scrape with the Prometheus input
pub const METRICS_PORTS_ANNOTATION: &str = "telegraf.influxdata.com/ports";

/// HTTP path scraped on every port (default `/metrics`)
pub const METRICS_PATH_ANNOTATION: &str = "telegraf.influxdata.com/path";

/// Request scheme, `http` or `https` (default `http`)
pub const METRICS_SCHEME_ANNOTATION: &str = "telegraf.influxdata.com/scheme";

/// Prometheus metric parsing version (default `1`)
pub const METRIC_VERSION_ANNOTATION: &str = "telegraf.influxdata.com/metric-version";

/// Comma separated namepass glob list, e.g. `"metric1, metric2"`
pub const METRICS_NAMEPASS_ANNOTATION: &str = "telegraf.influxdata.com/namepass";

/// Scrape interval as a Go style duration, e.g. `10s`, `1m` (default `10s`)
pub const INTERVAL_ANNOTATION: &str = "telegraf.influxdata.com/interval";

/// Raw TOML block of additional `[[inputs.*]]` plugins
pub const RAW_INPUT_ANNOTATION: &str = "telegraf.influxdata.com/inputs";

/// Enables the internal plugin; any non-empty value is accepted
pub const ENABLE_INTERNAL_ANNOTATION: &str = "telegraf.influxdata.com/internal";

// Telegraf configuration prefix annotations

/// `<prefix><key>: <value>` adds a literal entry to `[global_tags]`
pub const GLOBAL_TAG_LITERAL_PREFIX: &str = "telegraf.influxdata.com/global-tag-literal-";
