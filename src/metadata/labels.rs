//! # Labels
//!
//! Labels written by the controller on pods and generated secrets.

/// Standard label naming the component that created an object
pub const SECRET_CREATED_BY_LABEL: &str = "app.kubernetes.io/created-by";

/// Standard label naming the component that manages an object
pub const SECRET_MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Marks a pod that received the sidecar; the reconciler only watches these pods
pub const SIDECAR_INJECTED_LABEL: &str = "telegraf.influxdata.com/injected";

/// Carries the generated secret name from the webhook to the reconciler
pub const SIDECAR_SECRET_NAME_LABEL: &str = "telegraf.influxdata.com/secret-name";

/// Class the generated secret was rendered from
pub const SECRET_CLASS_NAME_LABEL: &str = "telegraf.influxdata.com/class";

/// Name of the pod the generated secret belongs to
pub const SECRET_POD_LABEL: &str = "telegraf.influxdata.com/pod";
