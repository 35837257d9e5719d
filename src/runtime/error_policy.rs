//! # Error Policy
//!
//! Error handling for the controller watch loop: failed reconciliations and watch
//! stream errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::observability;
use k8s_openapi::api::core::v1::Pod;
use kube_runtime::controller::{self, Action};
use kube_runtime::watcher;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Handle reconciliation errors with a fixed requeue
///
/// Creation is idempotent, so a failed pod is simply retried after the configured
/// error interval.
pub fn handle_reconciliation_error(
    pod: Arc<Pod>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = pod.metadata.name.as_deref().unwrap_or("unknown");
    let namespace = pod.metadata.namespace.as_deref().unwrap_or("default");

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        pod.name = name,
        pod.namespace = namespace,
        error = %error
    );
    let _error_guard = error_span.enter();

    let requeue = ctx.settings.error_requeue;
    error!(
        requeue_secs = requeue.as_secs(),
        "Reconciliation error for {}/{}: {}", namespace, name, error
    );
    observability::metrics::increment_reconciliation_errors();
    observability::metrics::increment_requeues_total("error");

    Action::requeue(requeue)
}

/// Error surfaced by the controller stream
pub type ControllerStreamError = controller::Error<ReconcilerError, watcher::Error>;

/// Classification of an error surfaced by the controller stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// A reconcile failed; the error policy already requeued it
    ReconcileFailed,
    /// A watched object disappeared before it was reconciled
    ObjectNotFound,
    /// Credentials rejected; RBAC revoked or token expired
    Unauthorized,
    /// Resource version too old; the watcher relists on its own
    Expired,
    /// API server storage reinitializing or throttling
    TooManyRequests,
    /// Anything else
    Other,
}

/// Classify a controller stream error by its variant and API status code
pub fn classify_controller_error(error: &ControllerStreamError) -> WatchErrorKind {
    match error {
        controller::Error::ReconcilerFailed(..) => WatchErrorKind::ReconcileFailed,
        controller::Error::ObjectNotFound(_) => WatchErrorKind::ObjectNotFound,
        controller::Error::QueueError(watch_error) => {
            classify_status_code(watcher_status_code(watch_error))
        }
        _ => WatchErrorKind::Other,
    }
}

/// HTTP status code carried by a watcher error, if the API server answered
fn watcher_status_code(error: &watcher::Error) -> Option<u16> {
    match error {
        watcher::Error::InitialListFailed(source)
        | watcher::Error::WatchStartFailed(source)
        | watcher::Error::WatchFailed(source) => match source {
            kube::Error::Api(response) => Some(response.code),
            _ => None,
        },
        watcher::Error::WatchError(response) => Some(response.code),
        _ => None,
    }
}

/// Map an API status code to a watch error kind
pub fn classify_status_code(code: Option<u16>) -> WatchErrorKind {
    match code {
        Some(401) => WatchErrorKind::Unauthorized,
        Some(410) => WatchErrorKind::Expired,
        Some(429) => WatchErrorKind::TooManyRequests,
        _ => WatchErrorKind::Other,
    }
}

/// Handle a controller stream error, sleeping `restart_delay` when the API server
/// needs time to recover
pub async fn handle_controller_error(error: &ControllerStreamError, restart_delay: Duration) {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error
    );

    match classify_controller_error(error) {
        WatchErrorKind::ReconcileFailed => {
            let _error_guard = error_span.enter();
            debug!("watch.event.reconciliation_failed");
        }
        WatchErrorKind::ObjectNotFound => {
            let _error_guard = error_span.enter();
            debug!("watch.event.object_not_found");
        }
        WatchErrorKind::Unauthorized => {
            error_span.in_scope(|| {
                error!("Watch authentication failed (401 Unauthorized) - check the controller's ClusterRole for pods, secrets and events");
            });
            tokio::time::sleep(restart_delay).await;
        }
        WatchErrorKind::Expired => {
            let _error_guard = error_span.enter();
            warn!(error_type = "410", "watch.error.resource_version_expired");
        }
        WatchErrorKind::TooManyRequests => {
            error_span.in_scope(|| {
                warn!(
                    "API server storage reinitializing (429), backing off for {}s...",
                    restart_delay.as_secs()
                );
            });
            tokio::time::sleep(restart_delay).await;
        }
        WatchErrorKind::Other => {
            let _error_guard = error_span.enter();
            error!("Controller stream error: {}", error);
        }
    }
}
