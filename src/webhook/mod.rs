//! # Admission Webhook
//!
//! Mutating admission webhook that injects the Telegraf sidecar into pods.
//!
//! Provides endpoints:
//! - `/mutate--v1-pod` - POST `AdmissionReview<Pod>`, answered with a JSON patch
//! - `/healthz` - Liveness probe for the webhook listener
//!
//! The webhook fails open: a pod is admitted unmodified whenever the patch cannot
//! be produced. TLS is terminated in front of this listener.

mod pod;

use crate::controller::injector::SidecarInjector;
use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use pod::{build_patch_operations, mutate_handler, mutate_pod};

/// Path the `MutatingWebhookConfiguration` points at
pub const MUTATE_POD_PATH: &str = "/mutate--v1-pod";

/// Error type for webhook operations
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// A Kubernetes object could not be converted to JSON
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The patch could not be attached to the admission response
    #[error("patch serialization error: {0}")]
    Patch(#[from] kube::core::admission::SerializePatchError),
}

/// Shared state of the webhook server
#[derive(Debug)]
pub struct WebhookState {
    pub injector: SidecarInjector,
}

/// Build the webhook router
pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route(MUTATE_POD_PATH, post(mutate_handler))
        .route("/healthz", get(|| async { StatusCode::OK }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the webhook router on `port`, setting `is_ready` once bound
///
/// # Errors
///
/// Fails when the port cannot be bound or the server stops with an error.
pub async fn start_webhook_server(
    port: u16,
    state: Arc<WebhookState>,
    is_ready: Arc<AtomicBool>,
) -> Result<(), anyhow::Error> {
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("Admission webhook listening on {}", addr);
    is_ready.store(true, Ordering::Relaxed);

    axum::serve(listener, app).await?;

    Ok(())
}
