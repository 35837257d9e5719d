//! # Watch Loop
//!
//! Controller watch loop that monitors injected pods and the secrets they own, and
//! triggers reconciliation when changes are detected.

use crate::config::ControllerConfig;
use crate::constants::CONTROLLER_NAME;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::metadata::{SECRET_MANAGED_BY_LABEL, SIDECAR_INJECTED_LABEL};
use crate::runtime::error_policy::{handle_controller_error, handle_reconciliation_error};
use futures::StreamExt;
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::{api::Api, Client};
use kube_runtime::{controller, watcher, Controller};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Run the controller watch loop
///
/// Watches pods carrying the injected label across all namespaces, plus the secrets
/// this controller manages so that a deleted secret is recreated. Handles graceful
/// shutdown and restarts the watch when the stream ends.
///
/// # Errors
///
/// Currently never fails; the signature leaves room for fatal watch errors.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    controller_config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    let pods: Api<Pod> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client);
    let restart_delay = controller_config.watch_restart_delay_after_end_duration();
    let concurrency = controller_config.max_concurrent_reconciliations;

    // Mark the server not ready when SIGTERM/SIGINT arrives
    let shutdown_server_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");

        shutdown_server_state.is_ready.store(false, Ordering::Relaxed);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });

    loop {
        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let watch_span = tracing::span!(
            tracing::Level::INFO,
            "controller.watch",
            operation = "watch_loop"
        );

        let pod_watch = watcher::Config::default().labels(SIDECAR_INJECTED_LABEL);
        let owned_secrets = watcher::Config::default()
            .labels(&format!("{SECRET_MANAGED_BY_LABEL}={CONTROLLER_NAME}"));

        Controller::new(pods.clone(), pod_watch)
            .owns(secrets.clone(), owned_secrets)
            .with_config(controller::Config::default().concurrency(concurrency))
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .for_each(|result| async move {
                match result {
                    Ok((pod, action)) => {
                        debug!(
                            pod.name = pod.name.as_str(),
                            pod.namespace = pod.namespace.as_deref().unwrap_or("default"),
                            action = ?action,
                            "watch.event.reconciled"
                        );
                    }
                    Err(e) => {
                        handle_controller_error(&e, restart_delay).await;
                    }
                }
            })
            .instrument(watch_span)
            .await;

        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
