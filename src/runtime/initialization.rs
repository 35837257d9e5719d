//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! configuration, class data loading, server startup, and Kubernetes client setup.

use crate::classdata::{watch::start_class_reload, ClassDataHandler, DirectoryClassData};
use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::injector::SidecarInjector;
use crate::controller::reconciler::{
    KubeEventRecorder, KubeSecretStore, ReconcileSettings, Reconciler,
};
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::webhook::{start_webhook_server, WebhookState};
use anyhow::{Context, Result};
use kube::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// Controller configuration read at startup
    pub controller_config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field(
                "server_ready",
                &self.server_state.is_ready.load(Ordering::Relaxed),
            )
            .field("controller_config", &self.controller_config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - Configuration loading and validation
/// - Class data loading
/// - Probe and webhook server startup
/// - Kubernetes client creation
/// - Reconciler setup
///
/// # Errors
///
/// Invalid configuration, unreadable class data or a server that fails to bind abort
/// startup before the controller reports ready.
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before any rustls client is built
    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap_or_else(|_| panic!("Failed to install rustls crypto provider"));

    let controller_config = ControllerConfig::from_env();
    init_tracing(&controller_config.log_format);

    info!("Starting Telegraf Sidecar Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    controller_config
        .validate()
        .context("Invalid controller configuration")?;
    let sidecar_defaults = controller_config
        .sidecar_defaults()
        .context("Invalid sidecar defaults")?;
    let server_config = ServerConfig::from_env();

    let classes: Arc<dyn ClassDataHandler> = Arc::new(
        DirectoryClassData::new(&controller_config.classes_directory).with_context(|| {
            format!(
                "Failed to load telegraf classes from {}",
                controller_config.classes_directory
            )
        })?,
    );

    // Probe server. Readiness flips once it binds.
    let server_state = Arc::new(ServerState {
        is_ready: Arc::new(AtomicBool::new(false)),
        classes: Arc::clone(&classes),
    });
    let server_state_clone = Arc::clone(&server_state);
    let metrics_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(metrics_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(
        "HTTP server",
        &server_state.is_ready,
        &server_handle,
        &server_config,
    )
    .await?;

    // Admission webhook server
    let webhook_ready = Arc::new(AtomicBool::new(false));
    let webhook_state = Arc::new(WebhookState {
        injector: SidecarInjector::new(sidecar_defaults),
    });
    let webhook_ready_clone = Arc::clone(&webhook_ready);
    let webhook_port = server_config.webhook_port;
    let webhook_handle = tokio::spawn(async move {
        if let Err(e) = start_webhook_server(webhook_port, webhook_state, webhook_ready_clone).await
        {
            error!("Admission webhook server error: {}", e);
        }
    });
    wait_for_server_ready(
        "Admission webhook server",
        &webhook_ready,
        &webhook_handle,
        &server_config,
    )
    .await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let reconciler = Arc::new(Reconciler {
        secrets: Arc::new(KubeSecretStore::new(client.clone())),
        events: Arc::new(KubeEventRecorder::new(client.clone())),
        classes: Arc::clone(&classes),
        settings: ReconcileSettings {
            default_class: controller_config.default_class.clone(),
            enable_internal_plugin: controller_config.enable_internal_plugin,
            ownership_conflict_requeue: controller_config.ownership_conflict_requeue_duration(),
            error_requeue: controller_config.reconciliation_error_requeue_duration(),
        },
    });

    if let Some(interval) = controller_config.class_reload_interval() {
        start_class_reload(Arc::clone(&classes), interval);
    } else {
        info!("Periodic class reload disabled - use POST /classes/reload to refresh classes");
    }

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        controller_config,
    })
}

/// Install the global tracing subscriber, JSON or text depending on `log_format`
fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "telegraf_sidecar_controller=info".into());

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Wait for a spawned HTTP server to become ready
async fn wait_for_server_ready(
    name: &str,
    is_ready: &AtomicBool,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = std::time::Duration::from_secs(server_config.startup_timeout_secs);
    let poll_interval = std::time::Duration::from_millis(server_config.poll_interval_ms);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("{name} failed to start"));
        }

        if is_ready.load(Ordering::Relaxed) {
            info!("{} is ready and accepting connections", name);
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "{name} failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}
