//! # Telegraf Sidecar Controller
//!
//! Kubernetes controller that injects a Telegraf sidecar into annotated pods and
//! creates the secret holding each sidecar's configuration.
//!
//! ## Overview
//!
//! The controller:
//! 1. Serves a mutating admission webhook that adds the sidecar container, its
//!    configuration volume and the `injected` / `secret-name` labels
//! 2. Watches pods carrying the `injected` label
//! 3. Assembles the Telegraf configuration from the pod's class and annotations
//! 4. Creates the configuration secret, owned by the pod
//!
//! Configuration is read from environment variables; see `config::ControllerConfig`.

use anyhow::Result;
use telegraf_sidecar_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.client,
        init.reconciler,
        init.server_state,
        &init.controller_config,
    )
    .await
}
