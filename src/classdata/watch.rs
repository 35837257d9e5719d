//! # Periodic Class Reload
//!
//! Re-reads the class directory on a fixed interval so ConfigMap edits reach the
//! running controller without a restart.

use super::ClassDataHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawn a task reloading `classes` every `interval`
///
/// A failed reload keeps the previous classes and is retried on the next tick.
pub fn start_class_reload(classes: Arc<dyn ClassDataHandler>, interval: Duration) -> JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        "Starting periodic class data reload"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; classes were just loaded at startup
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let handler = Arc::clone(&classes);
            match tokio::task::spawn_blocking(move || handler.reload()).await {
                Ok(Ok(count)) => debug!(classes = count, "Periodic class data reload complete"),
                // Logged by the handler
                Ok(Err(_reload_error)) => {}
                Err(e) => error!("Class data reload task failed: {}", e),
            }
        }
    })
}
