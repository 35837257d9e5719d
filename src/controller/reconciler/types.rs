//! # Reconciler Types
//!
//! Context, outcomes and errors of pod reconciliation.

use super::events::PodEventSink;
use super::store::SecretStore;
use crate::controller::assembler::AssemblyError;
use crate::classdata::ClassDataHandler;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The pod lacks a field the secret needs
    #[error("pod is missing {0}")]
    MissingMetadata(&'static str),
    /// The existing secret could not be read
    #[error("failed to lookup secret {secret} from kubernetes api: {source}")]
    SecretLookup {
        secret: String,
        #[source]
        source: kube::Error,
    },
    /// The configuration document could not be built
    #[error("error building telegraf configuration: {0}")]
    Assembly(#[from] AssemblyError),
    /// The API server rejected the secret
    #[error("failed to create secret: {secret} in cluster: {source}")]
    CreateSecret {
        secret: String,
        #[source]
        source: kube::Error,
    },
}

/// What a single reconciliation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The pod carries no injected label
    NotInjected,
    /// The pod's secret already exists and is owned by the pod
    Skipped,
    /// A same-named secret belongs to another pod
    Requeue,
    /// The secret was created
    Created { secret_name: String },
    /// A concurrent worker created the secret first
    AlreadyExists { secret_name: String },
}

/// Settings reconciliation reads from process configuration
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub default_class: String,
    pub enable_internal_plugin: bool,
    pub ownership_conflict_requeue: Duration,
    pub error_requeue: Duration,
}

/// Shared reconciliation context
#[derive(Debug, Clone)]
pub struct Reconciler {
    pub secrets: Arc<dyn SecretStore>,
    pub events: Arc<dyn PodEventSink>,
    pub classes: Arc<dyn ClassDataHandler>,
    pub settings: ReconcileSettings,
}
