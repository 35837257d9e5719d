//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use telegraf_sidecar_controller::prelude::*;
//! ```
//!
//! This brings into scope:
//! - Class data storage (ClassDataHandler, DirectoryClassData)
//! - Configuration assembly (OverrideSet, apply_overrides, build_document)
//! - Sidecar injection (SidecarInjector, SidecarDefaults, InjectionDecision)
//! - Reconciler types (Reconciler, ReconcilerError, SecretStore, PodEventSink)
//! - Config types (ControllerConfig, ServerConfig)

pub use crate::advisory::Advisory;

pub use crate::classdata::{ClassDataError, ClassDataHandler, DirectoryClassData};

pub use crate::controller::assembler::{apply_overrides, build_document, AssemblyError, OverrideSet};

pub use crate::controller::injector::{
    InjectionDecision, InjectorError, SidecarDefaults, SidecarInjector, SidecarResources,
};

pub use crate::controller::reconciler::{
    reconcile, reconcile_pod, CreateOutcome, PodEvent, PodEventSink, ReconcileOutcome,
    ReconcileSettings, Reconciler, ReconcilerError, SecretStore,
};

pub use crate::config::{ControllerConfig, ServerConfig};

pub use crate::webhook::{WebhookError, WebhookState};
