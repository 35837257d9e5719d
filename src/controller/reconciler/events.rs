//! # Pod Events
//!
//! Kubernetes Events recorded on the pod so users see configuration problems with
//! `kubectl describe pod`.

use crate::constants::CONTROLLER_NAME;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::{Client, Resource};
use tracing::warn;

/// Annotation values were malformed; defaults were used
pub const REASON_INVALID_ANNOTATION_FORMAT: &str = "InvalidAnnotationFormat";
/// The configuration document could not be built
pub const REASON_INVALID_TELEGRAF_CONFIGURATION: &str = "InvalidTelegrafConfiguration";
/// The API server rejected the configuration secret
pub const REASON_CREATE_SECRET_ERROR: &str = "CreateSecretInClusterError";
/// The configuration secret was created
pub const REASON_CONFIG_CREATED: &str = "TelegrafConfigCreateSuccessful";

/// Severity of a pod event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodEventType {
    Normal,
    Warning,
}

/// An event to record against a pod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodEvent {
    pub type_: PodEventType,
    pub reason: &'static str,
    pub note: String,
}

impl PodEvent {
    pub fn normal(reason: &'static str, note: impl Into<String>) -> Self {
        Self {
            type_: PodEventType::Normal,
            reason,
            note: note.into(),
        }
    }

    pub fn warning(reason: &'static str, note: impl Into<String>) -> Self {
        Self {
            type_: PodEventType::Warning,
            reason,
            note: note.into(),
        }
    }
}

/// Destination for pod events
///
/// Publishing is best effort: failures are logged by the implementation and never
/// fail a reconciliation.
#[async_trait]
pub trait PodEventSink: Send + Sync + std::fmt::Debug {
    async fn publish(&self, pod: &Pod, event: PodEvent);
}

/// [`PodEventSink`] backed by the `events.k8s.io` API
#[derive(Clone)]
pub struct KubeEventRecorder {
    recorder: Recorder,
}

impl std::fmt::Debug for KubeEventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeEventRecorder").finish_non_exhaustive()
    }
}

impl KubeEventRecorder {
    pub fn new(client: Client) -> Self {
        let reporter = Reporter {
            controller: CONTROLLER_NAME.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl PodEventSink for KubeEventRecorder {
    async fn publish(&self, pod: &Pod, event: PodEvent) {
        let type_ = match event.type_ {
            PodEventType::Normal => EventType::Normal,
            PodEventType::Warning => EventType::Warning,
        };
        let reference = pod.object_ref(&());

        let result = self
            .recorder
            .publish(
                &Event {
                    type_,
                    reason: event.reason.to_string(),
                    note: Some(event.note),
                    action: "Reconcile".to_string(),
                    secondary: None,
                },
                &reference,
            )
            .await;

        if let Err(e) = result {
            warn!(
                pod.name = pod.metadata.name.as_deref().unwrap_or("unknown"),
                pod.namespace = pod.metadata.namespace.as_deref().unwrap_or("unknown"),
                reason = event.reason,
                error = %e,
                "Failed to publish pod event"
            );
        }
    }
}
