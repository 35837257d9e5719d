//! # Reconciler
//!
//! Creates the configuration secret for every pod the webhook injected.
//!
//! ## Reconciliation Flow
//!
//! 1. Skip pods without the `injected` label
//! 2. Read the secret named by the pod's `secret-name` label
//! 3. Skip when the pod owns it, requeue when another pod does
//! 4. Apply annotation overrides, recording a warning event for malformed values
//! 5. Build the document from the selected class
//! 6. Create the secret owned by the pod; a concurrent create is treated as success
//!
//! Nothing is written until the document is fully built, and existing secrets are
//! never updated or deleted.

mod events;
pub mod guard;
mod secret;
mod store;
mod types;

pub use events::{
    KubeEventRecorder, PodEvent, PodEventSink, PodEventType, REASON_CONFIG_CREATED,
    REASON_CREATE_SECRET_ERROR, REASON_INVALID_ANNOTATION_FORMAT,
    REASON_INVALID_TELEGRAF_CONFIGURATION,
};
pub use guard::{is_owned_by, GuardDecision};
pub use secret::build_secret;
pub use store::{CreateOutcome, KubeSecretStore, SecretStore};
pub use types::{ReconcileOutcome, ReconcileSettings, Reconciler, ReconcilerError};

use crate::controller::assembler::{apply_overrides, build_document, OverrideSet};
use crate::metadata::{SIDECAR_INJECTED_LABEL, SIDECAR_SECRET_NAME_LABEL};
use crate::observability;
use k8s_openapi::api::core::v1::Pod;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{debug, error, info, warn, Instrument};

/// Entry point for the `kube-runtime` controller
///
/// # Errors
///
/// Returns a [`ReconcilerError`] for failures worth retrying; the error policy requeues.
pub async fn reconcile(pod: Arc<Pod>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    let start = std::time::Instant::now();
    observability::metrics::increment_reconciliations();

    let result = reconcile_pod(&pod, &ctx).await;
    observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

    match result? {
        ReconcileOutcome::Requeue => {
            observability::metrics::increment_requeues_total("ownership-conflict");
            Ok(Action::requeue(ctx.settings.ownership_conflict_requeue))
        }
        _ => Ok(Action::await_change()),
    }
}

/// Reconcile one pod against its configuration secret
///
/// # Errors
///
/// Fails when the secret cannot be read or created, or the document cannot be built.
pub async fn reconcile_pod(
    pod: &Pod,
    ctx: &Reconciler,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.reconcile",
        pod.name = pod.metadata.name.as_deref().unwrap_or("unknown"),
        pod.namespace = pod.metadata.namespace.as_deref().unwrap_or("default")
    );
    reconcile_injected_pod(pod, ctx).instrument(span).await
}

async fn reconcile_injected_pod(
    pod: &Pod,
    ctx: &Reconciler,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let namespace = pod.metadata.namespace.as_deref().unwrap_or("default");

    let labels = pod.metadata.labels.as_ref();
    if !labels.is_some_and(|l| l.contains_key(SIDECAR_INJECTED_LABEL)) {
        debug!("reconciliation skipped, pod doesn't have telegraf container");
        return Ok(ReconcileOutcome::NotInjected);
    }

    let secret_name = labels
        .and_then(|l| l.get(SIDECAR_SECRET_NAME_LABEL))
        .filter(|s| !s.is_empty())
        .ok_or(ReconcilerError::MissingMetadata(
            "label telegraf.influxdata.com/secret-name",
        ))?
        .clone();
    let pod_uid = pod.metadata.uid.as_deref().unwrap_or_default();

    let existing = ctx
        .secrets
        .get(namespace, &secret_name)
        .await
        .map_err(|source| ReconcilerError::SecretLookup {
            secret: secret_name.clone(),
            source,
        })?;

    match guard::evaluate(existing.as_ref(), pod_uid) {
        GuardDecision::Skip => {
            debug!(
                secret.name = secret_name.as_str(),
                "reconciliation skipped, telegraf-config secret for pod already exists"
            );
            return Ok(ReconcileOutcome::Skipped);
        }
        GuardDecision::Requeue => {
            warn!(
                secret.name = secret_name.as_str(),
                "secret exists but is owned by another pod, requeueing"
            );
            observability::metrics::increment_ownership_conflicts();
            return Ok(ReconcileOutcome::Requeue);
        }
        GuardDecision::Create => {}
    }

    create_secret(pod, ctx, namespace, secret_name).await
}

async fn create_secret(
    pod: &Pod,
    ctx: &Reconciler,
    namespace: &str,
    secret_name: String,
) -> Result<ReconcileOutcome, ReconcilerError> {
    let empty = std::collections::BTreeMap::new();
    let annotations = pod.metadata.annotations.as_ref().unwrap_or(&empty);

    let defaults = OverrideSet::defaults(
        ctx.settings.default_class.as_str(),
        ctx.settings.enable_internal_plugin,
    );
    let advisory = apply_overrides(defaults, annotations);
    if let Some(joined) = advisory.joined_warnings() {
        let msg = format!(
            "one or more warnings were generated when applying telegraf pod annotations: [ {joined} ]"
        );
        info!("{}", msg);
        observability::metrics::increment_annotation_warnings(
            "reconcile",
            advisory.warnings().len(),
        );
        ctx.events
            .publish(pod, PodEvent::warning(REASON_INVALID_ANNOTATION_FORMAT, msg))
            .await;
    }
    let overrides = advisory.into_value();

    let document = match build_document(&overrides, ctx.classes.as_ref()) {
        Ok(document) => document,
        Err(e) => {
            error!(class = overrides.class.as_str(), error = %e, "error building telegraf config");
            observability::metrics::increment_assembly_failures();
            ctx.events
                .publish(
                    pod,
                    PodEvent::warning(
                        REASON_INVALID_TELEGRAF_CONFIGURATION,
                        format!("error building telegraf config: {e}"),
                    ),
                )
                .await;
            return Err(e.into());
        }
    };

    let secret = build_secret(pod, &secret_name, &overrides.class, document)?;

    match ctx.secrets.create(namespace, &secret).await {
        Ok(CreateOutcome::Created) => {
            info!(
                secret.name = secret_name.as_str(),
                class = overrides.class.as_str(),
                "successfully created telegraf config secret"
            );
            observability::metrics::increment_secrets_created();
            ctx.events
                .publish(
                    pod,
                    PodEvent::normal(
                        REASON_CONFIG_CREATED,
                        format!("successfully created telegraf config secret: {secret_name}"),
                    ),
                )
                .await;
            Ok(ReconcileOutcome::Created { secret_name })
        }
        Ok(CreateOutcome::AlreadyExists) => {
            info!(
                secret.name = secret_name.as_str(),
                "telegraf-config secret for pod already exists"
            );
            Ok(ReconcileOutcome::AlreadyExists { secret_name })
        }
        Err(source) => {
            error!(secret.name = secret_name.as_str(), error = %source, "failed to create secret in cluster");
            ctx.events
                .publish(
                    pod,
                    PodEvent::warning(
                        REASON_CREATE_SECRET_ERROR,
                        format!("failed to create secret: {secret_name} in cluster: {source}"),
                    ),
                )
                .await;
            Err(ReconcilerError::CreateSecret {
                secret: secret_name,
                source,
            })
        }
    }
}
