//! # Reconciliation Tests
//!
//! Runs the reconcile flow against an in-memory secret store and event recorder:
//! the ownership guard, secret creation, benign races and failure events.

mod common;

use common::{app_pod, injected_pod, reconciler, MemorySecretStore, RecordingEvents};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::ObjectMeta;
use std::sync::Arc;
use telegraf_sidecar_controller::controller::reconciler::{
    reconcile, reconcile_pod, PodEventType, ReconcileOutcome, ReconcilerError,
    REASON_CONFIG_CREATED, REASON_CREATE_SECRET_ERROR, REASON_INVALID_ANNOTATION_FORMAT,
    REASON_INVALID_TELEGRAF_CONFIGURATION,
};

const SECRET_NAME: &str = "telegraf-config-web-0-abcde";

fn secret_owned_by(uid: &str) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(SECRET_NAME.to_string()),
            namespace: Some("apps".to_string()),
            owner_references: Some(vec![OwnerReference {
                api_version: "v1".to_string(),
                kind: "Pod".to_string(),
                name: "some-pod".to_string(),
                uid: uid.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::test]
async fn test_pod_without_injected_label_is_ignored() {
    let secrets = Arc::new(MemorySecretStore::default());
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = app_pod("web-0", &[("telegraf.influxdata.com/ports", "8080")]);
    let outcome = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");

    assert_eq!(outcome, ReconcileOutcome::NotInjected);
    assert_eq!(secrets.create_calls(), 0);
    assert!(events.recorded().is_empty());
}

#[tokio::test]
async fn test_secret_owned_by_pod_is_skipped() {
    let secrets = Arc::new(MemorySecretStore::with_secret(secret_owned_by("uid-web-0")));
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod("web-0", SECRET_NAME, &[("telegraf.influxdata.com/ports", "8080")]);
    let outcome = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");

    assert_eq!(outcome, ReconcileOutcome::Skipped);
    assert_eq!(secrets.create_calls(), 0);
}

#[tokio::test]
async fn test_secret_owned_by_other_pod_requeues_without_writes() {
    let secrets = Arc::new(MemorySecretStore::with_secret(secret_owned_by("uid-old-pod")));
    let events = Arc::new(RecordingEvents::default());
    let ctx = Arc::new(reconciler(Arc::clone(&secrets), Arc::clone(&events)));

    let pod = injected_pod("web-0", SECRET_NAME, &[("telegraf.influxdata.com/ports", "8080")]);
    let outcome = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");
    assert_eq!(outcome, ReconcileOutcome::Requeue);

    let action = reconcile(Arc::new(pod), Arc::clone(&ctx))
        .await
        .expect("reconcile succeeds");
    assert_eq!(
        action,
        kube_runtime::controller::Action::requeue(std::time::Duration::from_secs(10))
    );

    assert_eq!(secrets.create_calls(), 0);
    assert!(events.recorded().is_empty());
}

#[tokio::test]
async fn test_missing_secret_is_created_with_owner_and_labels() {
    let secrets = Arc::new(MemorySecretStore::default());
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod(
        "web-0",
        SECRET_NAME,
        &[
            ("telegraf.influxdata.com/class", "testclass"),
            ("telegraf.influxdata.com/ports", "8080"),
        ],
    );
    let outcome = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");
    assert_eq!(
        outcome,
        ReconcileOutcome::Created {
            secret_name: SECRET_NAME.to_string()
        }
    );

    let secret = secrets.stored("apps", SECRET_NAME).expect("secret stored");
    let labels = secret.metadata.labels.clone().unwrap_or_default();
    assert_eq!(
        labels.get("telegraf.influxdata.com/class").map(String::as_str),
        Some("testclass")
    );
    assert_eq!(
        labels.get("telegraf.influxdata.com/pod").map(String::as_str),
        Some("web-0")
    );
    assert_eq!(
        labels.get("app.kubernetes.io/managed-by").map(String::as_str),
        Some("telegraf-sidecar-operator")
    );

    let owners = secret.metadata.owner_references.unwrap_or_default();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].uid, "uid-web-0");
    assert_eq!(owners[0].controller, Some(true));

    let document = secret
        .string_data
        .and_then(|data| data.get("telegraf.conf").cloned())
        .expect("telegraf.conf present");
    let parsed: toml::Table = document.parse().expect("document is TOML");
    assert!(parsed["inputs"]["prometheus"].is_array());
    assert!(parsed["outputs"]["influxdb_v2"].is_array());

    assert_eq!(events.reasons(), vec![REASON_CONFIG_CREATED]);
}

#[tokio::test]
async fn test_create_then_skip_is_idempotent() {
    let secrets = Arc::new(MemorySecretStore::default());
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod("web-0", SECRET_NAME, &[("telegraf.influxdata.com/ports", "8080")]);
    let first = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");
    let second = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");

    assert!(matches!(first, ReconcileOutcome::Created { .. }));
    assert_eq!(second, ReconcileOutcome::Skipped);
    assert_eq!(secrets.create_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_create_is_benign() {
    let secrets = Arc::new(MemorySecretStore {
        collide_on_create: true,
        ..Default::default()
    });
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod("web-0", SECRET_NAME, &[("telegraf.influxdata.com/ports", "8080")]);
    let outcome = reconcile_pod(&pod, &ctx).await.expect("collision is not an error");

    assert_eq!(
        outcome,
        ReconcileOutcome::AlreadyExists {
            secret_name: SECRET_NAME.to_string()
        }
    );
    assert!(!events.reasons().contains(&REASON_CREATE_SECRET_ERROR));
}

#[tokio::test]
async fn test_unknown_class_records_event_and_fails() {
    let secrets = Arc::new(MemorySecretStore::default());
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod(
        "web-0",
        SECRET_NAME,
        &[("telegraf.influxdata.com/class", "does-not-exist")],
    );
    let err = reconcile_pod(&pod, &ctx)
        .await
        .expect_err("unknown class must fail");

    assert!(matches!(err, ReconcilerError::Assembly(_)));
    assert_eq!(secrets.create_calls(), 0);
    let recorded = events.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].reason, REASON_INVALID_TELEGRAF_CONFIGURATION);
    assert_eq!(recorded[0].type_, PodEventType::Warning);
}

#[tokio::test]
async fn test_annotation_warnings_are_recorded_and_secret_still_created() {
    let secrets = Arc::new(MemorySecretStore::default());
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod(
        "web-0",
        SECRET_NAME,
        &[
            ("telegraf.influxdata.com/ports", "8080,http"),
            ("telegraf.influxdata.com/metric-version", "latest"),
        ],
    );
    let outcome = reconcile_pod(&pod, &ctx).await.expect("reconcile succeeds");

    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(
        events.reasons(),
        vec![REASON_INVALID_ANNOTATION_FORMAT, REASON_CONFIG_CREATED]
    );
}

#[tokio::test]
async fn test_create_failure_records_event_and_fails() {
    let secrets = Arc::new(MemorySecretStore {
        fail_on_create: true,
        ..Default::default()
    });
    let events = Arc::new(RecordingEvents::default());
    let ctx = reconciler(Arc::clone(&secrets), Arc::clone(&events));

    let pod = injected_pod("web-0", SECRET_NAME, &[("telegraf.influxdata.com/ports", "8080")]);
    let err = reconcile_pod(&pod, &ctx)
        .await
        .expect_err("create failure must fail");

    assert!(matches!(err, ReconcilerError::CreateSecret { .. }));
    assert_eq!(events.reasons(), vec![REASON_CREATE_SECRET_ERROR]);
}
