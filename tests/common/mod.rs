//! Common test utilities for integration tests
//!
//! Provides the fixture class directory, pod builders and in-memory stand-ins for the
//! Kubernetes secret store and event recorder.

#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, Secret};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use telegraf_sidecar_controller::classdata::DirectoryClassData;
use telegraf_sidecar_controller::controller::injector::{
    SidecarDefaults, SidecarInjector, SidecarResources,
};
use telegraf_sidecar_controller::controller::reconciler::{
    CreateOutcome, PodEvent, PodEventSink, ReconcileSettings, Reconciler, SecretStore,
};

/// Directory holding the `default` and `testclass` fixture classes
pub fn fixture_classes_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/classes")
}

/// Class data loaded from the fixture directory
pub fn fixture_classes() -> Arc<DirectoryClassData> {
    Arc::new(DirectoryClassData::new(fixture_classes_dir()).expect("fixture classes load"))
}

/// Annotation map from key/value pairs
pub fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// A pod with one application container and the given annotations
pub fn app_pod(name: &str, pairs: &[(&str, &str)]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("apps".to_string()),
            uid: Some(format!("uid-{name}")),
            annotations: Some(annotations(pairs)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "app".to_string(),
                image: Some("nginx".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// An already injected pod: `app_pod` plus the injected and secret-name labels
pub fn injected_pod(name: &str, secret_name: &str, pairs: &[(&str, &str)]) -> Pod {
    let mut pod = app_pod(name, pairs);
    pod.metadata.labels = Some(BTreeMap::from([
        (
            "telegraf.influxdata.com/injected".to_string(),
            "true".to_string(),
        ),
        (
            "telegraf.influxdata.com/secret-name".to_string(),
            secret_name.to_string(),
        ),
    ]));
    pod
}

pub fn sidecar_defaults(native_sidecars: bool) -> SidecarDefaults {
    SidecarDefaults {
        image: "docker.io/library/telegraf:1.30-alpine".to_string(),
        secret_name_prefix: "telegraf-config".to_string(),
        resources: SidecarResources::parse("100m", "100Mi", "200m", "300Mi")
            .expect("valid default quantities"),
        native_sidecars,
    }
}

pub fn injector(native_sidecars: bool) -> SidecarInjector {
    SidecarInjector::new(sidecar_defaults(native_sidecars))
}

/// In-memory [`SecretStore`] keyed by `namespace/name`
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    pub secrets: Mutex<BTreeMap<String, Secret>>,
    /// Number of create calls, including rejected ones
    pub creates: Mutex<usize>,
    /// Report every create as a name collision
    pub collide_on_create: bool,
    /// Fail every create with a transport error
    pub fail_on_create: bool,
}

impl MemorySecretStore {
    pub fn with_secret(secret: Secret) -> Self {
        let store = Self::default();
        store.insert(secret);
        store
    }

    pub fn insert(&self, secret: Secret) {
        let key = format!(
            "{}/{}",
            secret.metadata.namespace.as_deref().unwrap_or_default(),
            secret.metadata.name.as_deref().unwrap_or_default()
        );
        self.secrets.lock().expect("store lock").insert(key, secret);
    }

    pub fn stored(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .expect("store lock")
            .get(&format!("{namespace}/{name}"))
            .cloned()
    }

    pub fn create_calls(&self) -> usize {
        *self.creates.lock().expect("store lock")
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, kube::Error> {
        Ok(self.stored(namespace, name))
    }

    async fn create(&self, _namespace: &str, secret: &Secret) -> Result<CreateOutcome, kube::Error> {
        *self.creates.lock().expect("store lock") += 1;
        if self.fail_on_create {
            let source = serde_json::from_str::<serde_json::Value>("{")
                .expect_err("truncated JSON never parses");
            return Err(kube::Error::SerdeError(source));
        }
        if self.collide_on_create {
            return Ok(CreateOutcome::AlreadyExists);
        }
        self.insert(secret.clone());
        Ok(CreateOutcome::Created)
    }
}

/// [`PodEventSink`] that records every published event
#[derive(Debug, Default)]
pub struct RecordingEvents {
    pub events: Mutex<Vec<PodEvent>>,
}

impl RecordingEvents {
    pub fn reasons(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|e| e.reason)
            .collect()
    }

    pub fn recorded(&self) -> Vec<PodEvent> {
        self.events.lock().expect("events lock").clone()
    }
}

#[async_trait]
impl PodEventSink for RecordingEvents {
    async fn publish(&self, _pod: &Pod, event: PodEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

/// A reconciler over in-memory collaborators and the fixture classes
pub fn reconciler(secrets: Arc<MemorySecretStore>, events: Arc<RecordingEvents>) -> Reconciler {
    Reconciler {
        secrets,
        events,
        classes: fixture_classes(),
        settings: ReconcileSettings {
            default_class: "default".to_string(),
            enable_internal_plugin: false,
            ownership_conflict_requeue: std::time::Duration::from_secs(10),
            error_requeue: std::time::Duration::from_secs(60),
        },
    }
}
