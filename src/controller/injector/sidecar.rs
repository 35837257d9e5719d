//! # Sidecar Container
//!
//! Builds the Telegraf container spec from the configured defaults and the pod's
//! sidecar annotations.

use super::quantity::parse_quantity;
use super::{SidecarDefaults, SidecarResources};
use crate::advisory::Advisory;
use crate::constants::{
    SIDECAR_CONFIG_MOUNT_PATH, SIDECAR_CONFIG_VOLUME_NAME, SIDECAR_CONTAINER_NAME,
    TELEGRAF_CONFIG_SECRET_KEY,
};
use crate::metadata::{self, annotations as ann};
use k8s_openapi::api::core::v1::{
    ConfigMapEnvSource, ConfigMapKeySelector, Container, EnvFromSource, EnvVar, EnvVarSource,
    ObjectFieldSelector, ResourceRequirements, SecretEnvSource, SecretKeySelector, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;
use tracing::warn;

/// Build the sidecar container for a pod with `annotations`
///
/// Malformed values (resource quantities, key references, volume mounts) are skipped
/// with a warning; the container is always complete.
pub fn build_container(
    defaults: &SidecarDefaults,
    pod_name: &str,
    annotations: &BTreeMap<String, String>,
) -> Advisory<Container> {
    let mut warnings = Vec::new();

    let image = annotations
        .get(ann::SIDECAR_IMAGE_ANNOTATION)
        .unwrap_or(&defaults.image)
        .clone();

    let resources = resources(&defaults.resources, pod_name, annotations, &mut warnings);
    let env = env_vars(annotations, &mut warnings);
    let env_from = env_from_sources(annotations);
    let volume_mounts = volume_mounts(annotations, &mut warnings);

    let container = Container {
        name: SIDECAR_CONTAINER_NAME.to_string(),
        image: Some(image),
        command: Some(vec![
            "telegraf".to_string(),
            "--config".to_string(),
            format!("{SIDECAR_CONFIG_MOUNT_PATH}/{TELEGRAF_CONFIG_SECRET_KEY}"),
        ]),
        resources: Some(resources),
        env: Some(env),
        env_from: (!env_from.is_empty()).then_some(env_from),
        volume_mounts: Some(volume_mounts),
        restart_policy: defaults.native_sidecars.then(|| "Always".to_string()),
        ..Default::default()
    };

    Advisory::with_warnings(container, warnings)
}

fn resources(
    defaults: &SidecarResources,
    pod_name: &str,
    annotations: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> ResourceRequirements {
    let mut quantity = |annotation: &str, field: &str, default: &Quantity| -> Quantity {
        let Some(value) = annotations.get(annotation) else {
            return default.clone();
        };
        if let Some(parsed) = parse_quantity(value) {
            return parsed;
        }
        warn!(
            pod.name = pod_name,
            field = field,
            invalid_value = value.as_str(),
            "failed to parse override resource value, using default value"
        );
        warnings.push(format!(
            "failed to parse override resource value for {field}, using default value, invalid value: {value}"
        ));
        default.clone()
    };

    let requests = BTreeMap::from([
        (
            "cpu".to_string(),
            quantity(ann::SIDECAR_REQUESTS_CPU_ANNOTATION, "requests.cpu", &defaults.requests_cpu),
        ),
        (
            "memory".to_string(),
            quantity(
                ann::SIDECAR_REQUESTS_MEMORY_ANNOTATION,
                "requests.memory",
                &defaults.requests_memory,
            ),
        ),
    ]);
    let limits = BTreeMap::from([
        (
            "cpu".to_string(),
            quantity(ann::SIDECAR_LIMITS_CPU_ANNOTATION, "limits.cpu", &defaults.limits_cpu),
        ),
        (
            "memory".to_string(),
            quantity(
                ann::SIDECAR_LIMITS_MEMORY_ANNOTATION,
                "limits.memory",
                &defaults.limits_memory,
            ),
        ),
    ]);

    ResourceRequirements {
        requests: Some(requests),
        limits: Some(limits),
        ..Default::default()
    }
}

fn field_ref_env(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env_vars(annotations: &BTreeMap<String, String>, warnings: &mut Vec<String>) -> Vec<EnvVar> {
    let mut env = vec![
        field_ref_env("PODNAME", "metadata.name"),
        field_ref_env("NODENAME", "spec.nodeName"),
        field_ref_env("NAMESPACE", "metadata.namespace"),
    ];

    for (name, value) in metadata::annotations_with_prefix(annotations, ann::ENV_LITERAL_PREFIX) {
        env.push(EnvVar {
            name,
            value: Some(value),
            ..Default::default()
        });
    }

    for (name, field_path) in
        metadata::annotations_with_prefix(annotations, ann::ENV_FIELD_REF_PREFIX)
    {
        env.push(field_ref_env(&name, &field_path));
    }

    for (name, value) in
        metadata::annotations_with_prefix(annotations, ann::ENV_CONFIGMAP_KEY_REF_PREFIX)
    {
        match split_key_ref(&value) {
            Some((config_map, key)) => env.push(EnvVar {
                name,
                value_from: Some(EnvVarSource {
                    config_map_key_ref: Some(ConfigMapKeySelector {
                        name: config_map.to_string(),
                        key: key.to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            None => warnings.push(format!(
                "failed to parse configmapkeyref for {name}, invalid value: {value}"
            )),
        }
    }

    for (name, value) in
        metadata::annotations_with_prefix(annotations, ann::ENV_SECRET_KEY_REF_PREFIX)
    {
        match split_key_ref(&value) {
            Some((secret, key)) => env.push(EnvVar {
                name,
                value_from: Some(EnvVarSource {
                    secret_key_ref: Some(SecretKeySelector {
                        name: secret.to_string(),
                        key: key.to_string(),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            None => warnings.push(format!(
                "failed to parse secretkeyref for {name}, invalid value: {value}"
            )),
        }
    }

    env
}

/// Split `<object>.<key>` at the first dot; both parts must be non-empty
fn split_key_ref(value: &str) -> Option<(&str, &str)> {
    value
        .split_once('.')
        .filter(|(object, key)| !object.is_empty() && !key.is_empty())
}

fn env_from_sources(annotations: &BTreeMap<String, String>) -> Vec<EnvFromSource> {
    let mut sources = Vec::new();

    if let Some(secret) = annotations.get(ann::SIDECAR_ENV_SECRET_ANNOTATION) {
        sources.push(EnvFromSource {
            secret_ref: Some(SecretEnvSource {
                name: secret.clone(),
                optional: Some(true),
            }),
            ..Default::default()
        });
    }

    if let Some(config_map) = annotations.get(ann::SIDECAR_ENV_CONFIGMAP_ANNOTATION) {
        sources.push(EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: config_map.clone(),
                optional: Some(true),
            }),
            ..Default::default()
        });
    }

    sources
}

fn volume_mounts(
    annotations: &BTreeMap<String, String>,
    warnings: &mut Vec<String>,
) -> Vec<VolumeMount> {
    let mut mounts = vec![VolumeMount {
        name: SIDECAR_CONFIG_VOLUME_NAME.to_string(),
        mount_path: SIDECAR_CONFIG_MOUNT_PATH.to_string(),
        ..Default::default()
    }];

    let Some(raw) = annotations.get(ann::SIDECAR_VOLUME_MOUNTS_ANNOTATION) else {
        return mounts;
    };

    match serde_json::from_str::<BTreeMap<String, String>>(raw) {
        Ok(extra) => {
            for (name, mount_path) in extra {
                if name == SIDECAR_CONFIG_VOLUME_NAME {
                    warnings.push(format!(
                        "ignoring volume mount for reserved volume {SIDECAR_CONFIG_VOLUME_NAME}"
                    ));
                    continue;
                }
                mounts.push(VolumeMount {
                    name,
                    mount_path,
                    ..Default::default()
                });
            }
        }
        Err(e) => warnings.push(format!(
            "failed to parse value: {raw} for {}, error: {e}",
            ann::SIDECAR_VOLUME_MOUNTS_ANNOTATION
        )),
    }

    mounts
}
