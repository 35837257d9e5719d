//! # Injection Policy
//!
//! Decides whether a pod receives the Telegraf sidecar and builds everything the
//! admission patch adds: the container, the configuration volume and the secret name.
//!
//! A pod qualifies when it carries at least one `telegraf.influxdata.com` annotation
//! and does not already run a container whose name contains `telegraf`. Only the
//! container list the sidecar would be added to is checked (init containers in native
//! sidecar mode).

pub mod naming;
pub mod quantity;
mod sidecar;

use crate::advisory::Advisory;
use crate::constants::{SIDECAR_CONFIG_VOLUME_NAME, SIDECAR_CONTAINER_NAME};
use crate::metadata::{self, SIDECAR_INJECTED_LABEL, SIDECAR_SECRET_NAME_LABEL};
use k8s_openapi::api::core::v1::{Container, Pod, SecretVolumeSource, Volume};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use rand::Rng;
use thiserror::Error;

pub use sidecar::build_container;

/// Errors raised while preparing the injector
#[derive(Debug, Error)]
pub enum InjectorError {
    /// A configured default resource quantity is not valid quantity syntax
    #[error("failed to parse {setting} with value: {value}, not a valid resource quantity")]
    InvalidDefaultQuantity { setting: String, value: String },
}

/// Default CPU and memory requests and limits for the sidecar
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarResources {
    pub requests_cpu: Quantity,
    pub requests_memory: Quantity,
    pub limits_cpu: Quantity,
    pub limits_memory: Quantity,
}

impl SidecarResources {
    /// Validate and wrap the four default quantities
    ///
    /// # Errors
    ///
    /// Returns [`InjectorError::InvalidDefaultQuantity`] naming the first invalid value.
    pub fn parse(
        requests_cpu: &str,
        requests_memory: &str,
        limits_cpu: &str,
        limits_memory: &str,
    ) -> Result<Self, InjectorError> {
        let parse = |setting: &str, value: &str| {
            quantity::parse_quantity(value).ok_or_else(|| InjectorError::InvalidDefaultQuantity {
                setting: setting.to_string(),
                value: value.to_string(),
            })
        };

        Ok(Self {
            requests_cpu: parse("requests-cpu", requests_cpu)?,
            requests_memory: parse("requests-memory", requests_memory)?,
            limits_cpu: parse("limits-cpu", limits_cpu)?,
            limits_memory: parse("limits-memory", limits_memory)?,
        })
    }
}

/// Process-wide sidecar settings
#[derive(Debug, Clone, PartialEq)]
pub struct SidecarDefaults {
    pub image: String,
    pub secret_name_prefix: String,
    pub resources: SidecarResources,
    /// Add the sidecar as an init container with `restartPolicy: Always`
    pub native_sidecars: bool,
}

/// Everything the admission patch adds to a qualifying pod
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionDecision {
    pub container: Container,
    pub volume: Volume,
    pub secret_name: String,
    /// The container belongs in `initContainers` rather than `containers`
    pub native_sidecar: bool,
}

impl InjectionDecision {
    /// Labels recorded on the pod for the reconciler
    pub fn labels(&self) -> [(&'static str, String); 2] {
        [
            (SIDECAR_INJECTED_LABEL, "true".to_string()),
            (SIDECAR_SECRET_NAME_LABEL, self.secret_name.clone()),
        ]
    }

    /// Apply the decision to `pod` in place
    pub fn apply_to(&self, pod: &mut Pod) {
        let spec = pod.spec.get_or_insert_with(Default::default);
        if self.native_sidecar {
            spec.init_containers
                .get_or_insert_with(Vec::new)
                .push(self.container.clone());
        } else {
            spec.containers.push(self.container.clone());
        }
        spec.volumes
            .get_or_insert_with(Vec::new)
            .push(self.volume.clone());

        let labels = pod.metadata.labels.get_or_insert_with(Default::default);
        for (key, value) in self.labels() {
            labels.insert(key.to_string(), value);
        }
    }
}

/// Sidecar injection policy
#[derive(Debug, Clone)]
pub struct SidecarInjector {
    defaults: SidecarDefaults,
}

impl SidecarInjector {
    pub fn new(defaults: SidecarDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &SidecarDefaults {
        &self.defaults
    }

    /// True when the pod opts in via annotations and has no Telegraf container yet
    pub fn should_inject(&self, pod: &Pod) -> bool {
        if self.has_telegraf_container(pod) {
            return false;
        }

        pod.metadata
            .annotations
            .as_ref()
            .is_some_and(|annotations| annotations.keys().any(|key| key.contains(metadata::PREFIX)))
    }

    fn has_telegraf_container(&self, pod: &Pod) -> bool {
        let Some(spec) = pod.spec.as_ref() else {
            return false;
        };

        // Native mode checks both lists; a regular telegraf container also blocks injection
        let init_containers: &[Container] = if self.defaults.native_sidecars {
            spec.init_containers.as_deref().unwrap_or_default()
        } else {
            &[]
        };

        spec.containers
            .iter()
            .chain(init_containers)
            .any(|container| container.name.contains(SIDECAR_CONTAINER_NAME))
    }

    /// Name the secret is derived from: the pod name, or `generateName` when unset
    fn pod_name_for_secret(pod: &Pod) -> &str {
        pod.metadata
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(pod.metadata.generate_name.as_deref())
            .unwrap_or_default()
    }

    /// Generate a fresh secret name for `pod` from its name, or `generateName` when unset
    pub fn generate_secret_name(&self, pod: &Pod) -> String {
        self.generate_secret_name_with(pod, &mut rand::thread_rng())
    }

    /// [`Self::generate_secret_name`] with a caller supplied random source
    pub fn generate_secret_name_with<R: Rng + ?Sized>(&self, pod: &Pod, rng: &mut R) -> String {
        self.secret_name_for(Self::pod_name_for_secret(pod), rng)
    }

    fn secret_name_for<R: Rng + ?Sized>(&self, pod_name: &str, rng: &mut R) -> String {
        let base = naming::secret_name_base(&self.defaults.secret_name_prefix, pod_name);
        naming::append_random_suffix(&base, rng)
    }

    /// Evaluate `pod`; `None` when it does not qualify for injection
    pub fn inject(&self, pod: &Pod) -> Option<Advisory<InjectionDecision>> {
        self.inject_with(pod, &mut rand::thread_rng())
    }

    /// [`Self::inject`] with a caller supplied random source for the secret name
    pub fn inject_with<R: Rng + ?Sized>(
        &self,
        pod: &Pod,
        rng: &mut R,
    ) -> Option<Advisory<InjectionDecision>> {
        if !self.should_inject(pod) {
            return None;
        }

        let pod_name = Self::pod_name_for_secret(pod);
        let empty = std::collections::BTreeMap::new();
        let annotations = pod.metadata.annotations.as_ref().unwrap_or(&empty);

        let (container, warnings) =
            build_container(&self.defaults, pod_name, annotations).into_parts();
        let secret_name = self.secret_name_for(pod_name, rng);

        let volume = Volume {
            name: SIDECAR_CONFIG_VOLUME_NAME.to_string(),
            secret: Some(SecretVolumeSource {
                secret_name: Some(secret_name.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };

        Some(Advisory::with_warnings(
            InjectionDecision {
                container,
                volume,
                secret_name,
                native_sidecar: self.defaults.native_sidecars,
            },
            warnings,
        ))
    }
}
