//! # Secret Store
//!
//! The two secret operations reconciliation needs, behind a trait so the guard and the
//! create path can run against an in-memory store.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, PostParams};
use kube::Client;

/// Result of a create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// Another worker created the same secret first
    AlreadyExists,
}

#[async_trait]
pub trait SecretStore: Send + Sync + std::fmt::Debug {
    /// Fetch a secret, `None` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, kube::Error>;

    /// Create a secret, reporting a name collision as [`CreateOutcome::AlreadyExists`]
    async fn create(&self, namespace: &str, secret: &Secret) -> Result<CreateOutcome, kube::Error>;
}

/// [`SecretStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Secret>, kube::Error> {
        self.api(namespace).get_opt(name).await
    }

    async fn create(&self, namespace: &str, secret: &Secret) -> Result<CreateOutcome, kube::Error> {
        match self.api(namespace).create(&PostParams::default(), secret).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(kube::Error::Api(api_err))
                if api_err.code == 409 && api_err.reason == "AlreadyExists" =>
            {
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }
}
