//! # Configuration Secret
//!
//! Shape of the generated `telegraf.conf` secret.

use super::types::ReconcilerError;
use crate::constants::{CONTROLLER_NAME, TELEGRAF_CONFIG_SECRET_KEY};
use crate::metadata::{
    SECRET_CLASS_NAME_LABEL, SECRET_CREATED_BY_LABEL, SECRET_MANAGED_BY_LABEL, SECRET_POD_LABEL,
};
use k8s_openapi::api::core::v1::{Pod, Secret};
use kube::api::ObjectMeta;
use kube::Resource;
use std::collections::BTreeMap;

/// Build the secret holding `document` for `pod`, owned by the pod
///
/// # Errors
///
/// Returns [`ReconcilerError::MissingMetadata`] when the pod has no name, namespace or UID.
pub fn build_secret(
    pod: &Pod,
    secret_name: &str,
    class: &str,
    document: String,
) -> Result<Secret, ReconcilerError> {
    let pod_name = pod
        .metadata
        .name
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("metadata.name"))?;
    let namespace = pod
        .metadata
        .namespace
        .as_deref()
        .ok_or(ReconcilerError::MissingMetadata("metadata.namespace"))?;
    let owner = pod
        .controller_owner_ref(&())
        .ok_or(ReconcilerError::MissingMetadata("metadata.uid"))?;

    let labels = BTreeMap::from([
        (SECRET_CLASS_NAME_LABEL.to_string(), class.to_string()),
        (SECRET_POD_LABEL.to_string(), pod_name.to_string()),
        (SECRET_MANAGED_BY_LABEL.to_string(), CONTROLLER_NAME.to_string()),
        (SECRET_CREATED_BY_LABEL.to_string(), CONTROLLER_NAME.to_string()),
    ]);

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(secret_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        string_data: Some(BTreeMap::from([(
            TELEGRAF_CONFIG_SECRET_KEY.to_string(),
            document,
        )])),
        ..Default::default()
    })
}
