//! Pod Mutation
//!
//! Handles AdmissionReview requests for pods, adding the Telegraf sidecar container,
//! its configuration volume and the labels the reconciler keys on.

use std::sync::Arc;

use axum::{extract::State, Json};
use json_patch::jsonptr::PointerBuf;
use json_patch::{AddOperation, PatchOperation};
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::DynamicObject,
    core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation},
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::{WebhookError, WebhookState};
use crate::controller::injector::{InjectionDecision, SidecarInjector};
use crate::observability;

/// Handle a mutating admission review for pods
pub async fn mutate_handler(
    State(state): State<Arc<WebhookState>>,
    Json(body): Json<AdmissionReview<Pod>>,
) -> Json<AdmissionReview<DynamicObject>> {
    // Convert review to request
    let req: AdmissionRequest<Pod> = match body.try_into() {
        Ok(req) => req,
        Err(e) => {
            // Without a request there is no uid to echo; failurePolicy decides the outcome
            error!(error = %e, "Failed to parse admission request");
            return Json(AdmissionResponse::invalid(e.to_string()).into_review());
        }
    };

    Json(mutate_pod(&state.injector, &req).into_review())
}

/// Decide and build the admission response for one request
///
/// Always allows the pod; the response carries a patch only when the pod qualifies.
pub fn mutate_pod(injector: &SidecarInjector, request: &AdmissionRequest<Pod>) -> AdmissionResponse {
    let uid = request.uid.clone();
    let allow_unchanged = || AdmissionResponse::from(request);

    // Containers cannot be added to an existing pod
    if request.operation != Operation::Create {
        return allow_unchanged();
    }

    let Some(pod) = &request.object else {
        debug!(uid = %uid, "No pod object in request, allowing unchanged");
        return allow_unchanged();
    };

    let span = tracing::span!(
        tracing::Level::INFO,
        "webhook.mutate",
        uid = %uid,
        pod.name = pod.metadata.name.as_deref().unwrap_or_default(),
        pod.generate_name = pod.metadata.generate_name.as_deref().unwrap_or_default(),
        pod.namespace = request.namespace.as_deref().unwrap_or_default()
    );
    let _guard = span.enter();

    let Some(advisory) = pod.spec.as_ref().and_then(|_| injector.inject(pod)) else {
        debug!("skipping pod, telegraf sidecar injector should not handle it");
        observability::metrics::increment_admissions_skipped();
        return allow_unchanged();
    };
    if let Some(joined) = advisory.joined_warnings() {
        warn!(warnings = joined.as_str(), "invalid sidecar annotations, using defaults");
        observability::metrics::increment_annotation_warnings(
            "admission",
            advisory.warnings().len(),
        );
    }
    let decision = advisory.into_value();

    respond_with_patch(request, &decision, build_patch_operations(pod, &decision))
}

/// Allow `request`, carrying `ops` as its patch; any error admits the pod unmodified
fn respond_with_patch(
    request: &AdmissionRequest<Pod>,
    decision: &InjectionDecision,
    ops: Result<Vec<PatchOperation>, WebhookError>,
) -> AdmissionResponse {
    let patched = ops.and_then(|ops| {
        AdmissionResponse::from(request)
            .with_patch(json_patch::Patch(ops))
            .map_err(WebhookError::from)
    });

    match patched {
        Ok(response) => {
            info!(
                secret.name = decision.secret_name.as_str(),
                "successfully injected telegraf sidecar container into pod"
            );
            observability::metrics::increment_injections();
            response
        }
        Err(e) => {
            error!(error = %e, "Failed to build admission patch, admitting pod unmodified");
            observability::metrics::increment_admission_errors();
            AdmissionResponse::from(request)
        }
    }
}

/// Build the JSON patch adding `decision` to `pod`
///
/// Lists that do not exist yet are created whole; existing lists are appended to.
///
/// # Errors
///
/// Returns [`WebhookError::Serialization`] when an object cannot be converted to JSON.
pub fn build_patch_operations(
    pod: &Pod,
    decision: &InjectionDecision,
) -> Result<Vec<PatchOperation>, WebhookError> {
    let mut ops = Vec::new();
    let spec = pod.spec.as_ref();

    let container = serde_json::to_value(&decision.container)?;
    if decision.native_sidecar {
        let has_init = spec.is_some_and(|s| s.init_containers.is_some());
        ops.push(append_operation(&["spec", "initContainers"], has_init, container));
    } else {
        ops.push(append_operation(&["spec", "containers"], true, container));
    }

    let has_volumes = spec.is_some_and(|s| s.volumes.is_some());
    ops.push(append_operation(
        &["spec", "volumes"],
        has_volumes,
        serde_json::to_value(&decision.volume)?,
    ));

    if pod.metadata.labels.is_some() {
        for (key, value) in decision.labels() {
            ops.push(PatchOperation::Add(AddOperation {
                path: PointerBuf::from_tokens(["metadata", "labels", key]),
                value: Value::String(value),
            }));
        }
    } else {
        let labels: serde_json::Map<String, Value> = decision
            .labels()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(value)))
            .collect();
        ops.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(["metadata", "labels"]),
            value: Value::Object(labels),
        }));
    }

    Ok(ops)
}

/// Append `value` to the list at `path`, or create the list when it does not exist
fn append_operation(path: &[&str], exists: bool, value: Value) -> PatchOperation {
    if exists {
        let tokens = path.iter().copied().chain(std::iter::once("-"));
        PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(tokens),
            value,
        })
    } else {
        PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(path.iter().copied()),
            value: Value::Array(vec![value]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::injector::{SidecarDefaults, SidecarResources};
    use k8s_openapi::api::core::v1::{Container, PodSpec, Volume};
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    // =========================================================================
    // Unit Tests
    // =========================================================================

    fn injector(native_sidecars: bool) -> SidecarInjector {
        SidecarInjector::new(SidecarDefaults {
            image: "telegraf:test".to_string(),
            secret_name_prefix: "telegraf-config".to_string(),
            resources: SidecarResources::parse("100m", "100Mi", "200m", "300Mi")
                .expect("valid defaults"),
            native_sidecars,
        })
    }

    fn pod(labels: Option<BTreeMap<String, String>>, volumes: Option<Vec<Volume>>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-0".to_string()),
                namespace: Some("apps".to_string()),
                labels,
                annotations: Some(BTreeMap::from([(
                    "telegraf.influxdata.com/ports".to_string(),
                    "8080".to_string(),
                )])),
                ..Default::default()
            },
            spec: Some(PodSpec {
                containers: vec![Container {
                    name: "app".to_string(),
                    ..Default::default()
                }],
                volumes,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Applying the JSON patch must give the same pod as mutating it in place
    fn assert_patch_matches_in_place(injector: &SidecarInjector, original: &Pod) {
        let decision = injector
            .inject(original)
            .expect("pod qualifies")
            .into_value();
        let ops = build_patch_operations(original, &decision).expect("patch builds");

        let mut patched = serde_json::to_value(original).expect("pod serializes");
        json_patch::patch(&mut patched, &json_patch::Patch(ops)).expect("patch applies");

        let mut expected = original.clone();
        decision.apply_to(&mut expected);
        assert_eq!(
            patched,
            serde_json::to_value(&expected).expect("pod serializes")
        );
    }

    #[test]
    fn test_patch_creates_missing_lists_and_labels() {
        assert_patch_matches_in_place(&injector(false), &pod(None, None));
    }

    #[test]
    fn test_patch_appends_to_existing_lists_and_labels() {
        let labels = BTreeMap::from([("app".to_string(), "web".to_string())]);
        let volumes = vec![Volume {
            name: "data".to_string(),
            ..Default::default()
        }];
        assert_patch_matches_in_place(&injector(false), &pod(Some(labels), Some(volumes)));
    }

    #[test]
    fn test_native_sidecar_patch_creates_init_containers() {
        assert_patch_matches_in_place(&injector(true), &pod(None, None));
    }

    #[test]
    fn test_label_keys_are_escaped() {
        let original = pod(Some(BTreeMap::new()), None);
        let decision = injector(false)
            .inject(&original)
            .expect("pod qualifies")
            .into_value();
        let ops = build_patch_operations(&original, &decision).expect("patch builds");

        let expected = PointerBuf::from_tokens(["metadata", "labels", "telegraf.influxdata.com/injected"]);
        assert!(ops
            .iter()
            .any(|op| matches!(op, PatchOperation::Add(a) if a.path == expected)));
        assert!(expected.as_str().contains("~1"));
    }

    fn create_request(pod: &Pod) -> AdmissionRequest<Pod> {
        let review: AdmissionReview<Pod> = serde_json::from_value(serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "0df28fbd-5f5f-11e8-bc74-36e6bb280816",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
                "resource": {"group": "", "version": "v1", "resource": "pods"},
                "namespace": "apps",
                "operation": "CREATE",
                "userInfo": {},
                "object": pod
            }
        }))
        .expect("review deserializes");
        review.try_into().expect("review carries a request")
    }

    fn response_json(response: AdmissionResponse) -> Value {
        let review = serde_json::to_value(response.into_review()).expect("review serializes");
        review["response"].clone()
    }

    #[test]
    fn test_qualifying_pod_response_carries_patch() {
        let original = pod(None, None);
        let response = response_json(mutate_pod(&injector(false), &create_request(&original)));
        assert_eq!(response["allowed"], true);
        assert_eq!(response["patchType"], "JSONPatch");
    }

    #[test]
    fn test_patch_failure_admits_pod_unmodified() {
        let original = pod(None, None);
        let request = create_request(&original);
        let decision = injector(false)
            .inject(&original)
            .expect("pod qualifies")
            .into_value();
        let failure = serde_json::from_str::<Value>("{").expect_err("truncated JSON never parses");

        let response = response_json(respond_with_patch(
            &request,
            &decision,
            Err(WebhookError::Serialization(failure)),
        ));
        assert_eq!(response["allowed"], true);
        assert_eq!(response["uid"], "0df28fbd-5f5f-11e8-bc74-36e6bb280816");
        assert!(response.get("patch").is_none());
        assert!(response.get("patchType").is_none());
    }
}
