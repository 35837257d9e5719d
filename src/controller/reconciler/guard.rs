//! # Secret Reconciliation Guard
//!
//! Decides what to do with a pod's configuration secret before anything is written.
//!
//! Secret names carry a random suffix but are cut to fit the 63 character limit, so a
//! name alone does not prove a secret belongs to a pod. Only the pod's UID in the
//! secret's owner references does.

use k8s_openapi::api::core::v1::Secret;

/// Result of checking an injected pod against its named secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The secret exists and belongs to this pod
    Skip,
    /// A secret with this name belongs to someone else; retry later, change nothing
    Requeue,
    /// No secret exists yet
    Create,
}

/// True when `identity` is one of `owners`
pub fn is_owned_by<I, U>(owners: I, identity: &str) -> bool
where
    I: IntoIterator<Item = U>,
    U: AsRef<str>,
{
    !identity.is_empty() && owners.into_iter().any(|owner| owner.as_ref() == identity)
}

/// Decide between skip, requeue and create for a pod with `pod_uid`
pub fn evaluate(existing: Option<&Secret>, pod_uid: &str) -> GuardDecision {
    let Some(secret) = existing else {
        return GuardDecision::Create;
    };

    let owner_uids = secret
        .metadata
        .owner_references
        .iter()
        .flatten()
        .map(|owner| owner.uid.as_str());

    if is_owned_by(owner_uids, pod_uid) {
        GuardDecision::Skip
    } else {
        GuardDecision::Requeue
    }
}
