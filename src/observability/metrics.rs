//! # Metrics
//!
//! Prometheus metrics for monitoring the webhook and the controller.
//!
//! ## Metrics Exposed
//!
//! - `telegraf_sidecar_injections_total` - Pods mutated with a sidecar
//! - `telegraf_sidecar_admissions_skipped_total` - Admission requests left unmodified
//! - `telegraf_sidecar_admission_errors_total` - Admission requests that failed open
//! - `telegraf_sidecar_reconciliations_total` - Total number of reconciliations
//! - `telegraf_sidecar_reconciliation_errors_total` - Total number of reconciliation errors
//! - `telegraf_sidecar_reconciliation_duration_seconds` - Duration of reconciliations
//! - `telegraf_sidecar_secrets_created_total` - Configuration secrets created
//! - `telegraf_sidecar_ownership_conflicts_total` - Secrets found owned by another pod
//! - `telegraf_sidecar_annotation_warnings_total` - Malformed annotation values, by stage
//! - `telegraf_sidecar_assembly_failures_total` - Configuration documents that failed to build
//! - `telegraf_sidecar_class_reloads_total` - Class data reloads, by result
//! - `telegraf_sidecar_requeues_total` - Requeues, by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static INJECTIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_injections_total",
        "Total number of pods mutated with a telegraf sidecar",
    )
    .expect("Failed to create INJECTIONS_TOTAL metric - this should never happen")
});

static ADMISSIONS_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_admissions_skipped_total",
        "Total number of admission requests that did not qualify for injection",
    )
    .expect("Failed to create ADMISSIONS_SKIPPED_TOTAL metric - this should never happen")
});

static ADMISSION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_admission_errors_total",
        "Total number of admission requests admitted unmodified after an internal error",
    )
    .expect("Failed to create ADMISSION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_reconciliation_errors_total",
        "Total number of reconciliation errors",
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "telegraf_sidecar_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SECRETS_CREATED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_secrets_created_total",
        "Total number of telegraf configuration secrets created",
    )
    .expect("Failed to create SECRETS_CREATED_TOTAL metric - this should never happen")
});

static OWNERSHIP_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_ownership_conflicts_total",
        "Total number of configuration secrets found owned by a different pod",
    )
    .expect("Failed to create OWNERSHIP_CONFLICTS_TOTAL metric - this should never happen")
});

// Annotation warnings with stage label (admission, reconcile)
static ANNOTATION_WARNINGS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "telegraf_sidecar_annotation_warnings_total",
            "Total number of malformed annotation values by processing stage",
        ),
        &["stage"],
    )
    .expect("Failed to create ANNOTATION_WARNINGS_TOTAL metric - this should never happen")
});

static ASSEMBLY_FAILURES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "telegraf_sidecar_assembly_failures_total",
        "Total number of telegraf configuration documents that failed to build",
    )
    .expect("Failed to create ASSEMBLY_FAILURES_TOTAL metric - this should never happen")
});

static CLASS_RELOADS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "telegraf_sidecar_class_reloads_total",
            "Total number of class data reloads by result",
        ),
        &["result"],
    )
    .expect("Failed to create CLASS_RELOADS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "telegraf_sidecar_requeues_total",
            "Total number of reconciliation requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register every metric with the process registry
///
/// Fails if called twice, since Prometheus rejects duplicate registrations.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(INJECTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ADMISSIONS_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ADMISSION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SECRETS_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(OWNERSHIP_CONFLICTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ANNOTATION_WARNINGS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(ASSEMBLY_FAILURES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CLASS_RELOADS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_injections() {
    INJECTIONS_TOTAL.inc();
}

pub fn increment_admissions_skipped() {
    ADMISSIONS_SKIPPED_TOTAL.inc();
}

pub fn increment_admission_errors() {
    ADMISSION_ERRORS_TOTAL.inc();
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors() {
    RECONCILIATION_ERRORS_TOTAL.inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_secrets_created() {
    SECRETS_CREATED_TOTAL.inc();
}

pub fn increment_ownership_conflicts() {
    OWNERSHIP_CONFLICTS_TOTAL.inc();
}

/// Count malformed annotation values seen at `stage` (`admission` or `reconcile`)
pub fn increment_annotation_warnings(stage: &str, count: usize) {
    ANNOTATION_WARNINGS_TOTAL
        .with_label_values(&[stage])
        .inc_by(count as u64);
}

pub fn increment_assembly_failures() {
    ASSEMBLY_FAILURES_TOTAL.inc();
}

pub fn increment_class_reloads(success: bool) {
    let result = if success { "success" } else { "failure" };
    CLASS_RELOADS_TOTAL.with_label_values(&[result]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_counters_track_each_label() {
        let before_success = CLASS_RELOADS_TOTAL.with_label_values(&["success"]).get();
        let before_failure = CLASS_RELOADS_TOTAL.with_label_values(&["failure"]).get();

        increment_class_reloads(true);
        increment_class_reloads(false);
        increment_class_reloads(false);

        assert!(CLASS_RELOADS_TOTAL.with_label_values(&["success"]).get() > before_success);
        assert!(CLASS_RELOADS_TOTAL.with_label_values(&["failure"]).get() >= before_failure + 2);
    }

    #[test]
    fn test_annotation_warnings_increment_by_count() {
        let before = ANNOTATION_WARNINGS_TOTAL.with_label_values(&["test"]).get();
        increment_annotation_warnings("test", 3);
        assert!(ANNOTATION_WARNINGS_TOTAL.with_label_values(&["test"]).get() >= before + 3);
    }
}
