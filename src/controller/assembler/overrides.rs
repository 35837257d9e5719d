//! # Annotation Overrides
//!
//! Per-pod Telegraf settings: defaults from process configuration, layered with the
//! pod's annotations.

use super::duration::parse_go_duration;
use crate::advisory::Advisory;
use crate::constants::{
    DEFAULT_METRICS_PATH, DEFAULT_METRICS_SCHEME, DEFAULT_METRIC_VERSION,
    DEFAULT_SCRAPE_INTERVAL_SECS,
};
use crate::metadata::{self, annotations as ann};
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration intent for one pod's sidecar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideSet {
    /// Class whose document is used as the baseline
    pub class: String,
    /// Ports scraped by the Prometheus input, in annotation order
    pub ports: Vec<u16>,
    /// HTTP path scraped on every port
    pub metrics_path: String,
    /// `http` or `https`
    pub scheme: String,
    /// Prometheus input `metric_version`
    pub metric_version: u8,
    /// Prometheus input scrape interval
    pub interval: Duration,
    /// Comma separated namepass list, brackets and quotes already stripped
    pub namepass: Option<String>,
    /// Add the internal input plugin
    pub enable_internal: bool,
    /// Raw `[[inputs.*]]` TOML fragment
    pub raw_input: Option<String>,
    /// Entries merged into `[global_tags]`
    pub global_tags: BTreeMap<String, String>,
}

impl OverrideSet {
    /// Defaults for a pod that sets no annotations
    pub fn defaults(class: impl Into<String>, enable_internal: bool) -> Self {
        Self {
            class: class.into(),
            ports: Vec::new(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            scheme: DEFAULT_METRICS_SCHEME.to_string(),
            metric_version: DEFAULT_METRIC_VERSION,
            interval: Duration::from_secs(DEFAULT_SCRAPE_INTERVAL_SECS),
            namepass: None,
            enable_internal,
            raw_input: None,
            global_tags: BTreeMap::new(),
        }
    }
}

/// Layer `annotations` over `defaults`
///
/// Malformed values never fail: each one is reported as a warning and the previous
/// value is kept. Annotations this module does not know are ignored.
pub fn apply_overrides(
    defaults: OverrideSet,
    annotations: &BTreeMap<String, String>,
) -> Advisory<OverrideSet> {
    let mut set = defaults;
    let mut warnings = Vec::new();

    if let Some(class) = annotations.get(ann::CLASS_ANNOTATION) {
        set.class.clone_from(class);
    }

    if let Some(port) = annotations.get(ann::METRICS_PORT_ANNOTATION) {
        warnings.push(format!(
            "Deprecated: {} will be removed in a future version, use {} instead.",
            ann::METRICS_PORT_ANNOTATION,
            ann::METRICS_PORTS_ANNOTATION
        ));
        push_port(&mut set.ports, &mut warnings, port, ann::METRICS_PORT_ANNOTATION);
    }

    if let Some(ports) = annotations.get(ann::METRICS_PORTS_ANNOTATION) {
        for port in ports.split(',') {
            push_port(&mut set.ports, &mut warnings, port, ann::METRICS_PORTS_ANNOTATION);
        }
    }

    if let Some(path) = annotations.get(ann::METRICS_PATH_ANNOTATION) {
        set.metrics_path.clone_from(path);
    }

    if let Some(scheme) = annotations.get(ann::METRICS_SCHEME_ANNOTATION) {
        set.scheme.clone_from(scheme);
    }

    if let Some(namepass) = annotations.get(ann::METRICS_NAMEPASS_ANNOTATION) {
        let cleaned = namepass.trim_matches(['[', ']']).replace('\'', "");
        set.namepass = (!cleaned.trim().is_empty()).then_some(cleaned);
    }

    if let Some(version) = annotations.get(ann::METRIC_VERSION_ANNOTATION) {
        match version.trim().parse::<u8>() {
            Ok(parsed) => set.metric_version = parsed,
            Err(e) => warnings.push(format!(
                "failed to convert value: {version} for {} to integer, error: {e}",
                ann::METRIC_VERSION_ANNOTATION
            )),
        }
    }

    if let Some(interval) = annotations.get(ann::INTERVAL_ANNOTATION) {
        match parse_go_duration(interval) {
            Ok(parsed) => set.interval = parsed,
            Err(e) => warnings.push(format!(
                "failed to convert value: {interval} for {} to duration, error: {e}",
                ann::INTERVAL_ANNOTATION
            )),
        }
    }

    if let Some(internal) = annotations.get(ann::ENABLE_INTERNAL_ANNOTATION) {
        if !internal.is_empty() {
            set.enable_internal = true;
        }
    }

    if let Some(raw) = annotations.get(ann::RAW_INPUT_ANNOTATION) {
        set.raw_input = (!raw.trim().is_empty()).then(|| raw.clone());
    }

    set.global_tags.extend(metadata::annotations_with_prefix(
        annotations,
        ann::GLOBAL_TAG_LITERAL_PREFIX,
    ));

    Advisory::with_warnings(set, warnings)
}

// Duplicates are kept; each listed port becomes its own URL
fn push_port(ports: &mut Vec<u16>, warnings: &mut Vec<String>, value: &str, annotation: &str) {
    match value.trim().parse::<u16>() {
        Ok(port) => ports.push(port),
        Err(e) => warnings.push(format!(
            "failed to convert value: {value} for {annotation} to integer, error: {e}"
        )),
    }
}
