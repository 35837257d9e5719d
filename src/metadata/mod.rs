//! # Metadata
//!
//! Annotation and label keys understood or written by the controller.
//!
//! All keys live under the [`PREFIX`] domain. Annotations are set by pod authors to
//! request and tune the sidecar; labels are written by the controller to connect the
//! admission webhook with the asynchronous reconciler.

pub mod annotations;
pub mod labels;

use std::collections::BTreeMap;

pub use annotations::*;
pub use labels::*;

/// Domain prefix shared by every annotation and label the controller owns
pub const PREFIX: &str = "telegraf.influxdata.com";

/// Collect annotations whose key starts with `prefix`, keyed by the remainder of the key
///
/// Keys that consist of the prefix alone are ignored since they carry no name.
#[must_use]
pub fn annotations_with_prefix(
    annotations: &BTreeMap<String, String>,
    prefix: &str,
) -> BTreeMap<String, String> {
    annotations
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(prefix)
                .filter(|name| !name.is_empty())
                .map(|name| (name.to_string(), value.clone()))
        })
        .collect()
}
