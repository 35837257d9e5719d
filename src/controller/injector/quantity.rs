//! # Resource Quantities
//!
//! Syntax check for Kubernetes resource quantities (`100m`, `1.5Gi`, `2e3`).

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use regex::Regex;
use std::sync::LazyLock;

// <signedNumber><suffix>, suffix binary (Ki..Ei), decimal (n, u, m, k, M..E) or exponent
static QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[KMGTPE]i|[numkMGTPE]|[eE][+-]?\d+)?$")
        .expect("Failed to compile QUANTITY_REGEX - this should never happen")
});

/// Parse `value` as a resource quantity, `None` when it is not valid quantity syntax
pub fn parse_quantity(value: &str) -> Option<Quantity> {
    let trimmed = value.trim();
    QUANTITY_REGEX
        .is_match(trimmed)
        .then(|| Quantity(trimmed.to_string()))
}
