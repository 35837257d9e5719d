//! # Document Builder
//!
//! Merges a class baseline with an [`OverrideSet`] into the final `telegraf.conf`.

use super::duration::format_go_duration;
use super::{AssemblyError, OverrideSet};
use crate::classdata::ClassDataHandler;
use toml::{Table, Value};

/// Build the final Telegraf configuration for `overrides`
///
/// Merge order: class baseline, synthesized Prometheus input, internal input, raw
/// inputs (replacing synthesized blocks of the same name), then global tags with the
/// annotation value winning over the class.
///
/// # Errors
///
/// Returns an [`AssemblyError`] when the class is unknown, the class or raw fragment
/// cannot be parsed, or the result cannot be serialized.
pub fn build_document(
    overrides: &OverrideSet,
    classes: &dyn ClassDataHandler,
) -> Result<String, AssemblyError> {
    let class_data =
        classes
            .class_data(&overrides.class)
            .ok_or_else(|| AssemblyError::ClassNotFound {
                class: overrides.class.clone(),
            })?;

    let mut document: Table =
        class_data
            .parse()
            .map_err(|source| AssemblyError::ClassParse {
                class: overrides.class.clone(),
                source,
            })?;

    let mut inputs = take_table(&mut document, "inputs", || {
        format!("class {}", overrides.class)
    })?;

    if !overrides.ports.is_empty() {
        inputs.insert(
            "prometheus".to_string(),
            Value::Array(vec![Value::Table(prometheus_input(overrides))]),
        );
    }

    if overrides.enable_internal {
        inputs.insert(
            "internal".to_string(),
            Value::Array(vec![Value::Table(Table::new())]),
        );
    }

    if let Some(raw) = &overrides.raw_input {
        let mut fragment: Table = raw.trim().parse().map_err(AssemblyError::RawInputParse)?;
        let raw_inputs = take_table(&mut fragment, "inputs", || {
            "raw input annotation".to_string()
        })?;
        inputs.extend(raw_inputs);
    }

    if !inputs.is_empty() {
        document.insert("inputs".to_string(), Value::Table(inputs));
    }

    if !overrides.global_tags.is_empty() {
        let mut tags = take_table(&mut document, "global_tags", || {
            format!("class {}", overrides.class)
        })?;
        for (key, value) in &overrides.global_tags {
            tags.insert(key.clone(), Value::String(value.clone()));
        }
        document.insert("global_tags".to_string(), Value::Table(tags));
    }

    Ok(toml::to_string(&document)?)
}

fn prometheus_input(overrides: &OverrideSet) -> Table {
    let urls = overrides
        .ports
        .iter()
        .map(|port| {
            Value::String(format!(
                "{}://localhost:{port}{}",
                overrides.scheme, overrides.metrics_path
            ))
        })
        .collect();

    let mut input = Table::new();
    input.insert("urls".to_string(), Value::Array(urls));
    input.insert(
        "interval".to_string(),
        Value::String(format_go_duration(overrides.interval)),
    );
    input.insert(
        "metric_version".to_string(),
        Value::Integer(i64::from(overrides.metric_version)),
    );

    if let Some(namepass) = &overrides.namepass {
        let names = namepass
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Value::String(name.to_string()))
            .collect();
        input.insert("namepass".to_string(), Value::Array(names));
    }

    input
}

/// Remove `key` from `table` as a sub-table, or an empty table when absent
fn take_table(
    table: &mut Table,
    key: &str,
    origin: impl FnOnce() -> String,
) -> Result<Table, AssemblyError> {
    match table.remove(key) {
        None => Ok(Table::new()),
        Some(Value::Table(inner)) => Ok(inner),
        Some(other) => Err(AssemblyError::NotATable {
            origin: origin(),
            key: key.to_string(),
            found: other.type_str(),
        }),
    }
}
