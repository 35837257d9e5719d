//! Render command
//!
//! Prints what the webhook and the reconciler would produce for a pod manifest.

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use std::collections::BTreeMap;
use std::path::Path;
use telegraf_sidecar_controller::classdata::DirectoryClassData;
use telegraf_sidecar_controller::config::ControllerConfig;
use telegraf_sidecar_controller::controller::assembler::{
    apply_overrides, build_document, OverrideSet,
};
use telegraf_sidecar_controller::controller::injector::SidecarInjector;

/// Render the sidecar container and configuration document for the pod in `pod_path`
pub fn render_command(
    classes_dir: &Path,
    pod_path: &Path,
    default_class: &str,
    enable_internal: bool,
) -> Result<()> {
    let classes = DirectoryClassData::new(classes_dir)
        .with_context(|| format!("Failed to load classes from {}", classes_dir.display()))?;

    let manifest = std::fs::read_to_string(pod_path)
        .with_context(|| format!("Failed to read {}", pod_path.display()))?;
    let pod: Pod = serde_yaml::from_str(&manifest)
        .with_context(|| format!("{} is not a valid pod manifest", pod_path.display()))?;

    let defaults = ControllerConfig::from_env()
        .sidecar_defaults()
        .context("Invalid sidecar defaults")?;
    let injector = SidecarInjector::new(defaults);

    let Some(injection) = injector.inject(&pod) else {
        println!("pod does not qualify for telegraf sidecar injection");
        return Ok(());
    };
    print_warnings("sidecar", injection.warnings());
    let decision = injection.into_value();

    println!("# secret: {}", decision.secret_name);
    println!("# sidecar container");
    print!(
        "{}",
        serde_yaml::to_string(&decision.container).context("Failed to serialize container")?
    );

    let empty = BTreeMap::new();
    let annotations = pod.metadata.annotations.as_ref().unwrap_or(&empty);
    let overrides = apply_overrides(OverrideSet::defaults(default_class, enable_internal), annotations);
    print_warnings("configuration", overrides.warnings());
    let overrides = overrides.into_value();

    let document = build_document(&overrides, &classes)
        .with_context(|| format!("Failed to build configuration for class {}", overrides.class))?;

    println!("# telegraf.conf (class {})", overrides.class);
    print!("{document}");

    Ok(())
}

fn print_warnings(stage: &str, warnings: &[String]) {
    for warning in warnings {
        eprintln!("⚠ {stage}: {warning}");
    }
}
