//! # Injection Policy Tests
//!
//! Exercises the sidecar injector on realistic pods: qualification, the generated
//! container and volume, and annotation fallbacks.

mod common;

use common::{app_pod, injector};
use k8s_openapi::api::core::v1::{Container, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn container_named(name: &str) -> Container {
    Container {
        name: name.to_string(),
        ..Default::default()
    }
}

#[test]
fn test_pod_without_telegraf_annotations_is_not_injected() {
    let pod = app_pod("web-0", &[("prometheus.io/scrape", "true")]);
    assert!(!injector(false).should_inject(&pod));
    assert!(injector(false).inject(&pod).is_none());
}

#[test]
fn test_pod_with_existing_telegraf_container_is_not_injected() {
    let mut pod = app_pod("web-0", &[("telegraf.influxdata.com/ports", "8080")]);
    if let Some(spec) = pod.spec.as_mut() {
        spec.containers.push(container_named("telegraf-custom"));
    }
    assert!(injector(false).inject(&pod).is_none());
}

#[test]
fn test_native_mode_checks_containers_and_init_containers() {
    let mut pod = app_pod("web-0", &[("telegraf.influxdata.com/ports", "8080")]);
    assert!(injector(true).should_inject(&pod));

    if let Some(spec) = pod.spec.as_mut() {
        spec.containers.push(container_named("telegraf"));
    }
    assert!(!injector(true).should_inject(&pod));
    assert!(injector(true).inject(&pod).is_none());

    let mut pod = app_pod("web-0", &[("telegraf.influxdata.com/ports", "8080")]);
    if let Some(spec) = pod.spec.as_mut() {
        spec.init_containers = Some(vec![container_named("telegraf")]);
    }
    assert!(!injector(true).should_inject(&pod));
}

#[test]
fn test_injected_pod_shape() {
    let pod = app_pod("web-0", &[("telegraf.influxdata.com/ports", "8080")]);
    let mut rng = StdRng::seed_from_u64(7);
    let advisory = injector(false)
        .inject_with(&pod, &mut rng)
        .expect("pod qualifies");
    assert!(advisory.is_clean(), "{advisory}");
    let decision = advisory.into_value();

    assert!(decision.secret_name.starts_with("telegraf-config-web-0-"));
    assert_eq!(decision.secret_name.len(), "telegraf-config-web-0-".len() + 5);

    let container = &decision.container;
    assert_eq!(container.name, "telegraf");
    assert_eq!(
        container.image.as_deref(),
        Some("docker.io/library/telegraf:1.30-alpine")
    );
    assert!(container.restart_policy.is_none());
    let mounts = container.volume_mounts.as_deref().unwrap_or_default();
    assert!(mounts
        .iter()
        .any(|m| m.name == "telegraf-config" && m.mount_path == "/etc/telegraf"));

    assert_eq!(decision.volume.name, "telegraf-config");
    assert_eq!(
        decision
            .volume
            .secret
            .as_ref()
            .and_then(|s| s.secret_name.as_deref()),
        Some(decision.secret_name.as_str())
    );

    let mut patched: Pod = pod.clone();
    decision.apply_to(&mut patched);
    let labels = patched.metadata.labels.unwrap_or_default();
    assert_eq!(
        labels.get("telegraf.influxdata.com/injected").map(String::as_str),
        Some("true")
    );
    assert_eq!(
        labels.get("telegraf.influxdata.com/secret-name"),
        Some(&decision.secret_name)
    );
    assert_eq!(patched.spec.map(|s| s.containers.len()), Some(2));
}

#[test]
fn test_native_sidecar_is_restartable_init_container() {
    let pod = app_pod("web-0", &[("telegraf.influxdata.com/ports", "8080")]);
    let decision = injector(true)
        .inject(&pod)
        .expect("pod qualifies")
        .into_value();

    assert!(decision.native_sidecar);
    assert_eq!(decision.container.restart_policy.as_deref(), Some("Always"));

    let mut patched = pod;
    decision.apply_to(&mut patched);
    let spec = patched.spec.expect("spec kept");
    assert_eq!(spec.containers.len(), 1);
    assert_eq!(spec.init_containers.map(|c| c.len()), Some(1));
}

#[test]
fn test_generate_name_is_used_when_name_is_empty() {
    let mut pod = app_pod("", &[("telegraf.influxdata.com/ports", "8080")]);
    pod.metadata.generate_name = Some("web-7d9f-".to_string());

    let name = injector(false).generate_secret_name(&pod);
    assert!(name.starts_with("telegraf-config-web-7d9f-"), "{name}");
}

#[test]
fn test_long_pod_names_produce_valid_secret_names() {
    let long_name = "a".repeat(120);
    let pod = app_pod(&long_name, &[("telegraf.influxdata.com/ports", "8080")]);

    let name = injector(false).generate_secret_name(&pod);
    assert_eq!(name.len(), 63);
}

#[test]
fn test_long_dotted_pod_names_produce_dns_subdomain_secret_names() {
    let dns_subdomain =
        regex::Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .expect("valid regex");

    for cut in 30..50 {
        let pod_name = format!("{}.metrics.{}", "x".repeat(cut), "y".repeat(40));
        let pod = app_pod(&pod_name, &[("telegraf.influxdata.com/ports", "8080")]);

        let name = injector(false).generate_secret_name(&pod);
        assert!(name.len() <= 63, "{name}");
        assert!(!name.contains(".-"), "{name}");
        assert!(dns_subdomain.is_match(&name), "{name}");
    }
}

#[test]
fn test_invalid_cpu_limit_falls_back_with_warning() {
    let pod = app_pod(
        "web-0",
        &[
            ("telegraf.influxdata.com/ports", "8080"),
            ("telegraf.influxdata.com/limits-cpu", "1000x"),
        ],
    );
    let advisory = injector(false).inject(&pod).expect("pod qualifies");
    assert_eq!(advisory.warnings().len(), 1);
    assert!(advisory.warnings()[0].contains("1000x"));

    let limits = advisory
        .into_value()
        .container
        .resources
        .and_then(|r| r.limits)
        .expect("limits set");
    assert_eq!(limits.get("cpu"), Some(&Quantity("200m".to_string())));
}

#[test]
fn test_env_annotations_become_container_env() {
    let pod = app_pod(
        "web-0",
        &[
            ("telegraf.influxdata.com/ports", "8080"),
            ("telegraf.influxdata.com/env-literal-REGION", "eu-west-1"),
            (
                "telegraf.influxdata.com/env-secretkeyref-INFLUX_TOKEN",
                "influx-auth.token",
            ),
        ],
    );
    let container = injector(false)
        .inject(&pod)
        .expect("pod qualifies")
        .into_value()
        .container;
    let env = container.env.unwrap_or_default();

    let region = env.iter().find(|e| e.name == "REGION").expect("literal env");
    assert_eq!(region.value.as_deref(), Some("eu-west-1"));

    let token = env
        .iter()
        .find(|e| e.name == "INFLUX_TOKEN")
        .and_then(|e| e.value_from.as_ref())
        .and_then(|v| v.secret_key_ref.as_ref())
        .expect("secret key ref env");
    assert_eq!(token.name, "influx-auth");
    assert_eq!(token.key, "token");

    for name in ["PODNAME", "NODENAME", "NAMESPACE"] {
        assert!(env.iter().any(|e| e.name == name), "missing {name}");
    }
}
