//! Kubernetes workload conventions: the `app` label requirement denies,
//! replica counts and probes advise.

use infractl_k8s::Manifest;

use crate::config::RuleConfig;
use crate::report::Violation;
use crate::rules::{ids, manifest_address};

pub fn required_labels(doc: &Manifest, out: &mut Vec<Violation>) {
    if !doc.is_workload() {
        return;
    }
    let has_app = doc.labels().is_some_and(|labels| labels["app"].is_string());
    if !has_app {
        out.push(Violation::deny(
            ids::K8S_REQUIRED_LABELS,
            manifest_address(doc),
            "workload must carry an 'app' label",
        ));
    }
}

pub fn min_replicas(doc: &Manifest, cfg: &RuleConfig, out: &mut Vec<Violation>) {
    let Some(replicas) = doc.replicas() else {
        return;
    };
    if replicas < cfg.min_replicas {
        out.push(Violation::warn(
            ids::K8S_MIN_REPLICAS,
            manifest_address(doc),
            format!("{replicas} replica(s) configured, minimum is {}", cfg.min_replicas),
        ));
    }
}

/// Probes only make sense on long-running containers, so init containers
/// are exempt.
pub fn probes(doc: &Manifest, out: &mut Vec<Violation>) {
    for container in doc.containers() {
        if container.init {
            continue;
        }
        let live = container.body["livenessProbe"].is_object();
        let ready = container.body["readinessProbe"].is_object();
        if !live || !ready {
            out.push(Violation::warn(
                ids::K8S_PROBES,
                manifest_address(doc),
                format!("container '{}' is missing liveness or readiness probes", container.name),
            ));
        }
    }
}
