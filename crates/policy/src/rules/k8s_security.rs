//! Kubernetes security rules. All of them deny.

use infractl_k8s::{image_tag, Manifest};

use crate::report::Violation;
use crate::rules::{ids, manifest_address};

/// A container runs as non-root when it says so itself or inherits a
/// pod-level `runAsNonRoot: true`. A container-level `false` overrides the
/// pod setting.
pub fn run_as_nonroot(doc: &Manifest, out: &mut Vec<Violation>) {
    if !doc.is_workload() {
        return;
    }
    let pod_level = doc
        .pod_security_context()
        .and_then(|ctx| ctx["runAsNonRoot"].as_bool())
        .unwrap_or(false);
    for container in doc.containers() {
        let effective = container
            .security_context()
            .and_then(|ctx| ctx["runAsNonRoot"].as_bool())
            .unwrap_or(pod_level);
        if !effective {
            out.push(Violation::deny(
                ids::K8S_RUN_AS_NONROOT,
                manifest_address(doc),
                format!("container '{}' must set securityContext.runAsNonRoot: true", container.name),
            ));
        }
    }
}

pub fn privileged(doc: &Manifest, out: &mut Vec<Violation>) {
    for container in doc.containers() {
        let privileged = container
            .security_context()
            .and_then(|ctx| ctx["privileged"].as_bool())
            .unwrap_or(false);
        if privileged {
            out.push(Violation::deny(
                ids::K8S_PRIVILEGED,
                manifest_address(doc),
                format!("container '{}' must not run privileged", container.name),
            ));
        }
    }
}

pub fn latest_tag(doc: &Manifest, out: &mut Vec<Violation>) {
    for container in doc.containers() {
        let Some(image) = container.image else {
            continue;
        };
        if image.contains('@') {
            continue;
        }
        match image_tag(image) {
            None => out.push(Violation::deny(
                ids::K8S_LATEST_TAG,
                manifest_address(doc),
                format!("container '{}' uses untagged image '{image}'", container.name),
            )),
            Some("latest") => out.push(Violation::deny(
                ids::K8S_LATEST_TAG,
                manifest_address(doc),
                format!("container '{}' uses mutable ':latest' image '{image}'", container.name),
            )),
            Some(_) => {}
        }
    }
}

pub fn resource_limits(doc: &Manifest, out: &mut Vec<Violation>) {
    for container in doc.containers() {
        let limits = &container.resources()["limits"];
        let complete = !limits["cpu"].is_null() && !limits["memory"].is_null();
        if !complete {
            out.push(Violation::deny(
                ids::K8S_RESOURCE_LIMITS,
                manifest_address(doc),
                format!("container '{}' must set cpu and memory limits", container.name),
            ));
        }
    }
}
