//! Application pipeline: build and scan images, push them to ECR, render
//! the chart, lint the manifests, and roll them out. Nothing is pushed or
//! applied past a failed gate.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use infractl_aws::ecr::Ecr;
use infractl_core::EnvConfig;
use infractl_policy::{evaluate_manifests, RuleConfig};
use tracing::info;

use crate::registry::EcrRegistry;
use crate::{docker, helm, infra, kubectl, scan, ui};

const ROLLOUT_TIMEOUT_SECS: u32 = 300;

#[derive(Debug, Clone)]
pub struct DeployOptions {
    pub tag: String,
    /// Subset of configured services; empty deploys all of them.
    pub services: Vec<String>,
    /// Directory holding one docker build context per service.
    pub context_root: PathBuf,
    pub skip_scan: bool,
    pub auto_approve: bool,
}

pub fn deploy(cfg: &EnvConfig, opts: &DeployOptions) -> Result<()> {
    let services = select_services(&cfg.deploy.services, &opts.services)?;
    let chart = cfg.deploy.chart.as_deref().context("deploy.chart is not configured")?;

    // Build and scan everything before any image leaves the machine.
    for service in &services {
        let local = local_tag(service, &opts.tag);
        ui::step(&format!("building {local}"));
        docker::build(&opts.context_root.join(service), &local)?;
        if opts.skip_scan {
            ui::info(&format!("vulnerability scan skipped for {local}"));
        } else {
            let summary = scan::scan_image(&local)?;
            vuln_gate(&local, &summary, opts.auto_approve)?;
        }
    }

    ui::step("logging into ECR");
    let registry = EcrRegistry::discover(&cfg.region)?;
    registry.login()?;

    for service in &services {
        let local = local_tag(service, &opts.tag);
        let remote = registry.image_ref(&Ecr::repository_name(cfg, service), &opts.tag);
        docker::tag(&local, &remote)?;
        ui::step(&format!("pushing {remote}"));
        docker::push(&remote)?;
    }

    ui::step("updating kubeconfig");
    kubectl::update_kubeconfig(&cfg.name_prefix(), &cfg.region)?;

    ui::step(&format!("rendering chart {chart}"));
    let values = release_values(cfg, &registry, &opts.tag);
    let manifests = helm::template(&cfg.project, Path::new(chart), &cfg.deploy.namespace, &values)?;

    let docs = infractl_k8s::parse_docs(&manifests)?;
    info!(documents = docs.len(), "evaluating manifest policy");
    let rule_cfg = RuleConfig::from_overrides(&cfg.policy, Some(cfg.environment.as_str()));
    let report = evaluate_manifests(&docs, &rule_cfg);
    ui::print_report(&report);
    infra::policy_gate(&report, opts.auto_approve)?;

    ui::step(&format!("applying manifests to namespace '{}'", cfg.deploy.namespace));
    kubectl::apply_manifests(&manifests, &cfg.deploy.namespace)?;

    for service in &services {
        ui::step(&format!("waiting for rollout of {service}"));
        let target = format!("deployment/{service}");
        kubectl::rollout_status(&target, &cfg.deploy.namespace, ROLLOUT_TIMEOUT_SECS)?;
    }

    ui::success(&format!("deployed {} service(s) to '{}'", services.len(), cfg.environment));
    Ok(())
}

fn local_tag(service: &str, tag: &str) -> String {
    format!("{service}:{tag}")
}

/// An explicit service list must name configured services; an empty list
/// means all of them.
fn select_services(configured: &[String], requested: &[String]) -> Result<Vec<String>> {
    if configured.is_empty() {
        anyhow::bail!("no services configured under deploy.services");
    }
    if requested.is_empty() {
        return Ok(configured.to_vec());
    }
    for name in requested {
        if !configured.iter().any(|s| s == name) {
            anyhow::bail!("service '{name}' is not in deploy.services");
        }
    }
    Ok(requested.to_vec())
}

/// Chart values: the configured map first, then the image coordinates the
/// pipeline owns.
fn release_values(cfg: &EnvConfig, registry: &EcrRegistry, tag: &str) -> Vec<(String, String)> {
    let mut values: Vec<(String, String)> =
        cfg.deploy.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    values.push(("image.registry".to_string(), registry.host()));
    values.push(("image.tag".to_string(), tag.to_string()));
    values
}

/// Critical findings stop the push until a human accepts them, or pass
/// with a notice under auto-approve.
fn vuln_gate(image: &str, summary: &scan::ScanSummary, auto_approve: bool) -> Result<()> {
    if !summary.blocks_push() {
        ui::success(&format!(
            "{image}: no critical vulnerabilities ({} finding(s) total)",
            summary.total
        ));
        return Ok(());
    }
    for vuln in &summary.critical {
        ui::error(&format!("{image}: {} in {} (critical)", vuln.id, vuln.package));
    }
    if auto_approve {
        ui::info("proceeding despite critical vulnerabilities (auto-approved)");
        return Ok(());
    }
    let prompt = format!("Push {image} despite {} critical finding(s)", summary.critical.len());
    if !ui::confirm(&prompt)? {
        anyhow::bail!("cancelled after critical vulnerabilities");
    }
    Ok(())
}
