//! Infrastructure pipeline: render the environment to tf.json, drive
//! terraform through a saved plan, evaluate policy over the plan JSON, and
//! only then apply. Denials block; warnings ask.

use std::path::{Path, PathBuf};

use anyhow::Result;
use infractl_core::EnvConfig;
use infractl_policy::{evaluate_plan, PlanDoc, Report, RuleConfig, Verdict};
use infractl_tfcompat as tfcompat;
use tracing::info;

use crate::ui;

#[derive(Debug, Clone)]
pub struct InfraOptions {
    /// Where main.tf.json, the saved plan, and terraform state files live.
    pub workdir: PathBuf,
    pub runner: Option<tfcompat::Runner>,
    /// Skip interactive gates; denials still block.
    pub auto_approve: bool,
}

pub struct PlanOutcome {
    pub report: Report,
    pub workdir: PathBuf,
    pub runner: tfcompat::Runner,
}

fn render_into(cfg: &EnvConfig, workdir: &Path) -> Result<()> {
    ui::step(&format!("rendering '{}' into {}", cfg.name_prefix(), workdir.display()));
    let doc = infractl_aws::render_stack(cfg)?;
    tfcompat::write_tf_json(&doc, workdir)?;
    Ok(())
}

/// Write main.tf.json and stop. The artifact is reviewable on its own.
pub fn render(cfg: &EnvConfig, workdir: &Path) -> Result<()> {
    render_into(cfg, workdir)?;
    ui::success(&format!("wrote {}", workdir.join("main.tf.json").display()));
    Ok(())
}

/// Render plus backend/provider initialization, no plan.
pub fn init(cfg: &EnvConfig, opts: &InfraOptions) -> Result<()> {
    let runner = tfcompat::pick_runner(opts.runner)?;
    render_into(cfg, &opts.workdir)?;
    ui::step("initializing backend and providers");
    tfcompat::init(runner, &opts.workdir)?;
    ui::success("initialized");
    Ok(())
}

/// Render → init → validate → plan → show → policy. No mutation of cloud
/// state; the saved plan file is the only artifact.
pub fn plan(cfg: &EnvConfig, opts: &InfraOptions) -> Result<PlanOutcome> {
    let runner = tfcompat::pick_runner(opts.runner)?;
    render_into(cfg, &opts.workdir)?;

    ui::step("initializing backend and providers");
    tfcompat::init(runner, &opts.workdir)?;
    tfcompat::validate(runner, &opts.workdir)?;

    ui::step("planning changes");
    tfcompat::plan(runner, &opts.workdir)?;

    let mut plan_bytes = tfcompat::show_plan_json(runner, &opts.workdir)?;
    let plan_doc = PlanDoc::from_slice(&mut plan_bytes)?;
    info!(resources = plan_doc.resource_changes.len(), "evaluating plan policy");

    let rule_cfg = RuleConfig::from_overrides(&cfg.policy, Some(cfg.environment.as_str()));
    let report = evaluate_plan(&plan_doc, &rule_cfg);
    ui::print_report(&report);

    Ok(PlanOutcome { report, workdir: opts.workdir.clone(), runner })
}

/// Plan, gate on policy, gate on a human, then apply the saved plan file.
pub fn apply(cfg: &EnvConfig, opts: &InfraOptions) -> Result<()> {
    let outcome = plan(cfg, opts)?;
    policy_gate(&outcome.report, opts.auto_approve)?;

    if !opts.auto_approve {
        let prompt = format!("Apply environment '{}'", cfg.name_prefix());
        if !ui::confirm(&prompt)? {
            anyhow::bail!("apply cancelled");
        }
    }
    ui::step("applying saved plan");
    tfcompat::apply_plan(outcome.runner, &outcome.workdir)?;
    ui::success(&format!("environment '{}' applied", cfg.environment));
    Ok(())
}

/// Regenerates the working directory so the backend config is present, then
/// tears the environment down. Always confirmed unless auto-approved.
pub fn destroy(cfg: &EnvConfig, opts: &InfraOptions) -> Result<()> {
    let runner = tfcompat::pick_runner(opts.runner)?;
    render_into(cfg, &opts.workdir)?;
    tfcompat::init(runner, &opts.workdir)?;

    if !opts.auto_approve {
        let prompt = format!("Destroy environment '{}'", cfg.name_prefix());
        if !ui::confirm(&prompt)? {
            anyhow::bail!("destroy cancelled");
        }
    }
    ui::step(&format!("destroying '{}'", cfg.name_prefix()));
    tfcompat::destroy(runner, &opts.workdir)?;
    ui::success(&format!("environment '{}' destroyed", cfg.environment));
    Ok(())
}

/// Deny blocks unconditionally. Warnings block until a human accepts them,
/// or pass silently under auto-approve.
pub(crate) fn policy_gate(report: &Report, auto_approve: bool) -> Result<()> {
    match report.verdict() {
        Verdict::Deny => {
            anyhow::bail!("blocked by policy: {} violation(s)", report.denials().count())
        }
        Verdict::Warn => {
            if auto_approve {
                ui::info("proceeding despite warnings (auto-approved)");
                return Ok(());
            }
            if !ui::confirm("Proceed despite warnings")? {
                anyhow::bail!("cancelled after policy warnings");
            }
            Ok(())
        }
        Verdict::Pass => Ok(()),
    }
}
