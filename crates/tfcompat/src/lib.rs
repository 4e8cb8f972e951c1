//! Thin wrapper over the terraform/tofu CLI: render a working directory,
//! then drive init → validate → plan → show → apply against it. Both
//! binaries speak the same command surface, so the runner is just a name.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde_json::Value as Json;
use tracing::debug;

pub const PLAN_FILE: &str = "tfplan";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runner {
    Terraform,
    Tofu,
}

/// Honors an explicit preference, otherwise takes whichever binary is on
/// PATH, tofu first.
pub fn pick_runner(prefer: Option<Runner>) -> Result<Runner> {
    if let Some(p) = prefer {
        return Ok(p);
    }
    if which::which("tofu").is_ok() {
        Ok(Runner::Tofu)
    } else if which::which("terraform").is_ok() {
        Ok(Runner::Terraform)
    } else {
        anyhow::bail!("neither 'tofu' nor 'terraform' found in PATH")
    }
}

fn bin(r: Runner) -> &'static str {
    match r {
        Runner::Terraform => "terraform",
        Runner::Tofu => "tofu",
    }
}

fn chdir(dir: &Path) -> String {
    format!("-chdir={}", dir.display())
}

/// Writes the rendered document as `main.tf.json` in `dir`.
pub fn write_tf_json(tf: &Json, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create working directory {}", dir.display()))?;
    let path = dir.join("main.tf.json");
    std::fs::write(&path, serde_json::to_string_pretty(tf)?)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn run(r: Runner, dir: &Path, args: &[&str], what: &str) -> Result<()> {
    debug!(runner = bin(r), ?args, "running {what}");
    let st = Command::new(bin(r))
        .arg(chdir(dir))
        .args(args)
        .status()
        .with_context(|| format!("spawn {what}"))?;
    if !st.success() {
        anyhow::bail!("{what} failed with {st}");
    }
    Ok(())
}

pub fn init(r: Runner, dir: &Path) -> Result<()> {
    run(r, dir, &["init", "-input=false"], "init")
}

pub fn validate(r: Runner, dir: &Path) -> Result<()> {
    run(r, dir, &["validate"], "validate")
}

/// Plans into a file so the apply step executes exactly what was reviewed.
pub fn plan(r: Runner, dir: &Path) -> Result<()> {
    run(r, dir, &["plan", "-input=false", &format!("-out={PLAN_FILE}")], "plan")
}

/// The saved plan serialized as JSON, for policy evaluation.
pub fn show_plan_json(r: Runner, dir: &Path) -> Result<Vec<u8>> {
    let out = Command::new(bin(r))
        .arg(chdir(dir))
        .args(["show", "-json", PLAN_FILE])
        .output()
        .context("spawn show")?;
    if !out.status.success() {
        anyhow::bail!("show failed with {}: {}", out.status, String::from_utf8_lossy(&out.stderr));
    }
    Ok(out.stdout)
}

pub fn apply_plan(r: Runner, dir: &Path) -> Result<()> {
    run(r, dir, &["apply", "-input=false", PLAN_FILE], "apply")
}

pub fn destroy(r: Runner, dir: &Path) -> Result<()> {
    run(r, dir, &["destroy", "-auto-approve"], "destroy")
}
