//! Helm chart rendering. Manifests are rendered locally with
//! `helm template` so they can be linted before anything reaches the
//! cluster.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

fn helm() -> Result<String> {
    let p = which::which("helm").context("helm not found in PATH")?;
    Ok(p.to_string_lossy().into_owned())
}

/// Renders a chart to a multi-document YAML stream.
pub fn template(
    release: &str,
    chart: &Path,
    namespace: &str,
    values: &[(String, String)],
) -> Result<String> {
    let mut cmd = Command::new(helm()?);
    cmd.arg("template")
        .arg(release)
        .arg(chart)
        .args(["--namespace", namespace]);
    for (key, value) in values {
        cmd.arg("--set").arg(format!("{key}={value}"));
    }
    let out = cmd.output().context("spawn helm template")?;
    if !out.status.success() {
        anyhow::bail!("helm template failed: {}", String::from_utf8_lossy(&out.stderr));
    }
    String::from_utf8(out.stdout).context("helm template output is not utf-8")
}
