//! Image vulnerability scanning with trivy. The pipeline refuses to push
//! images carrying known critical CVEs.

use std::process::Command;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct TrivyReport {
    #[serde(default, rename = "Results")]
    results: Vec<TrivyResult>,
}

#[derive(Debug, Default, Deserialize)]
struct TrivyResult {
    #[serde(default, rename = "Vulnerabilities")]
    vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "VulnerabilityID")]
    pub id: String,
    #[serde(rename = "PkgName")]
    pub package: String,
    #[serde(rename = "Severity")]
    pub severity: String,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub critical: Vec<Vulnerability>,
    pub high: usize,
    pub total: usize,
}

impl ScanSummary {
    pub fn blocks_push(&self) -> bool {
        !self.critical.is_empty()
    }

    fn from_report(report: TrivyReport) -> Self {
        let mut summary = Self::default();
        for result in report.results {
            for vuln in result.vulnerabilities {
                summary.total += 1;
                match vuln.severity.as_str() {
                    "CRITICAL" => summary.critical.push(vuln),
                    "HIGH" => summary.high += 1,
                    _ => {}
                }
            }
        }
        summary
    }
}

/// Runs `trivy image` and summarizes the JSON report. A missing scanner is
/// an error; skipping the scan is an explicit pipeline flag, not a silent
/// fallback.
pub fn scan_image(image: &str) -> Result<ScanSummary> {
    let trivy = which::which("trivy").context("trivy not found in PATH (use --skip-scan to bypass)")?;
    let out = Command::new(trivy)
        .args(["image", "--format", "json", "--quiet", image])
        .output()
        .with_context(|| format!("spawn trivy for {image}"))?;
    if !out.status.success() {
        anyhow::bail!("trivy scan failed for {image}: {}", String::from_utf8_lossy(&out.stderr));
    }
    parse_summary(&out.stdout)
}

fn parse_summary(bytes: &[u8]) -> Result<ScanSummary> {
    let report: TrivyReport = serde_json::from_slice(bytes).context("parse trivy report")?;
    Ok(ScanSummary::from_report(report))
}
