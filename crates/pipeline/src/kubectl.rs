//! kubectl plumbing: kubeconfig wiring, manifest apply over stdin, rollout
//! tracking.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};

fn kubectl() -> Result<String> {
    let p = which::which("kubectl").context("kubectl not found in PATH")?;
    Ok(p.to_string_lossy().into_owned())
}

/// Points the current kubeconfig context at an EKS cluster.
pub fn update_kubeconfig(cluster: &str, region: &str) -> Result<()> {
    let aws = which::which("aws").context("aws cli not found in PATH")?;
    let st = Command::new(aws)
        .args(["eks", "update-kubeconfig", "--name", cluster, "--region", region])
        .status()
        .context("spawn aws eks update-kubeconfig")?;
    if !st.success() {
        anyhow::bail!("update-kubeconfig failed for cluster {cluster}");
    }
    Ok(())
}

/// `kubectl apply -f -` with the manifest stream on stdin.
pub fn apply_manifests(manifests: &str, namespace: &str) -> Result<()> {
    let mut child = Command::new(kubectl()?)
        .args(["apply", "--namespace", namespace, "-f", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .context("spawn kubectl apply")?;
    {
        use std::io::Write;
        let stdin = child.stdin.as_mut().context("kubectl apply stdin")?;
        stdin.write_all(manifests.as_bytes())?;
    }
    let st = child.wait()?;
    if !st.success() {
        anyhow::bail!("kubectl apply failed");
    }
    Ok(())
}

/// Blocks until the rollout finishes or the timeout expires.
pub fn rollout_status(target: &str, namespace: &str, timeout_secs: u32) -> Result<()> {
    let st = Command::new(kubectl()?)
        .args([
            "rollout",
            "status",
            target,
            "--namespace",
            namespace,
            &format!("--timeout={timeout_secs}s"),
        ])
        .status()
        .with_context(|| format!("spawn kubectl rollout status for {target}"))?;
    if !st.success() {
        anyhow::bail!("rollout of {target} did not complete");
    }
    Ok(())
}
