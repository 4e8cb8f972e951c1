//! Docker operations used by the application pipeline.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};

fn docker() -> Result<String> {
    let p = which::which("docker").context("docker not found in PATH")?;
    Ok(p.to_string_lossy().into_owned())
}

pub fn build(context_dir: &Path, tag: &str) -> Result<()> {
    let st = Command::new(docker()?)
        .arg("build")
        .arg("-t")
        .arg(tag)
        .arg(context_dir)
        .status()
        .with_context(|| format!("spawn docker build for {tag}"))?;
    if !st.success() {
        anyhow::bail!("docker build failed for {tag}");
    }
    Ok(())
}

pub fn tag(src: &str, dst: &str) -> Result<()> {
    let st = Command::new(docker()?)
        .args(["tag", src, dst])
        .status()
        .context("spawn docker tag")?;
    if !st.success() {
        anyhow::bail!("docker tag {src} -> {dst} failed");
    }
    Ok(())
}

pub fn push(image: &str) -> Result<()> {
    let st = Command::new(docker()?)
        .args(["push", image])
        .status()
        .with_context(|| format!("spawn docker push for {image}"))?;
    if !st.success() {
        anyhow::bail!("docker push failed for {image}");
    }
    Ok(())
}

/// `docker login --password-stdin`: the token travels over a pipe, never
/// through argv.
pub fn login_stdin(registry: &str, username: &str, password: &SecretString) -> Result<()> {
    let mut child = Command::new(docker()?)
        .args(["login", "--username", username, "--password-stdin", registry])
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .context("spawn docker login")?;
    {
        use std::io::Write;
        let stdin = child.stdin.as_mut().context("docker login stdin")?;
        stdin.write_all(password.expose_secret().as_bytes())?;
    }
    let st = child.wait()?;
    if !st.success() {
        anyhow::bail!("docker login failed for {registry}");
    }
    Ok(())
}
