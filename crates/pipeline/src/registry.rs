//! ECR registry discovery and login. The account id comes from STS, the
//! login token from `aws ecr get-login-password`, piped straight into
//! docker.

use std::process::Command;

use anyhow::{Context, Result};
use secrecy::SecretString;
use zeroize::Zeroize;

use crate::docker;

fn aws() -> Result<String> {
    let p = which::which("aws").context("aws cli not found in PATH")?;
    Ok(p.to_string_lossy().into_owned())
}

#[derive(Debug, Clone)]
pub struct EcrRegistry {
    pub account_id: String,
    pub region: String,
}

impl EcrRegistry {
    /// Resolves the registry for the caller's AWS account.
    pub fn discover(region: &str) -> Result<Self> {
        let out = Command::new(aws()?)
            .args(["sts", "get-caller-identity", "--query", "Account", "--output", "text"])
            .output()
            .context("spawn aws sts get-caller-identity")?;
        if !out.status.success() {
            anyhow::bail!(
                "could not resolve AWS account id: {}",
                String::from_utf8_lossy(&out.stderr)
            );
        }
        let account_id = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if account_id.is_empty() || !account_id.chars().all(|c| c.is_ascii_digit()) {
            anyhow::bail!("unexpected account id '{account_id}' from sts");
        }
        Ok(Self { account_id, region: region.to_string() })
    }

    pub fn host(&self) -> String {
        format!("{}.dkr.ecr.{}.amazonaws.com", self.account_id, self.region)
    }

    pub fn image_ref(&self, repository: &str, tag: &str) -> String {
        format!("{}/{repository}:{tag}", self.host())
    }

    /// `aws ecr get-login-password | docker login --password-stdin`.
    pub fn login(&self) -> Result<()> {
        let out = Command::new(aws()?)
            .args(["ecr", "get-login-password", "--region", &self.region])
            .output()
            .context("spawn aws ecr get-login-password")?;
        if !out.status.success() {
            anyhow::bail!("ecr login token request failed: {}", String::from_utf8_lossy(&out.stderr));
        }
        let mut raw = String::from_utf8(out.stdout).context("login token is not utf-8")?;
        let token = SecretString::new(raw.trim().to_string());
        raw.zeroize();
        docker::login_stdin(&self.host(), "AWS", &token)
    }
}
