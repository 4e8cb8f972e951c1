//! Environment configuration: one YAML document per target environment,
//! validated before any rendering or provisioning happens.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to parse environment config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]{0,40}$").unwrap())
}

fn region_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d$").unwrap())
}

fn cidr_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,3})\.(\d{1,3})\.(\d{1,3})\.(\d{1,3})/(\d{1,2})$").unwrap())
}

fn db_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]{0,62}$").unwrap())
}

/// Top-level environment description. Everything the renderer, the policy
/// engine, and the deploy pipeline need comes from here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    pub project: String,
    pub environment: String,
    pub region: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub state: StateConfig,
    pub vpc: VpcConfig,
    pub eks: EksConfig,
    #[serde(default)]
    pub ecr: EcrConfig,
    pub rds: RdsConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    #[serde(default)]
    pub policy: PolicyOverrides,
}

/// Remote state backend settings (S3 bucket + DynamoDB lock table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    pub bucket: String,
    #[serde(default = "StateConfig::default_lock_table")]
    pub dynamodb_table: String,
    #[serde(default = "StateConfig::default_key_prefix")]
    pub key_prefix: String,
}

impl StateConfig {
    fn default_lock_table() -> String {
        "terraform-locks".to_string()
    }
    fn default_key_prefix() -> String {
        "infra".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VpcConfig {
    pub cidr: String,
    #[serde(default = "VpcConfig::default_az_count")]
    pub az_count: u8,
    #[serde(default = "VpcConfig::default_single_nat")]
    pub single_nat_gateway: bool,
}

impl VpcConfig {
    fn default_az_count() -> u8 {
        2
    }
    fn default_single_nat() -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EksConfig {
    pub version: String,
    pub instance_types: Vec<String>,
    #[serde(default = "EksConfig::default_desired")]
    pub desired_size: u32,
    #[serde(default = "EksConfig::default_min")]
    pub min_size: u32,
    #[serde(default = "EksConfig::default_max")]
    pub max_size: u32,
}

impl EksConfig {
    fn default_desired() -> u32 {
        2
    }
    fn default_min() -> u32 {
        1
    }
    fn default_max() -> u32 {
        4
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EcrConfig {
    #[serde(default)]
    pub repositories: Vec<String>,
    #[serde(default = "EcrConfig::default_scan")]
    pub scan_on_push: bool,
    #[serde(default = "EcrConfig::default_keep")]
    pub keep_images: u32,
}

impl EcrConfig {
    fn default_scan() -> bool {
        true
    }
    fn default_keep() -> u32 {
        10
    }
}

impl Default for EcrConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            scan_on_push: Self::default_scan(),
            keep_images: Self::default_keep(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdsConfig {
    #[serde(default = "RdsConfig::default_engine_version")]
    pub engine_version: String,
    pub instance_class: String,
    #[serde(default = "RdsConfig::default_storage")]
    pub allocated_storage: u32,
    pub db_name: String,
    #[serde(default = "RdsConfig::default_username")]
    pub username: String,
    #[serde(default)]
    pub multi_az: bool,
    #[serde(default)]
    pub deletion_protection: bool,
}

impl RdsConfig {
    fn default_engine_version() -> String {
        "15.4".to_string()
    }
    fn default_storage() -> u32 {
        20
    }
    fn default_username() -> String {
        "appadmin".to_string()
    }
}

/// Application deploy settings used by the `deploy` pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default = "DeployConfig::default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub chart: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl DeployConfig {
    fn default_namespace() -> String {
        "default".to_string()
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            namespace: Self::default_namespace(),
            chart: None,
            services: Vec::new(),
            values: BTreeMap::new(),
        }
    }
}

/// Per-environment overrides for policy rule parameters. Absent fields fall
/// back to the rule defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyOverrides {
    #[serde(default)]
    pub required_tags: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_db_classes: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_node_types: Option<Vec<String>>,
    #[serde(default)]
    pub sensitive_ports: Option<Vec<u16>>,
    #[serde(default)]
    pub min_replicas: Option<u32>,
}

impl EnvConfig {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = serde_yaml::from_slice(bytes)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_slice(text.as_bytes())
    }

    /// `{project}-{environment}`, the prefix every resource name carries.
    pub fn name_prefix(&self) -> String {
        format!("{}-{}", self.project, self.environment)
    }

    /// Production-like environments get stricter gate behavior.
    pub fn is_prod_like(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production" | "staging")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !name_re().is_match(&self.project) {
            return Err(ConfigError::Invalid {
                field: "project",
                reason: format!("'{}' must match [a-z][a-z0-9-]*", self.project),
            });
        }
        if !name_re().is_match(&self.environment) {
            return Err(ConfigError::Invalid {
                field: "environment",
                reason: format!("'{}' must match [a-z][a-z0-9-]*", self.environment),
            });
        }
        if !region_re().is_match(&self.region) {
            return Err(ConfigError::Invalid {
                field: "region",
                reason: format!("'{}' is not an AWS region name", self.region),
            });
        }
        if self.state.bucket.is_empty() || self.state.bucket.len() > 63 {
            return Err(ConfigError::Invalid {
                field: "state.bucket",
                reason: "bucket name must be 1..=63 characters".to_string(),
            });
        }
        validate_cidr(&self.vpc.cidr)?;
        if !(1..=4).contains(&self.vpc.az_count) {
            return Err(ConfigError::Invalid {
                field: "vpc.az_count",
                reason: format!("{} is outside 1..=4", self.vpc.az_count),
            });
        }
        if self.eks.instance_types.is_empty() {
            return Err(ConfigError::Invalid {
                field: "eks.instance_types",
                reason: "at least one node instance type is required".to_string(),
            });
        }
        if self.eks.min_size > self.eks.desired_size || self.eks.desired_size > self.eks.max_size {
            return Err(ConfigError::Invalid {
                field: "eks",
                reason: format!(
                    "node counts must satisfy min <= desired <= max (got {}/{}/{})",
                    self.eks.min_size, self.eks.desired_size, self.eks.max_size
                ),
            });
        }
        if !db_name_re().is_match(&self.rds.db_name) {
            return Err(ConfigError::Invalid {
                field: "rds.db_name",
                reason: format!("'{}' is not a valid database name", self.rds.db_name),
            });
        }
        if self.rds.allocated_storage < 20 {
            return Err(ConfigError::Invalid {
                field: "rds.allocated_storage",
                reason: "RDS requires at least 20 GiB".to_string(),
            });
        }
        for repo in &self.ecr.repositories {
            if !name_re().is_match(repo) {
                return Err(ConfigError::Invalid {
                    field: "ecr.repositories",
                    reason: format!("'{repo}' must match [a-z][a-z0-9-]*"),
                });
            }
        }
        Ok(())
    }
}

/// The VPC CIDR must be a valid IPv4 block wide enough to carve per-AZ /24s.
fn validate_cidr(cidr: &str) -> Result<(), ConfigError> {
    let caps = cidr_re().captures(cidr).ok_or_else(|| ConfigError::Invalid {
        field: "vpc.cidr",
        reason: format!("'{cidr}' is not CIDR notation"),
    })?;
    for i in 1..=4 {
        let octet: u32 = caps[i].parse().map_err(|_| ConfigError::Invalid {
            field: "vpc.cidr",
            reason: format!("'{cidr}' has an invalid octet"),
        })?;
        if octet > 255 {
            return Err(ConfigError::Invalid {
                field: "vpc.cidr",
                reason: format!("'{cidr}' has an octet above 255"),
            });
        }
    }
    let prefix: u8 = caps[5].parse().map_err(|_| ConfigError::Invalid {
        field: "vpc.cidr",
        reason: format!("'{cidr}' has an invalid prefix"),
    })?;
    // Subnets are carved 8 bits deeper, so /22 is the narrowest usable base.
    if !(16..=22).contains(&prefix) {
        return Err(ConfigError::Invalid {
            field: "vpc.cidr",
            reason: format!("prefix /{prefix} is outside /16..=/22"),
        });
    }
    Ok(())
}
