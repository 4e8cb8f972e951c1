//! Rule parameters. Defaults describe the house baseline; environments may
//! override any of them through the `policy` section of their config.

use std::collections::BTreeSet;

use infractl_core::PolicyOverrides;

pub const DEFAULT_REQUIRED_TAGS: &[&str] = &["Environment", "Project", "ManagedBy"];
pub const DEFAULT_DB_CLASS_PREFIXES: &[&str] = &["db.t3", "db.t4g"];
pub const DEFAULT_NODE_TYPE_PREFIXES: &[&str] = &["t3", "t4g", "m5"];
pub const DEFAULT_SENSITIVE_PORTS: &[u16] = &[22, 3389, 3306, 5432, 6379, 9200, 27017];
pub const DEFAULT_MIN_REPLICAS: u64 = 2;

#[derive(Debug, Clone)]
pub struct RuleConfig {
    pub required_tags: BTreeSet<String>,
    pub allowed_db_classes: Vec<String>,
    pub allowed_node_types: Vec<String>,
    pub sensitive_ports: BTreeSet<u16>,
    pub min_replicas: u64,
    /// Environment name when known; cost rules that depend on it are
    /// skipped otherwise.
    pub environment: Option<String>,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            required_tags: DEFAULT_REQUIRED_TAGS.iter().map(|s| s.to_string()).collect(),
            allowed_db_classes: DEFAULT_DB_CLASS_PREFIXES.iter().map(|s| s.to_string()).collect(),
            allowed_node_types: DEFAULT_NODE_TYPE_PREFIXES.iter().map(|s| s.to_string()).collect(),
            sensitive_ports: DEFAULT_SENSITIVE_PORTS.iter().copied().collect(),
            min_replicas: DEFAULT_MIN_REPLICAS,
            environment: None,
        }
    }
}

impl RuleConfig {
    pub fn from_overrides(overrides: &PolicyOverrides, environment: Option<&str>) -> Self {
        let mut cfg = Self {
            environment: environment.map(str::to_string),
            ..Self::default()
        };
        if let Some(tags) = &overrides.required_tags {
            cfg.required_tags = tags.iter().cloned().collect();
        }
        if let Some(classes) = &overrides.allowed_db_classes {
            cfg.allowed_db_classes = classes.clone();
        }
        if let Some(types) = &overrides.allowed_node_types {
            cfg.allowed_node_types = types.clone();
        }
        if let Some(ports) = &overrides.sensitive_ports {
            cfg.sensitive_ports = ports.iter().copied().collect();
        }
        if let Some(min) = overrides.min_replicas {
            cfg.min_replicas = u64::from(min);
        }
        cfg
    }

    /// None when the environment is unknown.
    pub fn prod_like(&self) -> Option<bool> {
        self.environment
            .as_deref()
            .map(|env| matches!(env, "prod" | "production" | "staging"))
    }
}
