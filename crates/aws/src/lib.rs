//! AWS resource builders. Each submodule contributes one stack module that
//! renders a tf.json fragment for the target environment.

use infractl_core::{EnvConfig, StackError};
use serde_json::{json, Value as Json};
use thiserror::Error;

pub mod cidr;
pub mod doc;
pub mod ecr;
pub mod eks;
pub mod rds;
pub mod secrets;
pub mod vpc;

pub use doc::{base_document, render_stack};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid VPC CIDR '{cidr}': {reason}")]
    Cidr { cidr: String, reason: String },
    #[error(transparent)]
    Stack(#[from] StackError),
}

/// Full tag map for a resource. Standard tags win over config extras so the
/// tagging policy always sees Environment, Project and ManagedBy.
pub(crate) fn resource_tags(cfg: &EnvConfig, name: &str) -> Json {
    let mut tags = serde_json::Map::new();
    for (k, v) in &cfg.tags {
        tags.insert(k.clone(), json!(v));
    }
    tags.insert("Name".to_string(), json!(format!("{}-{}", cfg.name_prefix(), name)));
    tags.insert("Environment".to_string(), json!(cfg.environment));
    tags.insert("Project".to_string(), json!(cfg.project));
    tags.insert("ManagedBy".to_string(), json!("terraform"));
    Json::Object(tags)
}

/// Terraform labels only allow [a-zA-Z0-9_-]; repo names use dashes.
pub(crate) fn label(name: &str) -> String {
    name.replace('-', "_")
}
