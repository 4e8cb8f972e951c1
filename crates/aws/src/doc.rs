//! Top-level tf.json assembly: provider and backend blocks plus every stack
//! module, merged in dependency order.

use infractl_core::{EnvConfig, Stack};
use serde_json::{json, Value as Json};

use crate::ecr::Ecr;
use crate::eks::Eks;
use crate::rds::Rds;
use crate::secrets::DbSecret;
use crate::vpc::Vpc;
use crate::RenderError;

/// Terraform settings, S3 backend and AWS provider for the environment.
pub fn base_document(cfg: &EnvConfig) -> Json {
    json!({
        "terraform": {
            "required_version": ">= 1.5.0",
            "required_providers": {
                "aws": { "source": "hashicorp/aws", "version": "~> 5.0" },
                "random": { "source": "hashicorp/random", "version": "~> 3.6" },
            },
            "backend": {
                "s3": {
                    "bucket": cfg.state.bucket,
                    "key": format!("{}/{}/terraform.tfstate", cfg.state.key_prefix, cfg.environment),
                    "region": cfg.region,
                    "dynamodb_table": cfg.state.dynamodb_table,
                    "encrypt": true,
                }
            },
        },
        "provider": {
            "aws": { "region": cfg.region }
        },
    })
}

/// The complete main.tf.json document for an environment.
pub fn render_stack(cfg: &EnvConfig) -> Result<Json, RenderError> {
    let mut stack = Stack::new();
    stack.add(Box::new(Vpc::new(cfg)?));
    stack.add(Box::new(Eks::new(cfg)));
    if !cfg.ecr.repositories.is_empty() {
        stack.add(Box::new(Ecr::new(cfg)));
    }
    stack.add(Box::new(Rds::new(cfg)));
    stack.add(Box::new(DbSecret::new(cfg)));
    Ok(stack.compose(base_document(cfg))?)
}
