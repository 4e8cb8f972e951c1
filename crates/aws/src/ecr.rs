//! ECR module: one repository per configured service, scan-on-push and a
//! lifecycle policy that caps stored image count.

use infractl_core::{EnvConfig, Module, Output};
use serde_json::{json, Value as Json};

use crate::{label, resource_tags};

pub struct Ecr {
    cfg: EnvConfig,
}

impl Ecr {
    pub fn new(cfg: &EnvConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Registry path for a service image, shared with the push pipeline.
    pub fn repository_name(cfg: &EnvConfig, service: &str) -> String {
        format!("{}/{}", cfg.name_prefix(), service)
    }

    fn lifecycle_policy(keep: u32) -> String {
        json!({
            "rules": [{
                "rulePriority": 1,
                "description": format!("keep last {keep} images"),
                "selection": {
                    "tagStatus": "any",
                    "countType": "imageCountMoreThan",
                    "countNumber": keep,
                },
                "action": { "type": "expire" },
            }]
        })
        .to_string()
    }
}

impl Module for Ecr {
    fn name(&self) -> &str {
        "ecr"
    }

    fn resources(&self) -> Json {
        let cfg = &self.cfg;
        let mut doc = json!({ "resource": {} });
        let res = &mut doc["resource"];

        for repo in &cfg.ecr.repositories {
            let id = label(repo);
            res["aws_ecr_repository"][&id] = json!({
                "name": Ecr::repository_name(cfg, repo),
                "image_tag_mutability": "IMMUTABLE",
                "image_scanning_configuration": { "scan_on_push": cfg.ecr.scan_on_push },
                "encryption_configuration": { "encryption_type": "AES256" },
                "tags": resource_tags(cfg, repo),
            });
            res["aws_ecr_lifecycle_policy"][&id] = json!({
                "repository": format!("${{aws_ecr_repository.{id}.name}}"),
                "policy": Ecr::lifecycle_policy(cfg.ecr.keep_images),
            });
        }

        doc
    }

    fn outputs(&self) -> Vec<Output> {
        self.cfg
            .ecr
            .repositories
            .iter()
            .map(|repo| {
                let id = label(repo);
                Output::new(
                    format!("ecr_{id}_url"),
                    format!("${{aws_ecr_repository.{id}.repository_url}}"),
                )
            })
            .collect()
    }
}
