//! Secrets Manager module: stores the generated database credentials as a
//! JSON document applications read at startup.

use std::collections::BTreeSet;

use infractl_core::{EnvConfig, Module, Output};
use serde_json::{json, Value as Json};

use crate::rds::POSTGRES_PORT;
use crate::resource_tags;

pub struct DbSecret {
    cfg: EnvConfig,
}

impl DbSecret {
    pub fn new(cfg: &EnvConfig) -> Self {
        Self { cfg: cfg.clone() }
    }
}

impl Module for DbSecret {
    fn name(&self) -> &str {
        "secrets"
    }

    fn deps(&self) -> BTreeSet<String> {
        ["rds".to_string()].into()
    }

    fn resources(&self) -> Json {
        let cfg = &self.cfg;
        let prefix = cfg.name_prefix();
        let recovery_days = if cfg.is_prod_like() { 7 } else { 0 };

        // jsonencode runs at apply time so the secret picks up the live
        // endpoint and generated password.
        let secret_string = format!(
            "${{jsonencode({{ host = aws_db_instance.postgres.address, port = {}, \
             dbname = \"{}\", username = \"{}\", password = random_password.db_master.result }})}}",
            POSTGRES_PORT, cfg.rds.db_name, cfg.rds.username
        );

        json!({
            "resource": {
                "aws_secretsmanager_secret": {
                    "db_credentials": {
                        "name": format!("{prefix}/db-credentials"),
                        "description": "database connection info",
                        "recovery_window_in_days": recovery_days,
                        "tags": resource_tags(cfg, "db-credentials"),
                    }
                },
                "aws_secretsmanager_secret_version": {
                    "db_credentials": {
                        "secret_id": "${aws_secretsmanager_secret.db_credentials.id}",
                        "secret_string": secret_string,
                    }
                },
            }
        })
    }

    fn outputs(&self) -> Vec<Output> {
        vec![Output::new("db_secret_arn", "${aws_secretsmanager_secret.db_credentials.arn}")
            .describe("ARN of the database credentials secret")]
    }
}
