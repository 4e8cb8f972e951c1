//! RDS module: a PostgreSQL instance in the private subnets, reachable only
//! from the EKS node security group. The master password is generated in
//! Terraform and never appears in configuration.

use std::collections::BTreeSet;

use infractl_core::{EnvConfig, Module, Output};
use serde_json::{json, Value as Json};

use crate::resource_tags;
use crate::vpc::Vpc;

pub const POSTGRES_PORT: u16 = 5432;

pub struct Rds {
    cfg: EnvConfig,
}

impl Rds {
    pub fn new(cfg: &EnvConfig) -> Self {
        Self { cfg: cfg.clone() }
    }
}

impl Module for Rds {
    fn name(&self) -> &str {
        "rds"
    }

    fn deps(&self) -> BTreeSet<String> {
        ["vpc".to_string(), "eks".to_string()].into()
    }

    fn resources(&self) -> Json {
        let cfg = &self.cfg;
        let prefix = cfg.name_prefix();
        let prod_like = cfg.is_prod_like();
        let backup_days = if prod_like { 7 } else { 1 };

        let mut db = json!({
            "identifier": format!("{prefix}-postgres"),
            "engine": "postgres",
            "engine_version": cfg.rds.engine_version,
            "instance_class": cfg.rds.instance_class,
            "allocated_storage": cfg.rds.allocated_storage,
            "db_name": cfg.rds.db_name,
            "username": cfg.rds.username,
            "password": "${random_password.db_master.result}",
            "port": POSTGRES_PORT,
            "storage_encrypted": true,
            "publicly_accessible": false,
            "multi_az": cfg.rds.multi_az,
            "deletion_protection": cfg.rds.deletion_protection,
            "db_subnet_group_name": "${aws_db_subnet_group.main.name}",
            "vpc_security_group_ids": ["${aws_security_group.rds.id}"],
            "backup_retention_period": backup_days,
            "skip_final_snapshot": !prod_like,
            "tags": resource_tags(cfg, "postgres"),
        });
        if prod_like {
            db["final_snapshot_identifier"] = json!(format!("{prefix}-postgres-final"));
        }

        json!({
            "resource": {
                "aws_db_subnet_group": {
                    "main": {
                        "name": format!("{prefix}-db-subnets"),
                        "subnet_ids": Vpc::private_subnet_refs(cfg.vpc.az_count),
                        "tags": resource_tags(cfg, "db-subnets"),
                    }
                },
                "aws_security_group": {
                    "rds": {
                        "name": format!("{prefix}-rds"),
                        "description": "database access from cluster nodes",
                        "vpc_id": "${aws_vpc.main.id}",
                        "tags": resource_tags(cfg, "rds-sg"),
                    }
                },
                "aws_vpc_security_group_ingress_rule": {
                    "rds_from_nodes": {
                        "security_group_id": "${aws_security_group.rds.id}",
                        "referenced_security_group_id": "${aws_security_group.eks_nodes.id}",
                        "from_port": POSTGRES_PORT,
                        "to_port": POSTGRES_PORT,
                        "ip_protocol": "tcp",
                        "description": "postgres from eks nodes",
                    }
                },
                "random_password": {
                    "db_master": {
                        "length": 32,
                        "special": true,
                        "override_special": "!#$%&*()-_=+[]{}<>:?",
                    }
                },
                "aws_db_instance": { "postgres": db },
            }
        })
    }

    fn outputs(&self) -> Vec<Output> {
        vec![
            Output::new("db_endpoint", "${aws_db_instance.postgres.endpoint}").describe("host:port for the database"),
            Output::new("db_address", "${aws_db_instance.postgres.address}"),
        ]
    }
}
