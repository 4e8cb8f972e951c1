//! Terraform security rules. All of them deny.

use std::collections::BTreeSet;

use serde_json::Value as Json;

use crate::config::RuleConfig;
use crate::input::PlanDoc;
use crate::report::Violation;
use crate::rules::ids;

pub fn storage_encrypted(plan: &PlanDoc, out: &mut Vec<Violation>) {
    for (rc, after) in plan.typed("aws_db_instance") {
        if after["storage_encrypted"].as_bool() != Some(true) {
            out.push(Violation::deny(
                ids::RDS_STORAGE_ENCRYPTED,
                &rc.address,
                format!("RDS instance '{}' must have storage encryption enabled", rc.name),
            ));
        }
    }
}

pub fn public_access(plan: &PlanDoc, out: &mut Vec<Violation>) {
    for (rc, after) in plan.typed("aws_db_instance") {
        if after["publicly_accessible"].as_bool() == Some(true) {
            out.push(Violation::deny(
                ids::RDS_PUBLIC_ACCESS,
                &rc.address,
                format!("RDS instance '{}' must not be publicly accessible", rc.name),
            ));
        }
    }
}

/// One ingress rule, whatever resource shape declared it.
struct Ingress {
    address: String,
    from_port: Option<i64>,
    to_port: Option<i64>,
    protocol: String,
    open_to_world: bool,
}

fn block_ingress(address: &str, block: &Json) -> Ingress {
    let open = block["cidr_blocks"]
        .as_array()
        .is_some_and(|c| c.iter().any(|v| v == "0.0.0.0/0"))
        || block["ipv6_cidr_blocks"]
            .as_array()
            .is_some_and(|c| c.iter().any(|v| v == "::/0"));
    Ingress {
        address: address.to_string(),
        from_port: block["from_port"].as_i64(),
        to_port: block["to_port"].as_i64(),
        protocol: block["protocol"].as_str().unwrap_or_default().to_string(),
        open_to_world: open,
    }
}

/// Ingress comes in three shapes: inline blocks on `aws_security_group`,
/// the legacy `aws_security_group_rule`, and the current
/// `aws_vpc_security_group_ingress_rule`.
fn collect_ingress(plan: &PlanDoc) -> Vec<Ingress> {
    let mut rules = Vec::new();
    for (rc, after) in plan.typed("aws_security_group") {
        if let Some(blocks) = after["ingress"].as_array() {
            for block in blocks {
                rules.push(block_ingress(&rc.address, block));
            }
        }
    }
    for (rc, after) in plan.typed("aws_security_group_rule") {
        if after["type"].as_str() == Some("ingress") {
            rules.push(block_ingress(&rc.address, after));
        }
    }
    for (rc, after) in plan.typed("aws_vpc_security_group_ingress_rule") {
        let open = after["cidr_ipv4"].as_str() == Some("0.0.0.0/0")
            || after["cidr_ipv6"].as_str() == Some("::/0");
        rules.push(Ingress {
            address: rc.address.clone(),
            from_port: after["from_port"].as_i64(),
            to_port: after["to_port"].as_i64(),
            protocol: after["ip_protocol"].as_str().unwrap_or_default().to_string(),
            open_to_world: open,
        });
    }
    rules
}

pub fn open_ingress(plan: &PlanDoc, out: &mut Vec<Violation>) {
    for rule in collect_ingress(plan) {
        if !rule.open_to_world {
            continue;
        }
        let all_ports =
            rule.protocol == "-1" || (rule.from_port == Some(0) && rule.to_port == Some(0));
        if all_ports {
            out.push(Violation::deny(
                ids::SG_OPEN_INGRESS,
                &rule.address,
                "security group allows unrestricted ingress from 0.0.0.0/0",
            ));
        }
    }
}

pub fn sensitive_ports(plan: &PlanDoc, cfg: &RuleConfig, out: &mut Vec<Violation>) {
    for rule in collect_ingress(plan) {
        if !rule.open_to_world {
            continue;
        }
        let (Some(from), Some(to)) = (rule.from_port, rule.to_port) else {
            continue;
        };
        for &port in &cfg.sensitive_ports {
            if (from..=to).contains(&i64::from(port)) {
                out.push(Violation::deny(
                    ids::SG_SENSITIVE_PORT,
                    &rule.address,
                    format!("sensitive port {port} is open to 0.0.0.0/0"),
                ));
            }
        }
    }
}

pub fn s3_encryption(plan: &PlanDoc, out: &mut Vec<Violation>) {
    // Provider 4+ moved SSE to its own resource; either form satisfies, but
    // a paired config only covers the bucket it names.
    let mut paired: BTreeSet<&str> = BTreeSet::new();
    // A config whose bucket is resolved only after apply could belong to
    // any bucket in the plan.
    let mut paired_unknown = false;
    for (_, after) in plan.typed("aws_s3_bucket_server_side_encryption_configuration") {
        match after["bucket"].as_str() {
            Some(bucket) => {
                paired.insert(bucket);
            }
            None => paired_unknown = true,
        }
    }
    for (rc, after) in plan.typed("aws_s3_bucket") {
        let inline = &after["server_side_encryption_configuration"];
        let has_inline =
            inline.is_object() || inline.as_array().is_some_and(|list| !list.is_empty());
        let has_paired = paired_unknown
            || after["bucket"].as_str().is_some_and(|name| paired.contains(name));
        if !has_inline && !has_paired {
            out.push(Violation::deny(
                ids::S3_ENCRYPTION,
                &rc.address,
                format!("S3 bucket '{}' has no server-side encryption configured", rc.name),
            ));
        }
    }
}

pub fn ecr_scan_on_push(plan: &PlanDoc, out: &mut Vec<Violation>) {
    for (rc, after) in plan.typed("aws_ecr_repository") {
        let scan = &after["image_scanning_configuration"];
        let enabled = scan["scan_on_push"].as_bool() == Some(true)
            || scan
                .as_array()
                .is_some_and(|list| list.iter().any(|e| e["scan_on_push"].as_bool() == Some(true)));
        if !enabled {
            out.push(Violation::deny(
                ids::ECR_SCAN_ON_PUSH,
                &rc.address,
                format!("ECR repository '{}' must scan images on push", rc.name),
            ));
        }
    }
}
