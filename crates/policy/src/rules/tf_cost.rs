//! Terraform cost and hygiene rules. All of them warn.

use std::collections::BTreeSet;

use crate::config::RuleConfig;
use crate::input::PlanDoc;
use crate::report::Violation;
use crate::rules::ids;

/// A resource is taggable when its planned state carries a `tags`
/// attribute, set or not; completeness is intersection-count equality
/// against the required set.
pub fn required_tags(plan: &PlanDoc, cfg: &RuleConfig, out: &mut Vec<Violation>) {
    for rc in &plan.resource_changes {
        let Some(after) = rc.after() else {
            continue;
        };
        let Some(tags_value) = after.get("tags") else {
            continue;
        };
        let present: BTreeSet<&str> = tags_value
            .as_object()
            .map(|tags| tags.keys().map(String::as_str).collect())
            .unwrap_or_default();
        let found = cfg.required_tags.iter().filter(|t| present.contains(t.as_str())).count();
        if found != cfg.required_tags.len() {
            let missing: Vec<&str> = cfg
                .required_tags
                .iter()
                .filter(|t| !present.contains(t.as_str()))
                .map(String::as_str)
                .collect();
            out.push(Violation::warn(
                ids::REQUIRED_TAGS,
                &rc.address,
                format!("missing required tags: {}", missing.join(", ")),
            ));
        }
    }
}

pub fn instance_types(plan: &PlanDoc, cfg: &RuleConfig, out: &mut Vec<Violation>) {
    for (rc, after) in plan.typed("aws_db_instance") {
        if let Some(class) = after["instance_class"].as_str() {
            if !cfg.allowed_db_classes.iter().any(|p| class.starts_with(p.as_str())) {
                out.push(Violation::warn(
                    ids::INSTANCE_TYPE,
                    &rc.address,
                    format!("instance class '{class}' is outside the approved families"),
                ));
            }
        }
    }
    for (rc, after) in plan.typed("aws_eks_node_group") {
        let Some(types) = after["instance_types"].as_array() else {
            continue;
        };
        for ty in types.iter().filter_map(|t| t.as_str()) {
            if !cfg.allowed_node_types.iter().any(|p| ty.starts_with(p.as_str())) {
                out.push(Violation::warn(
                    ids::INSTANCE_TYPE,
                    &rc.address,
                    format!("node instance type '{ty}' is outside the approved families"),
                ));
            }
        }
    }
}

/// Multi-AZ doubles the instance bill; flag it anywhere that is not
/// production-grade. Skipped when the environment is unknown.
pub fn multi_az(plan: &PlanDoc, cfg: &RuleConfig, out: &mut Vec<Violation>) {
    match cfg.prod_like() {
        Some(false) => {}
        _ => return,
    }
    for (rc, after) in plan.typed("aws_db_instance") {
        if after["multi_az"].as_bool() == Some(true) {
            out.push(Violation::warn(
                ids::RDS_MULTI_AZ_NONPROD,
                &rc.address,
                format!("RDS instance '{}' runs multi-AZ outside production", rc.name),
            ));
        }
    }
}
