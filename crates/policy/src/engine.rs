//! Evaluation entry points. Pure: same input, same report.

use infractl_k8s::Manifest;

use crate::config::RuleConfig;
use crate::input::PlanDoc;
use crate::report::Report;
use crate::rules;

pub fn evaluate_plan(plan: &PlanDoc, cfg: &RuleConfig) -> Report {
    let mut violations = Vec::new();
    rules::run_plan(plan, cfg, &mut violations);
    Report::from_violations(violations)
}

pub fn evaluate_manifests(docs: &[Manifest], cfg: &RuleConfig) -> Report {
    let mut violations = Vec::new();
    rules::run_manifests(docs, cfg, &mut violations);
    Report::from_violations(violations)
}
