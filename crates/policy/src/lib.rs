//! Policy evaluation over Terraform plan documents and Kubernetes manifests.
//! Rules are independent predicates; the engine aggregates their violations
//! into a sorted, deduplicated report with a pass/warn/deny verdict.

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod report;
pub mod rules;

pub use config::RuleConfig;
pub use engine::{evaluate_manifests, evaluate_plan};
pub use error::{PolicyError, Result};
pub use input::{PlanDoc, ResourceChange};
pub use report::{Report, Severity, Verdict, Violation};
