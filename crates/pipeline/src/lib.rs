//! Deployment pipelines: the infrastructure path (render, plan, policy,
//! apply) and the application path (build, scan, push, deploy). Every
//! external tool is discovered on PATH and driven over stdio.

pub mod app;
pub mod docker;
pub mod helm;
pub mod infra;
pub mod kubectl;
pub mod registry;
pub mod scan;
pub mod ui;

pub use app::{deploy, DeployOptions};
pub use infra::{apply, destroy, init, plan, render, InfraOptions, PlanOutcome};
