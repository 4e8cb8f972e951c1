//! Rule sets, grouped the way reviewers think about them: Terraform
//! security, Terraform cost, Kubernetes security, Kubernetes practices.

pub mod k8s_practices;
pub mod k8s_security;
pub mod tf_cost;
pub mod tf_security;

#[cfg(test)]
mod tests;

use infractl_k8s::Manifest;

use crate::config::RuleConfig;
use crate::input::PlanDoc;
use crate::report::Violation;

/// Stable rule identifiers, used in reports and override keys.
pub mod ids {
    pub const RDS_STORAGE_ENCRYPTED: &str = "rds-storage-encrypted";
    pub const RDS_PUBLIC_ACCESS: &str = "rds-public-access";
    pub const SG_OPEN_INGRESS: &str = "sg-open-ingress";
    pub const SG_SENSITIVE_PORT: &str = "sg-sensitive-port";
    pub const S3_ENCRYPTION: &str = "s3-encryption";
    pub const ECR_SCAN_ON_PUSH: &str = "ecr-scan-on-push";
    pub const REQUIRED_TAGS: &str = "required-tags";
    pub const INSTANCE_TYPE: &str = "instance-type";
    pub const RDS_MULTI_AZ_NONPROD: &str = "rds-multi-az-nonprod";
    pub const K8S_RUN_AS_NONROOT: &str = "k8s-run-as-nonroot";
    pub const K8S_PRIVILEGED: &str = "k8s-privileged";
    pub const K8S_LATEST_TAG: &str = "k8s-latest-tag";
    pub const K8S_RESOURCE_LIMITS: &str = "k8s-resource-limits";
    pub const K8S_REQUIRED_LABELS: &str = "k8s-required-labels";
    pub const K8S_MIN_REPLICAS: &str = "k8s-min-replicas";
    pub const K8S_PROBES: &str = "k8s-probes";
}

/// Runs every Terraform rule. Rules never depend on each other; order here
/// is irrelevant to the final report.
pub fn run_plan(plan: &PlanDoc, cfg: &RuleConfig, out: &mut Vec<Violation>) {
    tf_security::storage_encrypted(plan, out);
    tf_security::public_access(plan, out);
    tf_security::open_ingress(plan, out);
    tf_security::sensitive_ports(plan, cfg, out);
    tf_security::s3_encryption(plan, out);
    tf_security::ecr_scan_on_push(plan, out);
    tf_cost::required_tags(plan, cfg, out);
    tf_cost::instance_types(plan, cfg, out);
    tf_cost::multi_az(plan, cfg, out);
}

/// Runs every Kubernetes rule over a manifest set.
pub fn run_manifests(docs: &[Manifest], cfg: &RuleConfig, out: &mut Vec<Violation>) {
    for doc in docs {
        k8s_security::run_as_nonroot(doc, out);
        k8s_security::privileged(doc, out);
        k8s_security::latest_tag(doc, out);
        k8s_security::resource_limits(doc, out);
        k8s_practices::required_labels(doc, out);
        k8s_practices::min_replicas(doc, cfg, out);
        k8s_practices::probes(doc, out);
    }
}

/// Report address for a manifest, `Kind/name`.
pub(crate) fn manifest_address(doc: &Manifest) -> String {
    format!("{}/{}", doc.kind, doc.name)
}
