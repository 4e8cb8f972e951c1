use serde_json::{json, Value as Json};

use infractl_k8s::{parse_docs, Manifest};

use crate::config::RuleConfig;
use crate::engine::{evaluate_manifests, evaluate_plan};
use crate::input::{Change, PlanDoc, ResourceChange};
use crate::report::{Severity, Verdict};
use crate::rules::ids;

fn change(ty: &str, name: &str, after: Json) -> ResourceChange {
    ResourceChange {
        address: format!("{ty}.{name}"),
        resource_type: ty.to_string(),
        name: name.to_string(),
        mode: "managed".to_string(),
        change: Change { actions: vec!["create".to_string()], after },
    }
}

fn plan(changes: Vec<ResourceChange>) -> PlanDoc {
    PlanDoc { resource_changes: changes }
}

fn manifests(yaml: &str) -> Vec<Manifest> {
    parse_docs(yaml).expect("test manifest parses")
}

fn rules_fired(plan_doc: &PlanDoc) -> Vec<String> {
    evaluate_plan(plan_doc, &RuleConfig::default())
        .violations
        .into_iter()
        .map(|v| v.rule)
        .collect()
}

// ---------------------------------------------------------------------------
// Terraform security
// ---------------------------------------------------------------------------

#[test]
fn unencrypted_db_instance_is_denied() {
    let tagged = json!({"Environment": "dev", "Project": "p", "ManagedBy": "terraform"});
    let p = plan(vec![change(
        "aws_db_instance",
        "postgres",
        json!({"storage_encrypted": false, "publicly_accessible": false, "tags": tagged}),
    )]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    assert_eq!(report.verdict(), Verdict::Deny);
    let v = &report.violations[0];
    assert_eq!(v.rule, ids::RDS_STORAGE_ENCRYPTED);
    assert_eq!(v.address, "aws_db_instance.postgres");
    assert!(v.message.contains("storage encryption"));
}

#[test]
fn unset_encryption_counts_as_unencrypted() {
    let p = plan(vec![change("aws_db_instance", "postgres", json!({"instance_class": "db.t3.micro"}))]);
    assert!(rules_fired(&p).contains(&ids::RDS_STORAGE_ENCRYPTED.to_string()));
}

#[test]
fn encrypted_private_db_instance_passes_security_rules() {
    let p = plan(vec![change(
        "aws_db_instance",
        "postgres",
        json!({"storage_encrypted": true, "publicly_accessible": false}),
    )]);
    let fired = rules_fired(&p);
    assert!(!fired.contains(&ids::RDS_STORAGE_ENCRYPTED.to_string()));
    assert!(!fired.contains(&ids::RDS_PUBLIC_ACCESS.to_string()));
}

#[test]
fn public_db_instance_is_denied() {
    let p = plan(vec![change(
        "aws_db_instance",
        "postgres",
        json!({"storage_encrypted": true, "publicly_accessible": true}),
    )]);
    assert!(rules_fired(&p).contains(&ids::RDS_PUBLIC_ACCESS.to_string()));
}

#[test]
fn deleted_db_instance_is_not_evaluated() {
    let mut rc = change("aws_db_instance", "old", Json::Null);
    rc.change.actions = vec!["delete".to_string()];
    let report = evaluate_plan(&plan(vec![rc]), &RuleConfig::default());
    assert_eq!(report.verdict(), Verdict::Pass);
}

#[test]
fn open_ingress_fires_on_inline_full_port_range() {
    let p = plan(vec![change(
        "aws_security_group",
        "web",
        json!({
            "ingress": [
                {"from_port": 0, "to_port": 0, "protocol": "tcp", "cidr_blocks": ["0.0.0.0/0"]}
            ]
        }),
    )]);
    assert!(rules_fired(&p).contains(&ids::SG_OPEN_INGRESS.to_string()));
}

#[test]
fn open_ingress_fires_on_all_protocols() {
    let p = plan(vec![change(
        "aws_security_group_rule",
        "all",
        json!({"type": "ingress", "from_port": 0, "to_port": 65535, "protocol": "-1", "cidr_blocks": ["0.0.0.0/0"]}),
    )]);
    assert!(rules_fired(&p).contains(&ids::SG_OPEN_INGRESS.to_string()));
}

#[test]
fn open_ingress_fires_on_modern_rule_resources() {
    let p = plan(vec![change(
        "aws_vpc_security_group_ingress_rule",
        "all",
        json!({"cidr_ipv4": "0.0.0.0/0", "ip_protocol": "-1"}),
    )]);
    assert!(rules_fired(&p).contains(&ids::SG_OPEN_INGRESS.to_string()));
}

#[test]
fn open_ingress_fires_on_ipv6_everywhere() {
    let p = plan(vec![change(
        "aws_security_group",
        "web",
        json!({"ingress": [{"from_port": 0, "to_port": 0, "protocol": "tcp", "ipv6_cidr_blocks": ["::/0"]}]}),
    )]);
    assert!(rules_fired(&p).contains(&ids::SG_OPEN_INGRESS.to_string()));
}

#[test]
fn scoped_ingress_does_not_trip_open_rule() {
    let p = plan(vec![change(
        "aws_security_group",
        "web",
        json!({"ingress": [{"from_port": 443, "to_port": 443, "protocol": "tcp", "cidr_blocks": ["10.0.0.0/8"]}]}),
    )]);
    let fired = rules_fired(&p);
    assert!(!fired.contains(&ids::SG_OPEN_INGRESS.to_string()));
    assert!(!fired.contains(&ids::SG_SENSITIVE_PORT.to_string()));
}

#[test]
fn ssh_open_to_world_is_denied() {
    let p = plan(vec![change(
        "aws_security_group_rule",
        "ssh",
        json!({"type": "ingress", "from_port": 22, "to_port": 22, "protocol": "tcp", "cidr_blocks": ["0.0.0.0/0"]}),
    )]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    let sensitive: Vec<_> =
        report.violations.iter().filter(|v| v.rule == ids::SG_SENSITIVE_PORT).collect();
    assert_eq!(sensitive.len(), 1);
    assert!(sensitive[0].message.contains("22"));
}

#[test]
fn wide_port_range_reports_every_sensitive_port_it_covers() {
    let p = plan(vec![change(
        "aws_security_group_rule",
        "wide",
        json!({"type": "ingress", "from_port": 1, "to_port": 4000, "protocol": "tcp", "cidr_blocks": ["0.0.0.0/0"]}),
    )]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    // 22, 3306 and 3389 fall inside 1..=4000
    assert_eq!(report.violations.iter().filter(|v| v.rule == ids::SG_SENSITIVE_PORT).count(), 3);
}

#[test]
fn sensitive_port_from_private_cidr_is_fine() {
    let p = plan(vec![change(
        "aws_security_group_rule",
        "ssh",
        json!({"type": "ingress", "from_port": 22, "to_port": 22, "protocol": "tcp", "cidr_blocks": ["10.0.0.0/16"]}),
    )]);
    assert!(!rules_fired(&p).contains(&ids::SG_SENSITIVE_PORT.to_string()));
}

#[test]
fn bucket_without_encryption_is_denied() {
    let p = plan(vec![change("aws_s3_bucket", "logs", json!({"bucket": "logs"}))]);
    assert!(rules_fired(&p).contains(&ids::S3_ENCRYPTION.to_string()));
}

#[test]
fn paired_encryption_resource_satisfies_bucket_rule() {
    let p = plan(vec![
        change("aws_s3_bucket", "logs", json!({"bucket": "logs"})),
        change(
            "aws_s3_bucket_server_side_encryption_configuration",
            "logs",
            json!({"rule": [{"apply_server_side_encryption_by_default": [{"sse_algorithm": "AES256"}]}]}),
        ),
    ]);
    assert!(!rules_fired(&p).contains(&ids::S3_ENCRYPTION.to_string()));
}

#[test]
fn paired_encryption_covers_only_the_bucket_it_names() {
    let p = plan(vec![
        change("aws_s3_bucket", "a", json!({"bucket": "bucket-a"})),
        change(
            "aws_s3_bucket_server_side_encryption_configuration",
            "a",
            json!({
                "bucket": "bucket-a",
                "rule": [{"apply_server_side_encryption_by_default": [{"sse_algorithm": "AES256"}]}]
            }),
        ),
        change("aws_s3_bucket", "b", json!({"bucket": "bucket-b"})),
    ]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    let denied: Vec<&str> = report
        .violations
        .iter()
        .filter(|v| v.rule == ids::S3_ENCRYPTION)
        .map(|v| v.address.as_str())
        .collect();
    assert_eq!(denied, vec!["aws_s3_bucket.b"]);
}

#[test]
fn inline_bucket_encryption_satisfies_rule() {
    let p = plan(vec![change(
        "aws_s3_bucket",
        "logs",
        json!({
            "bucket": "logs",
            "server_side_encryption_configuration": [
                {"rule": [{"apply_server_side_encryption_by_default": [{"sse_algorithm": "AES256"}]}]}
            ]
        }),
    )]);
    assert!(!rules_fired(&p).contains(&ids::S3_ENCRYPTION.to_string()));
}

#[test]
fn ecr_repository_must_scan_on_push() {
    let p = plan(vec![change(
        "aws_ecr_repository",
        "api",
        json!({"image_scanning_configuration": [{"scan_on_push": false}]}),
    )]);
    assert!(rules_fired(&p).contains(&ids::ECR_SCAN_ON_PUSH.to_string()));

    let ok = plan(vec![change(
        "aws_ecr_repository",
        "api",
        json!({"image_scanning_configuration": [{"scan_on_push": true}]}),
    )]);
    assert!(!rules_fired(&ok).contains(&ids::ECR_SCAN_ON_PUSH.to_string()));
}

#[test]
fn ecr_scanning_block_as_object_is_accepted() {
    let ok = plan(vec![change(
        "aws_ecr_repository",
        "api",
        json!({"image_scanning_configuration": {"scan_on_push": true}}),
    )]);
    assert!(!rules_fired(&ok).contains(&ids::ECR_SCAN_ON_PUSH.to_string()));
}

// ---------------------------------------------------------------------------
// Terraform cost
// ---------------------------------------------------------------------------

#[test]
fn missing_required_tags_warn_and_name_the_gaps() {
    let p = plan(vec![change(
        "aws_vpc",
        "main",
        json!({"cidr_block": "10.0.0.0/16", "tags": {"Environment": "dev"}}),
    )]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    let v = report
        .violations
        .iter()
        .find(|v| v.rule == ids::REQUIRED_TAGS)
        .expect("tag warning");
    assert_eq!(v.severity, Severity::Warn);
    assert!(v.message.contains("ManagedBy"));
    assert!(v.message.contains("Project"));
    assert!(!v.message.contains("Environment"));
}

#[test]
fn complete_tags_satisfy_the_rule() {
    let p = plan(vec![change(
        "aws_vpc",
        "main",
        json!({"tags": {"Environment": "dev", "Project": "p", "ManagedBy": "terraform", "Extra": "x"}}),
    )]);
    assert!(!rules_fired(&p).contains(&ids::REQUIRED_TAGS.to_string()));
}

#[test]
fn untaggable_resources_are_skipped_by_tag_rule() {
    let p = plan(vec![change(
        "aws_route",
        "default",
        json!({"route_table_id": "rtb-1", "destination_cidr_block": "0.0.0.0/0"}),
    )]);
    assert!(!rules_fired(&p).contains(&ids::REQUIRED_TAGS.to_string()));
}

#[test]
fn null_tags_on_taggable_resource_warn() {
    let p = plan(vec![change("aws_vpc", "main", json!({"tags": null}))]);
    assert!(rules_fired(&p).contains(&ids::REQUIRED_TAGS.to_string()));
}

#[test]
fn oversized_instance_classes_warn() {
    let p = plan(vec![
        change("aws_db_instance", "big", json!({"storage_encrypted": true, "instance_class": "db.r5.large"})),
        change("aws_eks_node_group", "default", json!({"instance_types": ["c5.2xlarge", "t3.medium"]})),
    ]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    let types: Vec<_> = report.violations.iter().filter(|v| v.rule == ids::INSTANCE_TYPE).collect();
    assert_eq!(types.len(), 2);
    assert!(types.iter().any(|v| v.message.contains("db.r5.large")));
    assert!(types.iter().any(|v| v.message.contains("c5.2xlarge")));
}

#[test]
fn approved_families_pass_the_type_rule() {
    let p = plan(vec![
        change("aws_db_instance", "db", json!({"storage_encrypted": true, "instance_class": "db.t4g.small"})),
        change("aws_eks_node_group", "default", json!({"instance_types": ["m5.large"]})),
    ]);
    assert!(!rules_fired(&p).contains(&ids::INSTANCE_TYPE.to_string()));
}

#[test]
fn multi_az_warns_only_outside_prod() {
    let db = || change("aws_db_instance", "pg", json!({"storage_encrypted": true, "multi_az": true}));

    let dev = RuleConfig { environment: Some("dev".to_string()), ..RuleConfig::default() };
    let report = evaluate_plan(&plan(vec![db()]), &dev);
    assert!(report.violations.iter().any(|v| v.rule == ids::RDS_MULTI_AZ_NONPROD));

    let prod = RuleConfig { environment: Some("prod".to_string()), ..RuleConfig::default() };
    let report = evaluate_plan(&plan(vec![db()]), &prod);
    assert!(!report.violations.iter().any(|v| v.rule == ids::RDS_MULTI_AZ_NONPROD));

    // unknown environment: rule stays quiet
    let report = evaluate_plan(&plan(vec![db()]), &RuleConfig::default());
    assert!(!report.violations.iter().any(|v| v.rule == ids::RDS_MULTI_AZ_NONPROD));
}

// ---------------------------------------------------------------------------
// Kubernetes security
// ---------------------------------------------------------------------------

const COMPLIANT_DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
  labels: { app: api }
spec:
  replicas: 2
  template:
    spec:
      containers:
        - name: api
          image: registry.example.com/api:1.2.3
          securityContext: { runAsNonRoot: true }
          resources:
            limits: { cpu: 500m, memory: 256Mi }
          livenessProbe: { httpGet: { path: /health, port: 8080 } }
          readinessProbe: { httpGet: { path: /ready, port: 8080 } }
"#;

#[test]
fn compliant_deployment_passes_everything() {
    let report = evaluate_manifests(&manifests(COMPLIANT_DEPLOYMENT), &RuleConfig::default());
    assert_eq!(report.verdict(), Verdict::Pass, "unexpected: {:?}", report.violations);
}

#[test]
fn container_without_nonroot_is_denied_by_name() {
    let yaml = r#"
kind: Deployment
metadata: { name: api, labels: { app: api } }
spec:
  replicas: 2
  template:
    spec:
      containers:
        - name: web
          image: registry.example.com/api:1.2.3
          resources: { limits: { cpu: 500m, memory: 256Mi } }
          livenessProbe: { tcpSocket: { port: 80 } }
          readinessProbe: { tcpSocket: { port: 80 } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    let v = report
        .violations
        .iter()
        .find(|v| v.rule == ids::K8S_RUN_AS_NONROOT)
        .expect("nonroot violation");
    assert!(v.message.contains("'web'"));
    assert_eq!(v.address, "Deployment/api");
}

#[test]
fn pod_level_nonroot_covers_all_containers() {
    let yaml = r#"
kind: Deployment
metadata: { name: api, labels: { app: api } }
spec:
  replicas: 2
  template:
    spec:
      securityContext: { runAsNonRoot: true }
      containers:
        - name: a
          image: r/a:1
          resources: { limits: { cpu: 1, memory: 1Gi } }
          livenessProbe: { tcpSocket: { port: 80 } }
          readinessProbe: { tcpSocket: { port: 80 } }
        - name: b
          image: r/b:1
          resources: { limits: { cpu: 1, memory: 1Gi } }
          livenessProbe: { tcpSocket: { port: 80 } }
          readinessProbe: { tcpSocket: { port: 80 } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(!report.violations.iter().any(|v| v.rule == ids::K8S_RUN_AS_NONROOT));
}

#[test]
fn container_false_overrides_pod_level_nonroot() {
    let yaml = r#"
kind: Deployment
metadata: { name: api }
spec:
  template:
    spec:
      securityContext: { runAsNonRoot: true }
      containers:
        - name: root-tool
          image: r/t:1
          securityContext: { runAsNonRoot: false }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(report
        .violations
        .iter()
        .any(|v| v.rule == ids::K8S_RUN_AS_NONROOT && v.message.contains("root-tool")));
}

#[test]
fn privileged_container_is_denied() {
    let yaml = r#"
kind: DaemonSet
metadata: { name: agent, labels: { app: agent } }
spec:
  template:
    spec:
      containers:
        - name: agent
          image: r/agent:2.0
          securityContext: { privileged: true, runAsNonRoot: true }
          resources: { limits: { cpu: 1, memory: 1Gi } }
          livenessProbe: { tcpSocket: { port: 80 } }
          readinessProbe: { tcpSocket: { port: 80 } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    let fired: Vec<_> = report.violations.iter().map(|v| v.rule.as_str()).collect();
    assert!(fired.contains(&ids::K8S_PRIVILEGED));
}

#[test]
fn latest_and_untagged_images_are_denied() {
    let yaml = r#"
kind: Deployment
metadata: { name: api }
spec:
  template:
    spec:
      containers:
        - name: a
          image: nginx:latest
        - name: b
          image: nginx
        - name: c
          image: registry:5000/app
        - name: pinned
          image: app@sha256:deadbeef
        - name: tagged
          image: nginx:1.25
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    let latest: Vec<_> =
        report.violations.iter().filter(|v| v.rule == ids::K8S_LATEST_TAG).collect();
    assert_eq!(latest.len(), 3);
    assert!(latest.iter().any(|v| v.message.contains("'a'")));
    assert!(latest.iter().any(|v| v.message.contains("'b'")));
    assert!(latest.iter().any(|v| v.message.contains("'c'")));
}

#[test]
fn partial_resource_limits_are_denied() {
    let yaml = r#"
kind: Deployment
metadata: { name: api }
spec:
  template:
    spec:
      containers:
        - name: cpu-only
          image: r/a:1
          resources: { limits: { cpu: 500m } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(report
        .violations
        .iter()
        .any(|v| v.rule == ids::K8S_RESOURCE_LIMITS && v.message.contains("cpu-only")));
}

#[test]
fn init_containers_are_checked_for_security() {
    let yaml = r#"
kind: Deployment
metadata: { name: api }
spec:
  template:
    spec:
      initContainers:
        - name: setup
          image: busybox:latest
      containers: []
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(report.violations.iter().any(|v| v.rule == ids::K8S_LATEST_TAG));
    assert!(report.violations.iter().any(|v| v.rule == ids::K8S_RUN_AS_NONROOT));
}

// ---------------------------------------------------------------------------
// Kubernetes practices
// ---------------------------------------------------------------------------

#[test]
fn workload_without_app_label_is_denied() {
    let yaml = r#"
kind: Deployment
metadata:
  name: api
  labels: { team: platform }
spec:
  template: { spec: { containers: [] } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(report.violations.iter().any(|v| v.rule == ids::K8S_REQUIRED_LABELS));
}

#[test]
fn services_are_exempt_from_workload_labels() {
    let yaml = "kind: Service\nmetadata: { name: api }\nspec: { ports: [] }\n";
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert_eq!(report.verdict(), Verdict::Pass);
}

#[test]
fn single_replica_deployment_warns() {
    let yaml = r#"
kind: Deployment
metadata: { name: api, labels: { app: api } }
spec:
  replicas: 1
  template: { spec: { containers: [] } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    let v = report
        .violations
        .iter()
        .find(|v| v.rule == ids::K8S_MIN_REPLICAS)
        .expect("replica warning");
    assert_eq!(v.severity, Severity::Warn);
    assert!(v.message.contains("1 replica"));
}

#[test]
fn missing_replicas_field_defaults_to_one_and_warns() {
    let yaml = r#"
kind: Deployment
metadata: { name: api, labels: { app: api } }
spec:
  template: { spec: { containers: [] } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(report.violations.iter().any(|v| v.rule == ids::K8S_MIN_REPLICAS));
}

#[test]
fn replica_minimum_is_configurable() {
    let yaml = r#"
kind: Deployment
metadata: { name: api, labels: { app: api } }
spec:
  replicas: 2
  template: { spec: { containers: [] } }
"#;
    let cfg = RuleConfig { min_replicas: 3, ..RuleConfig::default() };
    let report = evaluate_manifests(&manifests(yaml), &cfg);
    assert!(report.violations.iter().any(|v| v.rule == ids::K8S_MIN_REPLICAS));
}

#[test]
fn jobs_are_exempt_from_replica_minimums() {
    let yaml = r#"
kind: Job
metadata: { name: migrate, labels: { app: migrate } }
spec:
  template: { spec: { containers: [] } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    assert!(!report.violations.iter().any(|v| v.rule == ids::K8S_MIN_REPLICAS));
}

#[test]
fn missing_probes_warn_per_container() {
    let yaml = r#"
kind: Deployment
metadata: { name: api }
spec:
  template:
    spec:
      initContainers:
        - name: setup
          image: r/s:1
      containers:
        - name: api
          image: r/a:1
          livenessProbe: { tcpSocket: { port: 80 } }
"#;
    let report = evaluate_manifests(&manifests(yaml), &RuleConfig::default());
    let probes: Vec<_> = report.violations.iter().filter(|v| v.rule == ids::K8S_PROBES).collect();
    // the init container is exempt; the app container lacks readiness
    assert_eq!(probes.len(), 1);
    assert!(probes[0].message.contains("'api'"));
}

// ---------------------------------------------------------------------------
// Engine invariants
// ---------------------------------------------------------------------------

#[test]
fn evaluation_is_idempotent() {
    let p = plan(vec![
        change("aws_db_instance", "pg", json!({"storage_encrypted": false, "tags": {}})),
        change("aws_security_group", "web", json!({"ingress": [{"from_port": 0, "to_port": 0, "protocol": "-1", "cidr_blocks": ["0.0.0.0/0"]}]})),
    ]);
    let cfg = RuleConfig::default();
    let first = evaluate_plan(&p, &cfg);
    let second = evaluate_plan(&p, &cfg);
    assert_eq!(first.violations, second.violations);
}

#[test]
fn report_orders_denials_before_warnings() {
    let p = plan(vec![change(
        "aws_db_instance",
        "pg",
        json!({"storage_encrypted": false, "instance_class": "db.r5.large", "tags": {}}),
    )]);
    let report = evaluate_plan(&p, &RuleConfig::default());
    let severities: Vec<Severity> = report.violations.iter().map(|v| v.severity).collect();
    let mut sorted = severities.clone();
    sorted.sort();
    assert_eq!(severities, sorted);
    assert_eq!(report.verdict(), Verdict::Deny);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

mod properties {
    use proptest::prelude::*;

    use super::*;
    use crate::report::Violation;
    use crate::rules::tf_cost;

    proptest! {
        /// The tag rule fires exactly when the present set does not cover
        /// the required set, regardless of extra tags.
        #[test]
        fn tag_rule_matches_set_cover(mask in 0u8..8, extras in 0usize..3) {
            let required = ["Environment", "Project", "ManagedBy"];
            let mut tags = serde_json::Map::new();
            for (i, key) in required.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    tags.insert(key.to_string(), json!("x"));
                }
            }
            for i in 0..extras {
                tags.insert(format!("Extra{i}"), json!("y"));
            }

            let p = plan(vec![change("aws_vpc", "main", json!({"tags": tags}))]);
            let mut out = Vec::new();
            tf_cost::required_tags(&p, &RuleConfig::default(), &mut out);

            let covered = mask == 0b111;
            prop_assert_eq!(out.is_empty(), covered, "mask {:03b} -> {:?}", mask, out);
        }

        /// Report construction is order-insensitive: any rotation of the
        /// violation list produces the identical report.
        #[test]
        fn report_order_is_canonical(rotation in 0usize..6) {
            let violations = vec![
                Violation::warn("b", "x", "1"),
                Violation::deny("a", "y", "2"),
                Violation::deny("a", "x", "3"),
                Violation::warn("c", "x", "4"),
                Violation::deny("b", "x", "5"),
                Violation::deny("a", "x", "3"),
            ];
            let mut rotated = violations.clone();
            rotated.rotate_left(rotation % violations.len());

            let base = crate::report::Report::from_violations(violations);
            let turned = crate::report::Report::from_violations(rotated);
            prop_assert_eq!(base.violations, turned.violations);
        }
    }
}
