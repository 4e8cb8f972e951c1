//! EKS module: cluster + managed node group, with the IAM roles and node
//! security group they need. The cluster name is the bare name prefix so
//! kubeconfig contexts stay short.

use std::collections::BTreeSet;

use infractl_core::{EnvConfig, Module, Output};
use serde_json::{json, Value as Json};

use crate::resource_tags;
use crate::vpc::Vpc;

const EKS_ASSUME_ROLE: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"eks.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;
const EC2_ASSUME_ROLE: &str = r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Principal":{"Service":"ec2.amazonaws.com"},"Action":"sts:AssumeRole"}]}"#;

pub struct Eks {
    cfg: EnvConfig,
}

impl Eks {
    pub fn new(cfg: &EnvConfig) -> Self {
        Self { cfg: cfg.clone() }
    }
}

impl Module for Eks {
    fn name(&self) -> &str {
        "eks"
    }

    fn deps(&self) -> BTreeSet<String> {
        ["vpc".to_string()].into()
    }

    fn resources(&self) -> Json {
        let cfg = &self.cfg;
        let prefix = cfg.name_prefix();
        let subnet_ids = Vpc::private_subnet_refs(cfg.vpc.az_count);

        json!({
            "resource": {
                "aws_iam_role": {
                    "eks_cluster": {
                        "name": format!("{prefix}-eks-cluster"),
                        "assume_role_policy": EKS_ASSUME_ROLE,
                        "tags": resource_tags(cfg, "eks-cluster-role"),
                    },
                    "eks_nodes": {
                        "name": format!("{prefix}-eks-nodes"),
                        "assume_role_policy": EC2_ASSUME_ROLE,
                        "tags": resource_tags(cfg, "eks-nodes-role"),
                    },
                },
                "aws_iam_role_policy_attachment": {
                    "eks_cluster_policy": {
                        "role": "${aws_iam_role.eks_cluster.name}",
                        "policy_arn": "arn:aws:iam::aws:policy/AmazonEKSClusterPolicy",
                    },
                    "eks_worker_node_policy": {
                        "role": "${aws_iam_role.eks_nodes.name}",
                        "policy_arn": "arn:aws:iam::aws:policy/AmazonEKSWorkerNodePolicy",
                    },
                    "eks_cni_policy": {
                        "role": "${aws_iam_role.eks_nodes.name}",
                        "policy_arn": "arn:aws:iam::aws:policy/AmazonEKS_CNI_Policy",
                    },
                    "eks_ecr_read_only": {
                        "role": "${aws_iam_role.eks_nodes.name}",
                        "policy_arn": "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryReadOnly",
                    },
                },
                "aws_security_group": {
                    "eks_nodes": {
                        "name": format!("{prefix}-eks-nodes"),
                        "description": "EKS worker node traffic",
                        "vpc_id": "${aws_vpc.main.id}",
                        "tags": resource_tags(cfg, "eks-nodes-sg"),
                    }
                },
                "aws_vpc_security_group_ingress_rule": {
                    "eks_nodes_self": {
                        "security_group_id": "${aws_security_group.eks_nodes.id}",
                        "referenced_security_group_id": "${aws_security_group.eks_nodes.id}",
                        "ip_protocol": "-1",
                        "description": "node to node",
                    }
                },
                "aws_vpc_security_group_egress_rule": {
                    "eks_nodes_all": {
                        "security_group_id": "${aws_security_group.eks_nodes.id}",
                        "ip_protocol": "-1",
                        "cidr_ipv4": "0.0.0.0/0",
                        "description": "node egress",
                    }
                },
                "aws_eks_cluster": {
                    "main": {
                        "name": prefix,
                        "role_arn": "${aws_iam_role.eks_cluster.arn}",
                        "version": cfg.eks.version,
                        "vpc_config": {
                            "subnet_ids": subnet_ids,
                            "endpoint_private_access": true,
                            "endpoint_public_access": true,
                        },
                        "enabled_cluster_log_types": ["api", "audit"],
                        "tags": resource_tags(cfg, "eks"),
                        "depends_on": ["aws_iam_role_policy_attachment.eks_cluster_policy"],
                    }
                },
                "aws_eks_node_group": {
                    "default": {
                        "cluster_name": "${aws_eks_cluster.main.name}",
                        "node_group_name": format!("{prefix}-default"),
                        "node_role_arn": "${aws_iam_role.eks_nodes.arn}",
                        "subnet_ids": Vpc::private_subnet_refs(cfg.vpc.az_count),
                        "instance_types": cfg.eks.instance_types,
                        "scaling_config": {
                            "desired_size": cfg.eks.desired_size,
                            "min_size": cfg.eks.min_size,
                            "max_size": cfg.eks.max_size,
                        },
                        "tags": resource_tags(cfg, "eks-nodes"),
                        "depends_on": [
                            "aws_iam_role_policy_attachment.eks_worker_node_policy",
                            "aws_iam_role_policy_attachment.eks_cni_policy",
                            "aws_iam_role_policy_attachment.eks_ecr_read_only",
                        ],
                    }
                },
            }
        })
    }

    fn outputs(&self) -> Vec<Output> {
        vec![
            Output::new("cluster_name", "${aws_eks_cluster.main.name}").describe("EKS cluster name"),
            Output::new("cluster_endpoint", "${aws_eks_cluster.main.endpoint}"),
            Output::new("node_security_group_id", "${aws_security_group.eks_nodes.id}"),
        ]
    }
}
