//! VPC module: the network skeleton. Public subnets face the internet
//! gateway, private subnets route through NAT, one pair per availability
//! zone.

use infractl_core::{EnvConfig, Module, Output};
use serde_json::{json, Value as Json};

use crate::cidr::CidrBlock;
use crate::{resource_tags, RenderError};

/// Private subnet indexes start at 10 so the address plan stays readable:
/// 10.x.0-9.0/24 public, 10.x.10-19.0/24 private.
const PRIVATE_INDEX_OFFSET: u32 = 10;

pub struct Vpc {
    cfg: EnvConfig,
    az_count: usize,
    public_cidrs: Vec<String>,
    private_cidrs: Vec<String>,
}

impl Vpc {
    pub fn new(cfg: &EnvConfig) -> Result<Self, RenderError> {
        let block = CidrBlock::parse(&cfg.vpc.cidr)?;
        let n = cfg.vpc.az_count as u32;

        let public_cidrs = (0..n).map(|i| block.subnet(8, i)).collect::<Result<_, _>>()?;
        let private_cidrs = (0..n)
            .map(|i| block.subnet(8, PRIVATE_INDEX_OFFSET + i))
            .collect::<Result<_, _>>()?;

        Ok(Self { cfg: cfg.clone(), az_count: n as usize, public_cidrs, private_cidrs })
    }

    fn nat_count(&self) -> usize {
        if self.cfg.vpc.single_nat_gateway {
            1
        } else {
            self.az_count
        }
    }

    /// Zone names come from the region at plan time, never hardcoded.
    fn az_ref(i: usize) -> String {
        format!("${{data.aws_availability_zones.available.names[{i}]}}")
    }

    pub fn private_subnet_refs(az_count: u8) -> Vec<String> {
        (0..az_count).map(|i| format!("${{aws_subnet.private_{i}.id}}")).collect()
    }
}

impl Module for Vpc {
    fn name(&self) -> &str {
        "vpc"
    }

    fn resources(&self) -> Json {
        let cfg = &self.cfg;
        let cluster_tag = format!("kubernetes.io/cluster/{}", cfg.name_prefix());

        let mut doc = json!({
            "data": {
                "aws_availability_zones": {
                    "available": { "state": "available" }
                }
            },
            "resource": {
                "aws_vpc": {
                    "main": {
                        "cidr_block": cfg.vpc.cidr,
                        "enable_dns_support": true,
                        "enable_dns_hostnames": true,
                        "tags": resource_tags(cfg, "vpc"),
                    }
                },
                "aws_internet_gateway": {
                    "main": {
                        "vpc_id": "${aws_vpc.main.id}",
                        "tags": resource_tags(cfg, "igw"),
                    }
                },
                "aws_route_table": {
                    "public": {
                        "vpc_id": "${aws_vpc.main.id}",
                        "tags": resource_tags(cfg, "public-rt"),
                    }
                },
                "aws_route": {
                    "public_internet": {
                        "route_table_id": "${aws_route_table.public.id}",
                        "destination_cidr_block": "0.0.0.0/0",
                        "gateway_id": "${aws_internet_gateway.main.id}",
                    }
                },
            }
        });

        let res = &mut doc["resource"];
        for i in 0..self.az_count {
            let mut public = json!({
                "vpc_id": "${aws_vpc.main.id}",
                "cidr_block": self.public_cidrs[i],
                "availability_zone": Self::az_ref(i),
                "map_public_ip_on_launch": true,
                "tags": resource_tags(cfg, &format!("public-{i}")),
            });
            public["tags"]["kubernetes.io/role/elb"] = json!("1");
            public["tags"][&cluster_tag] = json!("shared");
            res["aws_subnet"][format!("public_{i}")] = public;

            let mut private = json!({
                "vpc_id": "${aws_vpc.main.id}",
                "cidr_block": self.private_cidrs[i],
                "availability_zone": Self::az_ref(i),
                "tags": resource_tags(cfg, &format!("private-{i}")),
            });
            private["tags"]["kubernetes.io/role/internal-elb"] = json!("1");
            private["tags"][&cluster_tag] = json!("shared");
            res["aws_subnet"][format!("private_{i}")] = private;

            res["aws_route_table_association"][format!("public_{i}")] = json!({
                "subnet_id": format!("${{aws_subnet.public_{i}.id}}"),
                "route_table_id": "${aws_route_table.public.id}",
            });
        }

        for i in 0..self.nat_count() {
            res["aws_eip"][format!("nat_{i}")] = json!({
                "domain": "vpc",
                "tags": resource_tags(cfg, &format!("nat-eip-{i}")),
            });
            res["aws_nat_gateway"][format!("nat_{i}")] = json!({
                "allocation_id": format!("${{aws_eip.nat_{i}.id}}"),
                "subnet_id": format!("${{aws_subnet.public_{i}.id}}"),
                "tags": resource_tags(cfg, &format!("nat-{i}")),
                "depends_on": ["aws_internet_gateway.main"],
            });
        }

        for i in 0..self.az_count {
            let nat = if self.cfg.vpc.single_nat_gateway { 0 } else { i };
            res["aws_route_table"][format!("private_{i}")] = json!({
                "vpc_id": "${aws_vpc.main.id}",
                "tags": resource_tags(cfg, &format!("private-rt-{i}")),
            });
            res["aws_route"][format!("private_nat_{i}")] = json!({
                "route_table_id": format!("${{aws_route_table.private_{i}.id}}"),
                "destination_cidr_block": "0.0.0.0/0",
                "nat_gateway_id": format!("${{aws_nat_gateway.nat_{nat}.id}}"),
            });
            res["aws_route_table_association"][format!("private_{i}")] = json!({
                "subnet_id": format!("${{aws_subnet.private_{i}.id}}"),
                "route_table_id": format!("${{aws_route_table.private_{i}.id}}"),
            });
        }

        doc
    }

    fn outputs(&self) -> Vec<Output> {
        let ids = |kind: &str| -> Vec<String> {
            (0..self.az_count).map(|i| format!("${{aws_subnet.{kind}_{i}.id}}")).collect()
        };
        vec![
            Output::new("vpc_id", "${aws_vpc.main.id}").describe("VPC identifier"),
            Output::new("public_subnet_ids", ids("public")),
            Output::new("private_subnet_ids", ids("private")),
        ]
    }
}
