//! EC2 resource records
//!
//! One struct per resource kind, converted from SDK output at the client
//! boundary. Fields the provider may omit are `Option`s; a record without an
//! identifier is rejected during conversion.

use serde::Serialize;
use std::collections::BTreeMap;

/// Tag key to value mapping. `None` on a resource means "no tags at all".
pub type Tags = BTreeMap<String, String>;

/// EC2 instance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Instance {
    pub instance_id: String,
    pub instance_type: Option<String>,
    pub availability_zone: Option<String>,
    /// Lifecycle state name (e.g., "running", "stopped")
    pub state: Option<String>,
    pub private_ip: Option<String>,
    pub public_dns: Option<String>,
    pub subnet_id: Option<String>,
    pub vpc_id: Option<String>,
    pub root_device_type: Option<String>,
    pub volumes: Vec<AttachedVolume>,
    pub security_groups: Vec<GroupRef>,
    pub tags: Option<Tags>,
}

/// EBS volume attached to an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttachedVolume {
    pub volume_id: String,
    /// Attachment status (e.g., "attached", "detaching")
    pub status: Option<String>,
}

/// Security group reference on an instance
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupRef {
    pub group_id: String,
    pub group_name: Option<String>,
}

/// EBS volume
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Volume {
    pub volume_id: String,
    pub availability_zone: Option<String>,
    /// Volume state (e.g., "available", "in-use")
    pub state: String,
    pub iops: Option<i32>,
    pub volume_type: Option<String>,
    pub size_gib: Option<i32>,
    pub tags: Option<Tags>,
}

/// EBS snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub volume_id: Option<String>,
    pub volume_size_gib: Option<i32>,
    pub description: Option<String>,
    pub tags: Option<Tags>,
}

/// Amazon Machine Image
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Image {
    pub image_id: String,
    pub name: Option<String>,
    pub owner_id: Option<String>,
    pub image_type: Option<String>,
    pub creation_date: Option<String>,
    pub tags: Option<Tags>,
}

/// VPC security group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityGroup {
    pub group_id: String,
    pub group_name: Option<String>,
    pub owner_id: Option<String>,
    pub vpc_id: Option<String>,
    pub ingress: Vec<IngressRule>,
    pub tags: Option<Tags>,
}

/// One ingress permission of a security group, flattened per source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngressRule {
    pub ip_protocol: Option<String>,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    /// CIDR, IPv6 CIDR, prefix list or security group id
    pub source: String,
}

/// Convert SDK tags, mapping a missing or empty tag list to `None`.
pub(crate) fn extract_ec2_tags(tags: &[aws_sdk_ec2::types::Tag]) -> Option<Tags> {
    if tags.is_empty() {
        return None;
    }

    Some(
        tags.iter()
            .filter_map(|t| {
                t.key()
                    .map(|k| (k.to_string(), t.value().unwrap_or_default().to_string()))
            })
            .collect(),
    )
}

impl Instance {
    pub(crate) fn from_sdk(i: &aws_sdk_ec2::types::Instance) -> Option<Self> {
        Some(Self {
            instance_id: i.instance_id()?.to_string(),
            instance_type: i.instance_type().map(|t| t.as_str().to_string()),
            availability_zone: i
                .placement()
                .and_then(|p| p.availability_zone())
                .map(str::to_string),
            state: i
                .state()
                .and_then(|s| s.name())
                .map(|n| n.as_str().to_string()),
            private_ip: i.private_ip_address().map(str::to_string),
            public_dns: i
                .public_dns_name()
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            subnet_id: i.subnet_id().map(str::to_string),
            vpc_id: i.vpc_id().map(str::to_string),
            root_device_type: i.root_device_type().map(|t| t.as_str().to_string()),
            volumes: i
                .block_device_mappings()
                .iter()
                .filter_map(|m| m.ebs())
                .filter_map(|ebs| {
                    Some(AttachedVolume {
                        volume_id: ebs.volume_id()?.to_string(),
                        status: ebs.status().map(|s| s.as_str().to_string()),
                    })
                })
                .collect(),
            security_groups: i
                .security_groups()
                .iter()
                .filter_map(|g| {
                    Some(GroupRef {
                        group_id: g.group_id()?.to_string(),
                        group_name: g.group_name().map(str::to_string),
                    })
                })
                .collect(),
            tags: extract_ec2_tags(i.tags()),
        })
    }
}

impl Volume {
    pub(crate) fn from_sdk(v: &aws_sdk_ec2::types::Volume) -> Option<Self> {
        Some(Self {
            volume_id: v.volume_id()?.to_string(),
            availability_zone: v.availability_zone().map(str::to_string),
            state: v
                .state()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            iops: v.iops(),
            volume_type: v.volume_type().map(|t| t.as_str().to_string()),
            size_gib: v.size(),
            tags: extract_ec2_tags(v.tags()),
        })
    }
}

impl Snapshot {
    pub(crate) fn from_sdk(s: &aws_sdk_ec2::types::Snapshot) -> Option<Self> {
        Some(Self {
            snapshot_id: s.snapshot_id()?.to_string(),
            volume_id: s.volume_id().map(str::to_string),
            volume_size_gib: s.volume_size(),
            description: s
                .description()
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            tags: extract_ec2_tags(s.tags()),
        })
    }
}

impl Image {
    pub(crate) fn from_sdk(i: &aws_sdk_ec2::types::Image) -> Option<Self> {
        Some(Self {
            image_id: i.image_id()?.to_string(),
            name: i.name().map(str::to_string),
            owner_id: i.owner_id().map(str::to_string),
            image_type: i.image_type().map(|t| t.as_str().to_string()),
            creation_date: i.creation_date().map(str::to_string),
            tags: extract_ec2_tags(i.tags()),
        })
    }
}

impl SecurityGroup {
    pub(crate) fn from_sdk(g: &aws_sdk_ec2::types::SecurityGroup) -> Option<Self> {
        Some(Self {
            group_id: g.group_id()?.to_string(),
            group_name: g.group_name().map(str::to_string),
            owner_id: g.owner_id().map(str::to_string),
            vpc_id: g.vpc_id().map(str::to_string),
            ingress: g.ip_permissions().iter().flat_map(IngressRule::from_sdk).collect(),
            tags: extract_ec2_tags(g.tags()),
        })
    }
}

impl IngressRule {
    /// Flatten one permission into a rule per source (CIDR, group, prefix list).
    fn from_sdk(p: &aws_sdk_ec2::types::IpPermission) -> Vec<Self> {
        let sources: Vec<String> = p
            .ip_ranges()
            .iter()
            .filter_map(|r| r.cidr_ip())
            .chain(p.ipv6_ranges().iter().filter_map(|r| r.cidr_ipv6()))
            .chain(p.prefix_list_ids().iter().filter_map(|r| r.prefix_list_id()))
            .chain(p.user_id_group_pairs().iter().filter_map(|r| r.group_id()))
            .map(str::to_string)
            .collect();

        sources
            .into_iter()
            .map(|source| Self {
                ip_protocol: p.ip_protocol().map(str::to_string),
                from_port: p.from_port(),
                to_port: p.to_port(),
                source,
            })
            .collect()
    }
}
