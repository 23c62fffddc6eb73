//! Resource kinds handled by the cleaner and their cleanup ordering
//!
//! Kinds must be cleaned in dependency order: a terminated instance releases
//! its attached volumes into the `available` state that volume cleanup keys
//! on, so instances always go first.

use serde::{Deserialize, Serialize};

/// Categories of AWS resources the cleaner scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// EC2 instance (must be terminated before volume cleanup)
    Instance,
    /// EBS volume
    Volume,
    /// Amazon Machine Image owned by the account
    Image,
    /// EBS snapshot owned by the account
    Snapshot,
    /// VPC security group
    SecurityGroup,
}

impl ResourceKind {
    /// All kinds, in cleanup order
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Instance,
        ResourceKind::Volume,
        ResourceKind::Image,
        ResourceKind::Snapshot,
        ResourceKind::SecurityGroup,
    ];

    /// Stable identifier used in logs
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Instance => "instance",
            ResourceKind::Volume => "volume",
            ResourceKind::Image => "image",
            ResourceKind::Snapshot => "snapshot",
            ResourceKind::SecurityGroup => "security_group",
        }
    }

    /// Report section title for this kind
    pub fn section_name(self) -> &'static str {
        match self {
            ResourceKind::Instance => "EC2",
            ResourceKind::Volume => "Volumes",
            ResourceKind::Image => "Images",
            ResourceKind::Snapshot => "Snapshots",
            ResourceKind::SecurityGroup => "SG",
        }
    }

    /// Name of the destructive action for this kind
    pub fn removal_verb(self) -> &'static str {
        match self {
            ResourceKind::Instance => "Terminate",
            ResourceKind::Image => "Deregister",
            ResourceKind::Volume | ResourceKind::Snapshot | ResourceKind::SecurityGroup => {
                "Delete"
            }
        }
    }

    /// Get cleanup priority (lower number = cleanup first)
    ///
    /// - 0: Instances (termination frees attached volumes)
    /// - 1: Volumes (depend on instances having terminated)
    /// - 2: Images
    /// - 3: Snapshots (registered images may still reference them)
    /// - 4: Security groups (only deletable once no instance references them)
    pub fn cleanup_priority(self) -> u8 {
        match self {
            ResourceKind::Instance => 0,
            ResourceKind::Volume => 1,
            ResourceKind::Image => 2,
            ResourceKind::Snapshot => 3,
            ResourceKind::SecurityGroup => 4,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
