//! Tag-driven retention policy
//!
//! Pure decision logic: given a resource kind, its tags and the relationship
//! facts gathered by the scanner, decide what the cleaner should do. No I/O.

use crate::aws::ec2::Tags;
use serde::Serialize;
use service_cleaner_common::ResourceKind;
use service_cleaner_common::tags::{TAG_KEEP, keep};

/// What the cleaner does with one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Protected by a `keep` tag; nothing is called
    Keep,
    /// Left alone (protected, in use, or attached)
    NoOp,
    /// Stop the instance
    Shutdown,
    /// Terminate, delete or deregister, depending on the kind
    Terminate,
}

impl Decision {
    /// Label used in reports. `Terminate` takes the kind's removal verb.
    pub fn label(self, kind: ResourceKind) -> &'static str {
        match self {
            Decision::Keep => "Keep",
            Decision::NoOp => "DoNothing",
            Decision::Shutdown => "Shutdown",
            Decision::Terminate => kind.removal_verb(),
        }
    }

    /// Whether this decision leads to a mutating call
    pub fn is_mutating(self) -> bool {
        matches!(self, Decision::Shutdown | Decision::Terminate)
    }
}

/// Relationship facts gathered before deciding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facts<'a> {
    None,
    /// Volume state as reported by the provider
    VolumeState(&'a str),
    /// Instances referencing a security group
    AttachedInstances(&'a [String]),
}

fn keep_value(tags: Option<&Tags>) -> Option<&str> {
    tags.and_then(|t| t.get(TAG_KEEP)).map(String::as_str)
}

/// Decide the action for one resource.
///
/// Facts that do not belong to `kind` are ignored.
pub fn decide(kind: ResourceKind, tags: Option<&Tags>, facts: Facts<'_>) -> Decision {
    match kind {
        ResourceKind::Instance => match keep_value(tags) {
            Some(keep::ON) => Decision::NoOp,
            Some(keep::OFF) => Decision::Shutdown,
            _ => Decision::Terminate,
        },
        ResourceKind::Volume => match facts {
            Facts::VolumeState("available") => Decision::Terminate,
            _ => Decision::NoOp,
        },
        // Snapshot tags are not consulted
        ResourceKind::Snapshot => Decision::Terminate,
        ResourceKind::Image => match keep_value(tags) {
            Some(_) => Decision::Keep,
            None => Decision::Terminate,
        },
        ResourceKind::SecurityGroup => match facts {
            Facts::AttachedInstances(ids) if !ids.is_empty() => Decision::NoOp,
            _ if keep_value(tags).is_some() => Decision::NoOp,
            _ => Decision::Terminate,
        },
    }
}
