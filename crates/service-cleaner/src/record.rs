//! Outcome records produced by the cleaner
//!
//! One record per resource processed, plus batch-level records for failures
//! that cannot be attributed to a single resource (termination waits,
//! skipped volume cleanup).

use crate::aws::ec2::{Image, Instance, SecurityGroup, Snapshot, Tags, Volume};
use crate::aws::error::AwsError;
use crate::policy::Decision;
use serde::Serialize;
use service_cleaner_common::ResourceKind;
use thiserror::Error;

/// Error attached to an outcome record. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CleanupError {
    /// The provider rejected a request
    #[error("{code}: {message}")]
    Client { code: String, message: String },

    /// An accepted request could not be confirmed complete
    #[error("waiter failed: {message}")]
    Waiter { message: String },

    /// Work deliberately not attempted
    #[error("skipped: {reason}")]
    Skipped { reason: String },
}

impl From<&AwsError> for CleanupError {
    fn from(err: &AwsError) -> Self {
        match err {
            AwsError::Waiter { message } => CleanupError::Waiter {
                message: message.clone(),
            },
            other => CleanupError::Client {
                code: other.code().unwrap_or("Unknown").to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<AwsError> for CleanupError {
    fn from(err: AwsError) -> Self {
        CleanupError::from(&err)
    }
}

impl CleanupError {
    /// Provider error code, for client errors
    pub fn code(&self) -> Option<&str> {
        match self {
            CleanupError::Client { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Batch-level operation a record refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    /// Waiting for a terminate batch to complete
    WaitTerminated,
    /// Volume cleanup of a whole region
    VolumeCleanup,
}

/// What a record is about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum Subject {
    Instance(Instance),
    Volume(Volume),
    Image(Image),
    Snapshot(Snapshot),
    SecurityGroup {
        group: SecurityGroup,
        /// Instances found referencing the group
        attached_instances: Vec<String>,
    },
    Batch {
        action: BatchAction,
        instance_ids: Vec<String>,
    },
}

impl Subject {
    /// Provider id of the resource, or a comma-joined id list for batches
    pub fn id(&self) -> String {
        match self {
            Subject::Instance(i) => i.instance_id.clone(),
            Subject::Volume(v) => v.volume_id.clone(),
            Subject::Image(i) => i.image_id.clone(),
            Subject::Snapshot(s) => s.snapshot_id.clone(),
            Subject::SecurityGroup { group, .. } => group.group_id.clone(),
            Subject::Batch { instance_ids, .. } => instance_ids.join(","),
        }
    }

    /// Tags as seen when the decision was made
    pub fn tags(&self) -> Option<&Tags> {
        match self {
            Subject::Instance(i) => i.tags.as_ref(),
            Subject::Volume(v) => v.tags.as_ref(),
            Subject::Image(i) => i.tags.as_ref(),
            Subject::Snapshot(s) => s.tags.as_ref(),
            Subject::SecurityGroup { group, .. } => group.tags.as_ref(),
            Subject::Batch { .. } => None,
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, Subject::Batch { .. })
    }
}

/// Outcome of processing one resource (or one batch)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub kind: ResourceKind,
    pub region: String,
    pub subject: Subject,
    pub decision: Decision,
    pub error: Option<CleanupError>,
}

impl OutcomeRecord {
    pub fn new(kind: ResourceKind, region: &str, subject: Subject, decision: Decision) -> Self {
        Self {
            kind,
            region: region.to_string(),
            subject,
            decision,
            error: None,
        }
    }

    pub fn with_error(mut self, error: Option<CleanupError>) -> Self {
        self.error = error;
        self
    }

    /// Report label of the decision
    pub fn decision_label(&self) -> &'static str {
        self.decision.label(self.kind)
    }
}
