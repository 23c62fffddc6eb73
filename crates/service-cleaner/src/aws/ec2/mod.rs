//! EC2 resource listing and removal

mod image;
mod instance;
mod operations;
mod paging;
mod security_group;
mod snapshot;
mod types;
mod volume;

pub use operations::ResourceOperations;
pub use types::{
    AttachedVolume, GroupRef, Image, IngressRule, Instance, SecurityGroup, Snapshot, Tags, Volume,
};

#[cfg(test)]
pub use operations::MockResourceOperations;

use crate::aws::context::AwsContext;
use aws_sdk_ec2::Client;

/// EC2 client bound to a single region
pub struct Ec2Client {
    pub(crate) client: Client,
    region: String,
}

impl Ec2Client {
    /// Create an EC2 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
            region: ctx.region().to_string(),
        }
    }

    /// Region this client talks to
    pub fn region(&self) -> &str {
        &self.region
    }
}
