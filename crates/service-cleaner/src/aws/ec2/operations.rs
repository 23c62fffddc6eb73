//! Resource client abstraction
//!
//! The cleanup engine talks to the cloud only through this trait, so the
//! scanner and orchestrator can be unit tested without hitting real AWS.

use super::Ec2Client;
use super::types::{Image, Instance, SecurityGroup, Snapshot, Volume};
use crate::aws::error::AwsError;
use crate::wait::WaitConfig;

/// Capability set of one region's EC2 endpoint, as used by the cleaner.
///
/// Every mutating call takes the run's dry-run flag and forwards it to the
/// provider, so permission and state errors surface in dry-run mode too. A
/// permitted dry-run request returns `Ok`.
///
/// Listing calls follow pagination to the end.
#[allow(async_fn_in_trait)] // Internal use only, awaited sequentially
#[cfg_attr(test, mockall::automock)]
pub trait ResourceOperations: Send + Sync {
    /// List all instances in the region (every lifecycle state)
    async fn list_instances(&self) -> Result<Vec<Instance>, AwsError>;

    /// List all volumes in the region
    async fn list_volumes(&self) -> Result<Vec<Volume>, AwsError>;

    /// List snapshots owned by `owner`
    async fn list_snapshots(&self, owner: &str) -> Result<Vec<Snapshot>, AwsError>;

    /// List images owned by `owner`
    async fn list_images(&self, owner: &str) -> Result<Vec<Image>, AwsError>;

    /// List all security groups in the region
    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, AwsError>;

    /// Stop a batch of instances in one request
    async fn stop_instances(&self, instance_ids: &[String], dry_run: bool)
    -> Result<(), AwsError>;

    /// Terminate a batch of instances in one request
    async fn terminate_instances(
        &self,
        instance_ids: &[String],
        dry_run: bool,
    ) -> Result<(), AwsError>;

    /// Block until every instance in the batch is terminated, polling with a
    /// fixed delay. Fails with [`AwsError::Waiter`] when the budget runs out.
    async fn wait_terminated(
        &self,
        instance_ids: &[String],
        config: &WaitConfig,
        dry_run: bool,
    ) -> Result<(), AwsError>;

    /// Delete a volume
    async fn delete_volume(&self, volume_id: &str, dry_run: bool) -> Result<(), AwsError>;

    /// Delete a snapshot
    async fn delete_snapshot(&self, snapshot_id: &str, dry_run: bool) -> Result<(), AwsError>;

    /// Deregister an image
    async fn deregister_image(&self, image_id: &str, dry_run: bool) -> Result<(), AwsError>;

    /// Delete a security group
    async fn delete_security_group(&self, group_id: &str, dry_run: bool)
    -> Result<(), AwsError>;

    /// IDs of instances that reference the security group
    async fn list_dependent_instances(&self, group_id: &str) -> Result<Vec<String>, AwsError>;
}

impl ResourceOperations for Ec2Client {
    async fn list_instances(&self) -> Result<Vec<Instance>, AwsError> {
        Ec2Client::list_instances(self).await
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>, AwsError> {
        Ec2Client::list_volumes(self).await
    }

    async fn list_snapshots(&self, owner: &str) -> Result<Vec<Snapshot>, AwsError> {
        Ec2Client::list_snapshots(self, owner).await
    }

    async fn list_images(&self, owner: &str) -> Result<Vec<Image>, AwsError> {
        Ec2Client::list_images(self, owner).await
    }

    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, AwsError> {
        Ec2Client::list_security_groups(self).await
    }

    async fn stop_instances(&self, instance_ids: &[String], dry_run: bool) -> Result<(), AwsError> {
        Ec2Client::stop_instances(self, instance_ids, dry_run).await
    }

    async fn terminate_instances(
        &self,
        instance_ids: &[String],
        dry_run: bool,
    ) -> Result<(), AwsError> {
        Ec2Client::terminate_instances(self, instance_ids, dry_run).await
    }

    async fn wait_terminated(
        &self,
        instance_ids: &[String],
        config: &WaitConfig,
        dry_run: bool,
    ) -> Result<(), AwsError> {
        Ec2Client::wait_terminated(self, instance_ids, config, dry_run).await
    }

    async fn delete_volume(&self, volume_id: &str, dry_run: bool) -> Result<(), AwsError> {
        Ec2Client::delete_volume(self, volume_id, dry_run).await
    }

    async fn delete_snapshot(&self, snapshot_id: &str, dry_run: bool) -> Result<(), AwsError> {
        Ec2Client::delete_snapshot(self, snapshot_id, dry_run).await
    }

    async fn deregister_image(&self, image_id: &str, dry_run: bool) -> Result<(), AwsError> {
        Ec2Client::deregister_image(self, image_id, dry_run).await
    }

    async fn delete_security_group(&self, group_id: &str, dry_run: bool) -> Result<(), AwsError> {
        Ec2Client::delete_security_group(self, group_id, dry_run).await
    }

    async fn list_dependent_instances(&self, group_id: &str) -> Result<Vec<String>, AwsError> {
        Ec2Client::list_dependent_instances(self, group_id).await
    }
}
