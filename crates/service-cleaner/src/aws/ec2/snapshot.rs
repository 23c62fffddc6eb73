//! EBS snapshot listing and deletion

use super::Ec2Client;
use super::paging::PageCollector;
use super::types::Snapshot;
use crate::aws::error::{AwsError, classify_sdk_error, dry_run_ok};
use service_cleaner_common::ResourceKind;
use tracing::info;

impl Ec2Client {
    /// List snapshots owned by `owner` (an account id)
    pub async fn list_snapshots(&self, owner: &str) -> Result<Vec<Snapshot>, AwsError> {
        let mut pages = self
            .client
            .describe_snapshots()
            .owner_ids(owner)
            .into_paginator()
            .send();
        let mut collected = PageCollector::new(ResourceKind::Snapshot, self.region());

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            collected.extend(page.snapshots(), Snapshot::from_sdk);
        }

        Ok(collected.finish())
    }

    /// Delete a snapshot
    pub async fn delete_snapshot(&self, snapshot_id: &str, dry_run: bool) -> Result<(), AwsError> {
        info!(snapshot_id = %snapshot_id, dry_run, "Deleting snapshot");

        dry_run_ok(
            self.client
                .delete_snapshot()
                .snapshot_id(snapshot_id)
                .dry_run(dry_run)
                .send()
                .await,
        )
    }
}
