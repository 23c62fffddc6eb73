//! EBS volume listing and deletion

use super::Ec2Client;
use super::paging::PageCollector;
use super::types::Volume;
use crate::aws::error::{AwsError, classify_sdk_error, dry_run_ok};
use service_cleaner_common::ResourceKind;
use tracing::info;

impl Ec2Client {
    /// List every volume in the region
    pub async fn list_volumes(&self) -> Result<Vec<Volume>, AwsError> {
        let mut pages = self
            .client
            .describe_volumes()
            .into_paginator()
            .send();
        let mut collected = PageCollector::new(ResourceKind::Volume, self.region());

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            collected.extend(page.volumes(), Volume::from_sdk);
        }

        Ok(collected.finish())
    }

    /// Delete a volume
    pub async fn delete_volume(&self, volume_id: &str, dry_run: bool) -> Result<(), AwsError> {
        info!(volume_id = %volume_id, dry_run, "Deleting volume");

        dry_run_ok(
            self.client
                .delete_volume()
                .volume_id(volume_id)
                .dry_run(dry_run)
                .send()
                .await,
        )
    }
}
