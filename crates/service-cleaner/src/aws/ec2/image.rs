//! AMI listing and deregistration

use super::Ec2Client;
use super::paging::PageCollector;
use super::types::Image;
use crate::aws::error::{AwsError, classify_sdk_error, dry_run_ok};
use service_cleaner_common::ResourceKind;
use tracing::info;

impl Ec2Client {
    /// List images owned by `owner` (an account id)
    pub async fn list_images(&self, owner: &str) -> Result<Vec<Image>, AwsError> {
        let mut pages = self
            .client
            .describe_images()
            .owners(owner)
            .into_paginator()
            .send();
        let mut collected = PageCollector::new(ResourceKind::Image, self.region());

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            collected.extend(page.images(), Image::from_sdk);
        }

        Ok(collected.finish())
    }

    /// Deregister an image
    pub async fn deregister_image(&self, image_id: &str, dry_run: bool) -> Result<(), AwsError> {
        info!(image_id = %image_id, dry_run, "Deregistering image");

        dry_run_ok(
            self.client
                .deregister_image()
                .image_id(image_id)
                .dry_run(dry_run)
                .send()
                .await,
        )
    }
}
