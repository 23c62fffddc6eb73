//! Security group listing and deletion

use super::Ec2Client;
use super::paging::PageCollector;
use super::types::SecurityGroup;
use crate::aws::error::{AwsError, classify_sdk_error, dry_run_ok};
use service_cleaner_common::ResourceKind;
use tracing::info;

impl Ec2Client {
    /// List every security group in the region
    pub async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>, AwsError> {
        let mut pages = self
            .client
            .describe_security_groups()
            .into_paginator()
            .send();
        let mut collected = PageCollector::new(ResourceKind::SecurityGroup, self.region());

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            collected.extend(page.security_groups(), SecurityGroup::from_sdk);
        }

        Ok(collected.finish())
    }

    /// Delete a security group by id
    pub async fn delete_security_group(&self, group_id: &str, dry_run: bool) -> Result<(), AwsError> {
        info!(group_id = %group_id, dry_run, "Deleting security group");

        dry_run_ok(
            self.client
                .delete_security_group()
                .group_id(group_id)
                .dry_run(dry_run)
                .send()
                .await,
        )
    }
}
