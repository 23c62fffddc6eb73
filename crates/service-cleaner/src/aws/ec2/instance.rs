//! EC2 instance listing, stop/terminate and termination waits

use super::Ec2Client;
use super::paging::PageCollector;
use super::types::Instance;
use crate::aws::error::{AwsError, classify_sdk_error, dry_run_ok};
use crate::wait::{WaitConfig, wait_for_resource};
use aws_sdk_ec2::types::{Filter, InstanceStateName};
use service_cleaner_common::ResourceKind;
use tracing::{debug, info, warn};

/// Instances not yet reported as `terminated`. One with no state is still pending.
fn pending_count<'a>(instances: impl IntoIterator<Item = &'a aws_sdk_ec2::types::Instance>) -> usize {
    instances
        .into_iter()
        .filter(|i| !matches!(i.state().and_then(|s| s.name()), Some(InstanceStateName::Terminated)))
        .count()
}

impl Ec2Client {
    /// Page through DescribeInstances, returning every instance that carries an id.
    pub(super) async fn describe_instances_paged(
        &self,
        filter: Option<Filter>,
    ) -> Result<Vec<Instance>, AwsError> {
        let mut pages = self
            .client
            .describe_instances()
            .set_filters(filter.map(|f| vec![f]))
            .into_paginator()
            .send();
        let mut collected = PageCollector::new(ResourceKind::Instance, self.region());

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| classify_sdk_error(&e))?;
            collected.extend(
                page.reservations().iter().flat_map(|r| r.instances()),
                Instance::from_sdk,
            );
        }

        Ok(collected.finish())
    }

    /// List every instance in the region, regardless of state
    pub async fn list_instances(&self) -> Result<Vec<Instance>, AwsError> {
        let instances = self.describe_instances_paged(None).await?;
        debug!(region = %self.region(), count = instances.len(), "Listed instances");
        Ok(instances)
    }

    /// Stop a batch of instances with one StopInstances call
    pub async fn stop_instances(&self, instance_ids: &[String], dry_run: bool) -> Result<(), AwsError> {
        if instance_ids.is_empty() {
            return Ok(());
        }

        info!(region = %self.region(), count = instance_ids.len(), dry_run, "Stopping instances");

        dry_run_ok(
            self.client
                .stop_instances()
                .set_instance_ids(Some(instance_ids.to_vec()))
                .dry_run(dry_run)
                .send()
                .await,
        )
    }

    /// Terminate a batch of instances with one TerminateInstances call
    pub async fn terminate_instances(
        &self,
        instance_ids: &[String],
        dry_run: bool,
    ) -> Result<(), AwsError> {
        if instance_ids.is_empty() {
            return Ok(());
        }

        info!(region = %self.region(), count = instance_ids.len(), dry_run, "Terminating instances");

        dry_run_ok(
            self.client
                .terminate_instances()
                .set_instance_ids(Some(instance_ids.to_vec()))
                .dry_run(dry_run)
                .send()
                .await,
        )
    }

    /// Wait until every instance in the batch reports `terminated`.
    ///
    /// In dry-run mode this is a single permission probe: a DescribeInstances
    /// call with the dry-run flag, with no polling.
    pub async fn wait_terminated(
        &self,
        instance_ids: &[String],
        config: &WaitConfig,
        dry_run: bool,
    ) -> Result<(), AwsError> {
        if instance_ids.is_empty() {
            return Ok(());
        }

        if dry_run {
            return dry_run_ok(
                self.client
                    .describe_instances()
                    .set_instance_ids(Some(instance_ids.to_vec()))
                    .dry_run(true)
                    .send()
                    .await,
            )
            .map_err(|e| AwsError::Waiter {
                message: e.to_string(),
            });
        }

        wait_for_resource(
            config,
            || async {
                let response = self
                    .client
                    .describe_instances()
                    .set_instance_ids(Some(instance_ids.to_vec()))
                    .send()
                    .await;

                match response {
                    Ok(resp) => {
                        let pending =
                            pending_count(resp.reservations().iter().flat_map(|r| r.instances()));
                        debug!(region = %self.region(), pending, "Checked instance termination");
                        Ok(pending == 0)
                    }
                    Err(e) => {
                        let err = classify_sdk_error(&e);
                        if err.is_not_found() {
                            // Already gone
                            Ok(true)
                        } else {
                            warn!(region = %self.region(), error = %err, "Error checking instance state");
                            Ok(false)
                        }
                    }
                }
            },
            &format!("{} instance(s) in {} terminated", instance_ids.len(), self.region()),
        )
        .await
        .map(|_| ())
        .map_err(|e| AwsError::Waiter {
            message: e.to_string(),
        })
    }

    /// Instances that reference the security group
    pub async fn list_dependent_instances(&self, group_id: &str) -> Result<Vec<String>, AwsError> {
        let filter = Filter::builder()
            .name("instance.group-id")
            .values(group_id)
            .build();

        let ids: Vec<String> = self
            .describe_instances_paged(Some(filter))
            .await?
            .into_iter()
            .map(|i| i.instance_id)
            .collect();

        debug!(group_id = %group_id, count = ids.len(), "Looked up dependent instances");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{Instance as SdkInstance, InstanceState};

    fn in_state(name: Option<InstanceStateName>) -> SdkInstance {
        let builder = SdkInstance::builder().instance_id("i-1");
        match name {
            Some(name) => builder.state(InstanceState::builder().name(name).build()).build(),
            None => builder.build(),
        }
    }

    #[test]
    fn only_terminated_instances_are_done() {
        let instances = [
            in_state(Some(InstanceStateName::Terminated)),
            in_state(Some(InstanceStateName::ShuttingDown)),
            in_state(Some(InstanceStateName::Terminated)),
        ];
        assert_eq!(pending_count(&instances), 1);
    }

    #[test]
    fn instance_without_state_is_still_pending() {
        let instances = [
            in_state(Some(InstanceStateName::Terminated)),
            in_state(None),
            SdkInstance::builder()
                .instance_id("i-2")
                .state(InstanceState::builder().code(48).build())
                .build(),
        ];
        assert_eq!(pending_count(&instances), 2);
    }

    #[test]
    fn empty_response_has_nothing_pending() {
        assert_eq!(pending_count(std::iter::empty()), 0);
    }
}
