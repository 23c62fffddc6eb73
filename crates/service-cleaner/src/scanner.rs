//! Per-region, per-kind scanning
//!
//! A scan lists every resource of one kind in one region, decides what to do
//! with each, performs the action (honouring dry-run) and produces exactly one
//! [`OutcomeRecord`] per resource. Failures are attached to records; a scan
//! never aborts half way.

use crate::aws::ec2::{Instance, ResourceOperations};
use crate::aws::error::AwsError;
use crate::policy::{Decision, Facts, decide};
use crate::record::{BatchAction, CleanupError, OutcomeRecord, Subject};
use crate::wait::WaitConfig;
use service_cleaner_common::ResourceKind;
use tracing::{debug, error, info, warn};

/// Result of scanning one kind in one region
#[derive(Debug)]
pub struct ScanOutcome {
    pub records: Vec<OutcomeRecord>,
    /// False when a terminate batch was issued but its completion wait failed
    pub termination_confirmed: bool,
}

impl ScanOutcome {
    fn from_records(records: Vec<OutcomeRecord>) -> Self {
        Self {
            records,
            termination_confirmed: true,
        }
    }
}

/// Scanner bound to one region's client
pub struct RegionScanner<'a, C: ResourceOperations> {
    client: &'a C,
    region: &'a str,
    owner: &'a str,
    wait: &'a WaitConfig,
}

impl<'a, C: ResourceOperations> RegionScanner<'a, C> {
    /// `owner` is the account id used to filter snapshots and images.
    pub fn new(client: &'a C, region: &'a str, owner: &'a str, wait: &'a WaitConfig) -> Self {
        Self {
            client,
            region,
            owner,
            wait,
        }
    }

    /// Scan one resource kind. A listing failure yields no records.
    pub async fn scan(&self, kind: ResourceKind, dry_run: bool) -> ScanOutcome {
        info!(region = %self.region, kind = %kind, dry_run, "Scanning");

        let result = match kind {
            ResourceKind::Instance => self.scan_instances(dry_run).await,
            ResourceKind::Volume => self.scan_volumes(dry_run).await.map(ScanOutcome::from_records),
            ResourceKind::Image => self.scan_images(dry_run).await.map(ScanOutcome::from_records),
            ResourceKind::Snapshot => self
                .scan_snapshots(dry_run)
                .await
                .map(ScanOutcome::from_records),
            ResourceKind::SecurityGroup => self
                .scan_security_groups(dry_run)
                .await
                .map(ScanOutcome::from_records),
        };

        match result {
            Ok(outcome) => {
                debug!(
                    region = %self.region,
                    kind = %kind,
                    records = outcome.records.len(),
                    "Scan complete"
                );
                outcome
            }
            Err(e) => {
                error!(region = %self.region, kind = %kind, error = %e, "Failed to list resources");
                ScanOutcome::from_records(Vec::new())
            }
        }
    }

    fn log_failure(&self, kind: ResourceKind, id: &str, action: &str, err: &AwsError) {
        match err.suggestion() {
            Some(hint) => warn!(
                region = %self.region,
                kind = %kind,
                id = %id,
                action,
                error = %err,
                hint,
                "Cleanup action failed"
            ),
            None => warn!(
                region = %self.region,
                kind = %kind,
                id = %id,
                action,
                error = %err,
                "Cleanup action failed"
            ),
        }
    }

    /// Instances are stopped and terminated in one batch call each, then the
    /// terminate batch is waited on.
    async fn scan_instances(&self, dry_run: bool) -> Result<ScanOutcome, AwsError> {
        let instances = self.client.list_instances().await?;

        let decided: Vec<(Instance, Decision)> = instances
            .into_iter()
            .map(|i| {
                let decision = decide(ResourceKind::Instance, i.tags.as_ref(), Facts::None);
                (i, decision)
            })
            .collect();

        let ids_for = |wanted: Decision| -> Vec<String> {
            decided
                .iter()
                .filter(|(_, d)| *d == wanted)
                .map(|(i, _)| i.instance_id.clone())
                .collect()
        };
        let stop_ids = ids_for(Decision::Shutdown);
        let terminate_ids = ids_for(Decision::Terminate);

        let stop_error = self
            .run_batch("stop", &stop_ids, || {
                self.client.stop_instances(&stop_ids, dry_run)
            })
            .await;

        let terminate_error = self
            .run_batch("terminate", &terminate_ids, || {
                self.client.terminate_instances(&terminate_ids, dry_run)
            })
            .await;

        let mut records: Vec<OutcomeRecord> = decided
            .into_iter()
            .map(|(instance, decision)| {
                let error = match decision {
                    Decision::Shutdown => stop_error.clone(),
                    Decision::Terminate => terminate_error.clone(),
                    _ => None,
                };
                OutcomeRecord::new(
                    ResourceKind::Instance,
                    self.region,
                    Subject::Instance(instance),
                    decision,
                )
                .with_error(error)
            })
            .collect();

        let mut termination_confirmed = true;
        if !terminate_ids.is_empty() && terminate_error.is_none() {
            if let Err(e) = self
                .client
                .wait_terminated(&terminate_ids, self.wait, dry_run)
                .await
            {
                warn!(
                    region = %self.region,
                    count = terminate_ids.len(),
                    error = %e,
                    "Could not confirm instance termination"
                );
                termination_confirmed = false;
                records.push(
                    OutcomeRecord::new(
                        ResourceKind::Instance,
                        self.region,
                        Subject::Batch {
                            action: BatchAction::WaitTerminated,
                            instance_ids: terminate_ids,
                        },
                        Decision::Terminate,
                    )
                    .with_error(Some(CleanupError::Waiter {
                        message: e.to_string(),
                    })),
                );
            }
        }

        Ok(ScanOutcome {
            records,
            termination_confirmed,
        })
    }

    /// Run one batch call when there is anything to send; the error, if any,
    /// is shared by every instance in the batch.
    async fn run_batch<F, Fut>(&self, action: &str, ids: &[String], call: F) -> Option<CleanupError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<(), AwsError>>,
    {
        if ids.is_empty() {
            return None;
        }

        match call().await {
            Ok(()) => {
                info!(region = %self.region, action, count = ids.len(), "Instance batch accepted");
                None
            }
            Err(e) => {
                self.log_failure(ResourceKind::Instance, &ids.join(","), action, &e);
                Some(CleanupError::from(&e))
            }
        }
    }

    async fn scan_volumes(&self, dry_run: bool) -> Result<Vec<OutcomeRecord>, AwsError> {
        let volumes = self.client.list_volumes().await?;
        let mut records = Vec::with_capacity(volumes.len());

        for volume in volumes {
            let decision = decide(
                ResourceKind::Volume,
                volume.tags.as_ref(),
                Facts::VolumeState(&volume.state),
            );

            let error = if decision == Decision::Terminate {
                self.client
                    .delete_volume(&volume.volume_id, dry_run)
                    .await
                    .err()
                    .map(|e| {
                        self.log_failure(ResourceKind::Volume, &volume.volume_id, "delete", &e);
                        CleanupError::from(&e)
                    })
            } else {
                None
            };

            records.push(
                OutcomeRecord::new(ResourceKind::Volume, self.region, Subject::Volume(volume), decision)
                    .with_error(error),
            );
        }

        Ok(records)
    }

    async fn scan_snapshots(&self, dry_run: bool) -> Result<Vec<OutcomeRecord>, AwsError> {
        let snapshots = self.client.list_snapshots(self.owner).await?;
        let mut records = Vec::with_capacity(snapshots.len());

        for snapshot in snapshots {
            let decision = decide(ResourceKind::Snapshot, snapshot.tags.as_ref(), Facts::None);

            let error = if decision == Decision::Terminate {
                self.client
                    .delete_snapshot(&snapshot.snapshot_id, dry_run)
                    .await
                    .err()
                    .map(|e| {
                        self.log_failure(ResourceKind::Snapshot, &snapshot.snapshot_id, "delete", &e);
                        CleanupError::from(&e)
                    })
            } else {
                None
            };

            records.push(
                OutcomeRecord::new(
                    ResourceKind::Snapshot,
                    self.region,
                    Subject::Snapshot(snapshot),
                    decision,
                )
                .with_error(error),
            );
        }

        Ok(records)
    }

    async fn scan_images(&self, dry_run: bool) -> Result<Vec<OutcomeRecord>, AwsError> {
        let images = self.client.list_images(self.owner).await?;
        let mut records = Vec::with_capacity(images.len());

        for image in images {
            let decision = decide(ResourceKind::Image, image.tags.as_ref(), Facts::None);

            let error = if decision == Decision::Terminate {
                self.client
                    .deregister_image(&image.image_id, dry_run)
                    .await
                    .err()
                    .map(|e| {
                        self.log_failure(ResourceKind::Image, &image.image_id, "deregister", &e);
                        CleanupError::from(&e)
                    })
            } else {
                None
            };

            records.push(
                OutcomeRecord::new(ResourceKind::Image, self.region, Subject::Image(image), decision)
                    .with_error(error),
            );
        }

        Ok(records)
    }

    /// Each group costs one dependent-instance lookup before deciding. A
    /// failed lookup leaves the group alone.
    async fn scan_security_groups(&self, dry_run: bool) -> Result<Vec<OutcomeRecord>, AwsError> {
        let groups = self.client.list_security_groups().await?;
        let mut records = Vec::with_capacity(groups.len());

        for group in groups {
            let (attached_instances, decision, error) =
                match self.client.list_dependent_instances(&group.group_id).await {
                    Ok(attached) => {
                        let decision = decide(
                            ResourceKind::SecurityGroup,
                            group.tags.as_ref(),
                            Facts::AttachedInstances(&attached),
                        );

                        let error = if decision == Decision::Terminate {
                            self.client
                                .delete_security_group(&group.group_id, dry_run)
                                .await
                                .err()
                                .map(|e| {
                                    self.log_failure(
                                        ResourceKind::SecurityGroup,
                                        &group.group_id,
                                        "delete",
                                        &e,
                                    );
                                    CleanupError::from(&e)
                                })
                        } else {
                            None
                        };

                        (attached, decision, error)
                    }
                    Err(e) => {
                        self.log_failure(
                            ResourceKind::SecurityGroup,
                            &group.group_id,
                            "list dependents",
                            &e,
                        );
                        (Vec::new(), Decision::NoOp, Some(CleanupError::from(&e)))
                    }
                };

            records.push(
                OutcomeRecord::new(
                    ResourceKind::SecurityGroup,
                    self.region,
                    Subject::SecurityGroup {
                        group,
                        attached_instances,
                    },
                    decision,
                )
                .with_error(error),
            );
        }

        Ok(records)
    }
}
