//! Cleanup orchestration
//!
//! Sequences the per-kind scans over every configured region. Instances are
//! processed (and their termination waited on) in all regions before volumes
//! are listed anywhere, so volumes freed by terminated instances show up as
//! `available`.

mod types;

pub use types::{CleanerConfig, OperationMode, RegionClient, WaitTimeoutAction};

use crate::aws::ec2::ResourceOperations;
use crate::policy::Decision;
use crate::record::{BatchAction, CleanupError, OutcomeRecord, Subject};
use crate::report::OutcomeReporter;
use crate::scanner::RegionScanner;
use crate::wait::WaitConfig;
use service_cleaner_common::ResourceKind;
use std::collections::HashSet;
use tracing::{info, warn};

/// Runs one cleanup pass over all configured regions
pub struct Cleaner<C: ResourceOperations, R: OutcomeReporter> {
    owner: String,
    wait: WaitConfig,
    on_wait_timeout: WaitTimeoutAction,
    clients: Vec<RegionClient<C>>,
    reporter: R,
}

impl<C: ResourceOperations, R: OutcomeReporter> Cleaner<C, R> {
    pub fn new(config: &CleanerConfig, clients: Vec<RegionClient<C>>, reporter: R) -> Self {
        Self {
            owner: config.account_id.to_string(),
            wait: config.wait.clone(),
            on_wait_timeout: config.on_wait_timeout,
            clients,
            reporter,
        }
    }

    /// Visit every kind of `mode` in every region, forwarding each record to
    /// the reporter as it is produced. Returns all records.
    pub async fn run(&mut self, mode: OperationMode, dry_run: bool) -> Vec<OutcomeRecord> {
        info!(
            ?mode,
            dry_run,
            regions = self.clients.len(),
            "Starting cleanup"
        );

        let mut records = Vec::new();
        let mut unconfirmed_regions: HashSet<String> = HashSet::new();

        for kind in mode.kinds() {
            for rc in &self.clients {
                if kind == ResourceKind::Volume
                    && self.on_wait_timeout == WaitTimeoutAction::SkipVolumes
                    && unconfirmed_regions.contains(&rc.region)
                {
                    warn!(region = %rc.region, "Skipping volume cleanup, instance termination unconfirmed");
                    let record = skipped_volumes(&rc.region);
                    self.reporter.record(&record);
                    records.push(record);
                    continue;
                }

                let outcome = RegionScanner::new(&rc.client, &rc.region, &self.owner, &self.wait)
                    .scan(kind, dry_run)
                    .await;

                if !outcome.termination_confirmed {
                    unconfirmed_regions.insert(rc.region.clone());
                }

                for record in outcome.records {
                    self.reporter.record(&record);
                    records.push(record);
                }
            }
        }

        let errors = records.iter().filter(|r| r.error.is_some()).count();
        info!(records = records.len(), errors, "Cleanup finished");
        records
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

fn skipped_volumes(region: &str) -> OutcomeRecord {
    OutcomeRecord::new(
        ResourceKind::Volume,
        region,
        Subject::Batch {
            action: BatchAction::VolumeCleanup,
            instance_ids: Vec::new(),
        },
        Decision::NoOp,
    )
    .with_error(Some(CleanupError::Skipped {
        reason: "instance termination was not confirmed in this region".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::account::AccountId;
    use crate::aws::ec2::{Image, Instance, MockResourceOperations, SecurityGroup, Tags, Volume};
    use crate::aws::error::AwsError;
    use crate::report::MemoryReporter;
    use mockall::Sequence;

    fn config(on_wait_timeout: WaitTimeoutAction) -> CleanerConfig {
        CleanerConfig {
            account_id: AccountId::parse("123456789012").unwrap(),
            wait: WaitConfig::default(),
            on_wait_timeout,
        }
    }

    fn tagged(pairs: &[(&str, &str)]) -> Option<Tags> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn instance(id: &str, tags: Option<Tags>) -> Instance {
        Instance {
            instance_id: id.to_string(),
            tags,
            ..Default::default()
        }
    }

    fn volume(id: &str, state: &str) -> Volume {
        Volume {
            volume_id: id.to_string(),
            state: state.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn instances_are_waited_on_before_volumes_in_any_region() {
        let mut seq = Sequence::new();
        let mut east = MockResourceOperations::new();
        let mut west = MockResourceOperations::new();

        east.expect_list_instances()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![instance("i-east", None)]));
        east.expect_terminate_instances()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        east.expect_wait_terminated()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        west.expect_list_instances()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Vec::new()));
        east.expect_list_volumes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![volume("vol-east", "available")]));
        east.expect_delete_volume()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        west.expect_list_volumes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Vec::new()));

        for mock in [&mut east, &mut west] {
            mock.expect_list_images().returning(|_| Ok(Vec::new()));
            mock.expect_list_snapshots().returning(|_| Ok(Vec::new()));
        }

        let mut cleaner = Cleaner::new(
            &config(WaitTimeoutAction::Continue),
            vec![
                RegionClient::new("us-east-1", east),
                RegionClient::new("us-west-2", west),
            ],
            MemoryReporter::default(),
        );

        let records = cleaner.run(OperationMode::Storage, false).await;

        let kinds: Vec<_> = records.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![ResourceKind::Instance, ResourceKind::Volume]);
        assert_eq!(cleaner.into_reporter().records, records);
    }

    #[tokio::test]
    async fn dry_run_matches_live_decisions() {
        fn mock_for(dry_run: bool) -> MockResourceOperations {
            let mut mock = MockResourceOperations::new();
            mock.expect_list_instances().returning(|| {
                Ok(vec![
                    instance("i-1", tagged(&[("keep", "on")])),
                    instance("i-2", tagged(&[("keep", "off")])),
                    instance("i-3", None),
                ])
            });
            mock.expect_stop_instances()
                .withf(move |_, d| *d == dry_run)
                .returning(|_, _| Ok(()));
            mock.expect_terminate_instances()
                .withf(move |_, d| *d == dry_run)
                .returning(|_, _| Ok(()));
            mock.expect_wait_terminated()
                .withf(move |_, _, d| *d == dry_run)
                .returning(|_, _, _| Ok(()));
            mock.expect_list_volumes()
                .returning(|| Ok(vec![volume("vol-1", "available"), volume("vol-2", "in-use")]));
            mock.expect_delete_volume()
                .withf(move |_, d| *d == dry_run)
                .returning(|_, _| Ok(()));
            mock.expect_list_images().returning(|_| Ok(Vec::new()));
            mock.expect_list_snapshots().returning(|_| Ok(Vec::new()));
            mock
        }

        let mut results = Vec::new();
        for dry_run in [true, false] {
            let mut cleaner = Cleaner::new(
                &config(WaitTimeoutAction::Continue),
                vec![RegionClient::new("us-east-1", mock_for(dry_run))],
                MemoryReporter::default(),
            );
            results.push(cleaner.run(OperationMode::Storage, dry_run).await);
        }

        assert_eq!(results[0], results[1]);
        let decisions: Vec<_> = results[0].iter().map(|r| r.decision).collect();
        assert_eq!(
            decisions,
            vec![
                Decision::NoOp,
                Decision::Shutdown,
                Decision::Terminate,
                Decision::Terminate,
                Decision::NoOp,
            ]
        );
    }

    #[tokio::test]
    async fn image_list_failure_does_not_stop_the_run() {
        let mut mock = MockResourceOperations::new();
        mock.expect_list_instances().returning(|| Ok(Vec::new()));
        mock.expect_list_volumes().returning(|| Ok(Vec::new()));
        mock.expect_list_images().times(1).returning(|_| {
            Err(AwsError::Unauthorized {
                code: "UnauthorizedOperation".to_string(),
                message: "denied".to_string(),
            })
        });
        mock.expect_list_snapshots()
            .times(1)
            .returning(|_| Ok(Vec::new()));
        mock.expect_list_security_groups().times(1).returning(|| {
            Ok(vec![SecurityGroup {
                group_id: "sg-1".to_string(),
                tags: tagged(&[("keep", "1")]),
                ..Default::default()
            }])
        });
        mock.expect_list_dependent_instances()
            .returning(|_| Ok(Vec::new()));
        mock.expect_delete_security_group().never();

        let mut cleaner = Cleaner::new(
            &config(WaitTimeoutAction::Continue),
            vec![RegionClient::new("eu-west-1", mock)],
            MemoryReporter::default(),
        );

        let records = cleaner.run(OperationMode::All, false).await;

        assert!(records.iter().all(|r| r.kind != ResourceKind::Image));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, ResourceKind::SecurityGroup);
    }

    #[tokio::test]
    async fn security_group_mode_skips_storage() {
        let mut mock = MockResourceOperations::new();
        mock.expect_list_instances().never();
        mock.expect_list_volumes().never();
        mock.expect_list_security_groups()
            .times(1)
            .returning(|| Ok(Vec::new()));

        let mut cleaner = Cleaner::new(
            &config(WaitTimeoutAction::Continue),
            vec![RegionClient::new("us-east-1", mock)],
            MemoryReporter::default(),
        );

        assert!(cleaner.run(OperationMode::SecurityGroups, true).await.is_empty());
    }

    fn timing_out_region() -> MockResourceOperations {
        let mut mock = MockResourceOperations::new();
        mock.expect_list_instances()
            .returning(|| Ok(vec![instance("i-slow", None)]));
        mock.expect_terminate_instances().returning(|_, _| Ok(()));
        mock.expect_wait_terminated().returning(|_, _, _| {
            Err(AwsError::Waiter {
                message: "Timeout waiting".to_string(),
            })
        });
        mock.expect_list_images().returning(|_| Ok(Vec::new()));
        mock.expect_list_snapshots().returning(|_| Ok(Vec::new()));
        mock
    }

    #[tokio::test]
    async fn wait_timeout_continues_by_default() {
        let mut mock = timing_out_region();
        mock.expect_list_volumes()
            .times(1)
            .returning(|| Ok(vec![volume("vol-1", "available")]));
        mock.expect_delete_volume().times(1).returning(|_, _| Ok(()));

        let mut cleaner = Cleaner::new(
            &config(WaitTimeoutAction::Continue),
            vec![RegionClient::new("us-east-1", mock)],
            MemoryReporter::default(),
        );

        let records = cleaner.run(OperationMode::Storage, false).await;

        // instance, wait batch, volume
        assert_eq!(records.len(), 3);
        assert!(matches!(records[1].error, Some(CleanupError::Waiter { .. })));
        assert_eq!(records[2].decision, Decision::Terminate);
    }

    #[tokio::test]
    async fn wait_timeout_can_skip_volumes() {
        let mut unconfirmed = timing_out_region();
        unconfirmed.expect_list_volumes().never();

        let mut healthy = MockResourceOperations::new();
        healthy.expect_list_instances().returning(|| Ok(Vec::new()));
        healthy.expect_list_volumes()
            .times(1)
            .returning(|| Ok(Vec::new()));
        healthy.expect_list_images().returning(|_| Ok(vec![Image::default()]));
        healthy.expect_deregister_image().returning(|_, _| Ok(()));
        healthy.expect_list_snapshots().returning(|_| Ok(Vec::new()));

        let mut cleaner = Cleaner::new(
            &config(WaitTimeoutAction::SkipVolumes),
            vec![
                RegionClient::new("us-east-1", unconfirmed),
                RegionClient::new("eu-west-1", healthy),
            ],
            MemoryReporter::default(),
        );

        let records = cleaner.run(OperationMode::Storage, false).await;

        let skipped: Vec<_> = records
            .iter()
            .filter(|r| matches!(r.error, Some(CleanupError::Skipped { .. })))
            .collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].kind, ResourceKind::Volume);
        assert_eq!(skipped[0].region, "us-east-1");
        assert!(records.iter().any(|r| r.kind == ResourceKind::Image));
    }
}
