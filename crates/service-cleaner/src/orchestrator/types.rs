//! Orchestrator configuration types

use crate::aws::account::AccountId;
use crate::wait::WaitConfig;
use serde::{Deserialize, Serialize};
use service_cleaner_common::ResourceKind;

/// Which resource kinds a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OperationMode {
    /// Instances, volumes, images and snapshots
    Storage,
    /// Security groups only
    #[value(name = "sg")]
    SecurityGroups,
    /// Storage kinds, then security groups
    All,
}

impl OperationMode {
    /// Whether a run in this mode visits `kind`
    pub fn covers(self, kind: ResourceKind) -> bool {
        match self {
            OperationMode::Storage => kind != ResourceKind::SecurityGroup,
            OperationMode::SecurityGroups => kind == ResourceKind::SecurityGroup,
            OperationMode::All => true,
        }
    }

    /// Kinds visited by this mode, ordered by cleanup priority
    pub fn kinds(self) -> Vec<ResourceKind> {
        let mut kinds: Vec<ResourceKind> = ResourceKind::ALL
            .into_iter()
            .filter(|&kind| self.covers(kind))
            .collect();
        kinds.sort_by_key(|kind| kind.cleanup_priority());
        kinds
    }
}

/// What to do with volumes in a region whose termination wait failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum WaitTimeoutAction {
    /// Clean volumes anyway
    #[default]
    Continue,
    /// Skip volume cleanup in that region and report the skip
    SkipVolumes,
}

/// Settings the cleaner needs once configuration has been resolved
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// Owner filter for snapshots and images
    pub account_id: AccountId,
    pub wait: WaitConfig,
    pub on_wait_timeout: WaitTimeoutAction,
}

/// A resource client paired with the region it serves
#[derive(Debug)]
pub struct RegionClient<C> {
    pub region: String,
    pub client: C,
}

impl<C> RegionClient<C> {
    pub fn new(region: impl Into<String>, client: C) -> Self {
        Self {
            region: region.into(),
            client,
        }
    }
}
