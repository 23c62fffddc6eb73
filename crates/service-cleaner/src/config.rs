//! Cleaner configuration
//!
//! Loaded from a JSON file (default `cleaner.json`), overridden by CLI flags,
//! then resolved into the settings the engine runs with.

use crate::aws::account::AccountId;
use crate::orchestrator::WaitTimeoutAction;
use crate::wait::WaitConfig;
use anyhow::{Context, Result};
use garde::Validate;
use serde::Deserialize;
use service_cleaner_common::defaults::{default_wait_delay_secs, default_wait_max_attempts};
use service_cleaner_common::{KNOWN_REGIONS, is_known_region};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] garde::Report),

    #[error("account_id must be 12 digits, got {0:?}")]
    InvalidAccountId(String),

    #[error("no valid regions configured (known regions: {})", KNOWN_REGIONS.join(", "))]
    NoRegions,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Region selection
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegionSelection {
    /// Visit every known region, ignoring `list`
    #[serde(default)]
    #[garde(skip)]
    pub all: bool,

    #[serde(default)]
    #[garde(skip)]
    pub list: Vec<String>,
}

/// Termination wait settings
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WaitSettings {
    /// Seconds between termination polls
    #[serde(default = "default_wait_delay_secs")]
    #[garde(range(min = 1))]
    pub delay_secs: u64,

    /// Polls before the wait is reported as failed
    #[serde(default = "default_wait_max_attempts")]
    #[garde(range(min = 1))]
    pub max_attempts: u32,

    #[serde(default)]
    #[garde(skip)]
    pub on_timeout: WaitTimeoutAction,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            delay_secs: default_wait_delay_secs(),
            max_attempts: default_wait_max_attempts(),
            on_timeout: WaitTimeoutAction::default(),
        }
    }
}

/// Contents of the config file
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfigFile {
    /// Account to clean; resolved from credentials when absent
    #[serde(default)]
    #[garde(skip)]
    pub account_id: Option<String>,

    #[serde(default)]
    #[garde(dive)]
    pub regions: RegionSelection,

    #[serde(default)]
    #[garde(dive)]
    pub wait: WaitSettings,

    /// Directory the reports are written to
    #[serde(default = "default_report_dir")]
    #[garde(skip)]
    pub report_dir: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            account_id: None,
            regions: RegionSelection::default(),
            wait: WaitSettings::default(),
            report_dir: default_report_dir(),
        }
    }
}

/// Command-line overrides. `None`/empty leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Replaces the configured region list
    pub regions: Vec<String>,
    pub account_id: Option<String>,
    pub poll_delay_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub on_wait_timeout: Option<WaitTimeoutAction>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// `None` means "ask STS"
    pub account_id: Option<AccountId>,
    pub regions: Vec<String>,
    pub wait: WaitConfig,
    pub on_wait_timeout: WaitTimeoutAction,
    pub report_dir: PathBuf,
}

impl ConfigFile {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load `path`, or fall back to defaults when the file does not exist and
    /// was not asked for explicitly.
    pub fn load_or_default(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Apply overrides, validate, and resolve the region list.
    pub fn resolve(mut self, overrides: &Overrides) -> Result<Settings, ConfigError> {
        if !overrides.regions.is_empty() {
            self.regions = RegionSelection {
                all: false,
                list: overrides.regions.clone(),
            };
        }
        if let Some(account_id) = &overrides.account_id {
            self.account_id = Some(account_id.clone());
        }
        if let Some(delay) = overrides.poll_delay_secs {
            self.wait.delay_secs = delay;
        }
        if let Some(attempts) = overrides.max_attempts {
            self.wait.max_attempts = attempts;
        }
        if let Some(action) = overrides.on_wait_timeout {
            self.wait.on_timeout = action;
        }

        self.validate()?;

        let account_id = self
            .account_id
            .as_deref()
            .map(|raw| AccountId::parse(raw).ok_or_else(|| ConfigError::InvalidAccountId(raw.to_string())))
            .transpose()?;

        let regions = select_regions(&self.regions);
        if regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }

        Ok(Settings {
            account_id,
            regions,
            wait: WaitConfig {
                delay: Duration::from_secs(self.wait.delay_secs),
                max_attempts: self.wait.max_attempts,
            },
            on_wait_timeout: self.wait.on_timeout,
            report_dir: self.report_dir,
        })
    }
}

/// Expand `all`, or keep the listed regions that are known. Unknown entries
/// are logged and dropped; duplicates are removed.
pub fn select_regions(selection: &RegionSelection) -> Vec<String> {
    if selection.all {
        return KNOWN_REGIONS.iter().map(|r| r.to_string()).collect();
    }

    let mut regions: Vec<String> = Vec::new();
    for raw in &selection.list {
        let region = raw.trim();
        if !is_known_region(region) {
            error!(region = %raw, "Unknown region in config, skipping");
            continue;
        }
        if !regions.iter().any(|r| r == region) {
            regions.push(region.to_string());
        }
    }
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn load_full_config() {
        let file = write_config(
            r#"{
                "account_id": "123456789012",
                "regions": { "all": false, "list": ["us-east-1", " eu-west-1 "] },
                "wait": { "delay_secs": 5, "max_attempts": 3, "on_timeout": "skip_volumes" },
                "report_dir": "reports"
            }"#,
        );

        let settings = ConfigFile::load(file.path())
            .unwrap()
            .resolve(&Overrides::default())
            .unwrap();

        assert_eq!(settings.account_id.unwrap().as_str(), "123456789012");
        assert_eq!(settings.regions, vec!["us-east-1", "eu-west-1"]);
        assert_eq!(settings.wait.delay, Duration::from_secs(5));
        assert_eq!(settings.wait.max_attempts, 3);
        assert_eq!(settings.on_wait_timeout, WaitTimeoutAction::SkipVolumes);
        assert_eq!(settings.report_dir, PathBuf::from("reports"));
    }

    #[test]
    fn defaults_apply() {
        let file = write_config(r#"{ "regions": { "list": ["us-west-2"] } }"#);

        let settings = ConfigFile::load(file.path())
            .unwrap()
            .resolve(&Overrides::default())
            .unwrap();

        assert_eq!(settings.account_id, None);
        assert_eq!(settings.wait, WaitConfig::default());
        assert_eq!(settings.on_wait_timeout, WaitTimeoutAction::Continue);
        assert_eq!(settings.report_dir, PathBuf::from("."));
    }

    #[test]
    fn all_regions_expands_known_set() {
        let regions = select_regions(&RegionSelection {
            all: true,
            list: vec!["ignored".to_string()],
        });
        assert_eq!(regions.len(), KNOWN_REGIONS.len());
    }

    #[test]
    fn unknown_regions_are_dropped() {
        let regions = select_regions(&RegionSelection {
            all: false,
            list: vec![
                "us-east-1".to_string(),
                "mars-north-1".to_string(),
                "us-east-1".to_string(),
            ],
        });
        assert_eq!(regions, vec!["us-east-1"]);
    }

    #[test]
    fn no_valid_regions_is_an_error() {
        let file = write_config(r#"{ "regions": { "list": ["nowhere-1"] } }"#);
        let err = ConfigFile::load(file.path())
            .unwrap()
            .resolve(&Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoRegions));
    }

    #[test]
    fn malformed_account_id_is_rejected() {
        let err = ConfigFile::default()
            .resolve(&Overrides {
                regions: vec!["us-east-1".to_string()],
                account_id: Some("12-34".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAccountId(_)));
    }

    #[test]
    fn zero_attempts_fail_validation() {
        let file = write_config(r#"{ "regions": { "all": true }, "wait": { "max_attempts": 0 } }"#);
        let err = ConfigFile::load(file.path())
            .unwrap()
            .resolve(&Overrides::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overrides_win() {
        let file = write_config(
            r#"{ "regions": { "all": true }, "wait": { "delay_secs": 30, "on_timeout": "continue" } }"#,
        );

        let settings = ConfigFile::load(file.path())
            .unwrap()
            .resolve(&Overrides {
                regions: vec!["ap-south-1".to_string()],
                account_id: Some("210987654321".to_string()),
                poll_delay_secs: Some(2),
                max_attempts: Some(40),
                on_wait_timeout: Some(WaitTimeoutAction::SkipVolumes),
            })
            .unwrap();

        assert_eq!(settings.regions, vec!["ap-south-1"]);
        assert_eq!(settings.account_id.unwrap().as_str(), "210987654321");
        assert_eq!(settings.wait.delay, Duration::from_secs(2));
        assert_eq!(settings.wait.max_attempts, 40);
        assert_eq!(settings.on_wait_timeout, WaitTimeoutAction::SkipVolumes);
    }

    #[test]
    fn missing_default_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cleaner.json");

        assert!(ConfigFile::load_or_default(&path, false).is_ok());
        assert!(ConfigFile::load_or_default(&path, true).is_err());
    }

    #[test]
    fn invalid_json_reports_path() {
        let file = write_config("{ not json");
        let err = ConfigFile::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
