//! Default configuration values
//!
//! These constants keep the CLI and config-file defaults in one place.

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "cleaner.json";

/// Delay between instance termination polls, in seconds
pub const DEFAULT_WAIT_DELAY_SECS: u64 = 15;

/// Maximum instance termination polls before giving up
pub const DEFAULT_WAIT_MAX_ATTEMPTS: u32 = 12;

/// Prefix of the cleanup report file name
pub const REPORT_FILE_PREFIX: &str = "ServiceCleaner_";

/// Prefix of the security group audit report file name
pub const SG_REPORT_FILE_PREFIX: &str = "SG_report_";

/// Prefix of the optional log file name
pub const LOG_FILE_PREFIX: &str = "clean_log_";

/// Timestamp format appended to report and log file names
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%b-%d_%H-%M-%S";

// Serde default functions for struct field defaults

/// Returns the default wait delay
pub fn default_wait_delay_secs() -> u64 {
    DEFAULT_WAIT_DELAY_SECS
}

/// Returns the default wait attempt budget
pub fn default_wait_max_attempts() -> u32 {
    DEFAULT_WAIT_MAX_ATTEMPTS
}
