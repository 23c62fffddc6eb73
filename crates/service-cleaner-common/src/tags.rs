//! Retention tag constants
//!
//! The cleaner recognises exactly one reserved tag key. Its meaning differs
//! per resource kind:
//!
//! | Kind | `keep` semantics |
//! |------|------------------|
//! | Instance | `on` protects, `off` stops, anything else terminates |
//! | Image | presence (any value) protects |
//! | Security group | presence protects an unattached group |
//! | Volume, Snapshot | not consulted |

/// Tag key that marks a resource for retention
pub const TAG_KEEP: &str = "keep";

/// `keep` tag values understood for instances
pub mod keep {
    /// Leave the instance running
    pub const ON: &str = "on";

    /// Stop the instance but do not terminate it
    pub const OFF: &str = "off";
}
