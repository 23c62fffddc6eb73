//! service-cleaner - tag-driven cleanup of EC2 resources
//!
//! Scans the configured regions for instances, volumes, images, snapshots
//! and security groups, decides per resource from its `keep` tag and
//! relationships whether to keep, stop or remove it, acts (or dry-runs), and
//! reports one outcome record per resource.

pub mod aws;
pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod policy;
pub mod record;
pub mod report;
pub mod scanner;
pub mod sg_report;
pub mod wait;
