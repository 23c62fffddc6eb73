//! AWS client modules for the cleaner
//!
//! This module provides wrappers around AWS SDK clients for:
//! - EC2: Listing and removing instances, volumes, images, snapshots and
//!   security groups
//! - S3: Uploading the finished report and log file
//! - STS: Account ID lookup

pub mod account;
pub mod context;
pub mod ec2;
pub mod error;
pub mod s3;

pub use account::{AccountId, get_current_account_id};
pub use context::AwsContext;
pub use ec2::{Ec2Client, ResourceOperations};
pub use error::{AwsError, classify_aws_error, classify_sdk_error};
pub use s3::S3Client;
