//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once per region and
//! creating multiple service clients from the same config.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

/// Shared AWS configuration context for creating service clients.
///
/// # Example
/// ```ignore
/// let aws = AwsContext::new("us-east-1").await;
///
/// let ec2 = Ec2Client::from_context(&aws);
/// let s3 = S3Client::from_context(&aws);
/// ```
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
    region: String,
}

impl AwsContext {
    /// Load AWS configuration for the specified region.
    ///
    /// Credentials come from the environment, config files, or instance
    /// roles.
    pub async fn new(region: &str) -> Self {
        Self::with_profile(region, None).await
    }

    /// Load AWS configuration for a region using a named profile.
    pub async fn with_profile(region: &str, profile: Option<&str>) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));

        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }

        Self {
            config: Arc::new(loader.load().await),
            region: region.to_string(),
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Get the region string.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Create an EC2 client from this context.
    pub fn ec2_client(&self) -> aws_sdk_ec2::Client {
        aws_sdk_ec2::Client::new(self.sdk_config())
    }

    /// Create an S3 client from this context.
    pub fn s3_client(&self) -> aws_sdk_s3::Client {
        aws_sdk_s3::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_context_creation() {
        let ctx = AwsContext::new("us-east-1").await;
        assert_eq!(ctx.region(), "us-east-1");
    }
}
