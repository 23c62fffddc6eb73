//! Shared utilities for AWS integration tests

use service_cleaner::aws::{AccountId, AwsContext, get_current_account_id};

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-2
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| "us-east-2".to_string())
}

/// Context for the test region plus the caller's account
pub async fn test_context() -> (AwsContext, AccountId) {
    let ctx = AwsContext::new(&get_test_region()).await;
    let account_id = get_current_account_id(ctx.sdk_config())
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");
    (ctx, account_id)
}
