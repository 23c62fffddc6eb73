//! AWS account identity

use anyhow::{Context, Result};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
///
/// Snapshots and images are listed by owner, so the account the cleaner acts
/// on is pinned once at startup and passed around as this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    /// Parse an account ID, requiring exactly twelve ASCII digits.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        (s.len() == 12 && s.bytes().all(|b| b.is_ascii_digit())).then(|| AccountId(s.to_string()))
    }

    /// The account ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Fetch the current AWS account ID from credentials via STS GetCallerIdentity
///
/// Requires no special permissions; it succeeds whenever credentials are
/// valid.
pub async fn get_current_account_id(config: &aws_config::SdkConfig) -> Result<AccountId> {
    let sts = aws_sdk_sts::Client::new(config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;

    info!(account_id = %account, "AWS account resolved");

    AccountId::parse(account).with_context(|| format!("STS returned malformed account ID: {account}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_twelve_digits() {
        let id = AccountId::parse(" 123456789012 ").unwrap();
        assert_eq!(id.as_str(), "123456789012");
        assert_eq!(id.to_string(), "123456789012");
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(AccountId::parse("12345").is_none());
        assert!(AccountId::parse("1234567890123").is_none());
        assert!(AccountId::parse("12345678901a").is_none());
        assert!(AccountId::parse("").is_none());
    }
}
