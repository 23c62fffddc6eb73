//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt::Debug;
use thiserror::Error;

/// AWS error categories seen by the cleanup engine
///
/// Every variant except [`AwsError::Waiter`] is a rejected request (a
/// "client error"). `Waiter` means the request was accepted but its final
/// state could not be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwsError {
    /// Resource was not found
    #[error("Resource not found: {message}")]
    NotFound { code: String, message: String },

    /// Caller lacks permission for the operation
    #[error("Not authorized: {message}")]
    Unauthorized { code: String, message: String },

    /// Resource is in a state that does not allow the operation
    #[error("Incorrect resource state: {message}")]
    IncorrectState { code: String, message: String },

    /// Resource has dependent objects (e.g., SG referenced by another SG)
    #[error("Resource has dependent objects: {message}")]
    DependencyViolation { message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {message}")]
    Throttled { code: String, message: String },

    /// A dry-run request that would have succeeded
    #[error("Request would have succeeded, but DryRun flag is set")]
    DryRunOperation,

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },

    /// Asynchronous completion could not be confirmed
    #[error("Waiter failed: {message}")]
    Waiter { message: String },
}

impl AwsError {
    /// Provider error code, when one was returned
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. }
            | AwsError::Unauthorized { code, .. }
            | AwsError::IncorrectState { code, .. }
            | AwsError::Throttled { code, .. } => Some(code),
            AwsError::DependencyViolation { .. } => Some("DependencyViolation"),
            AwsError::DryRunOperation => Some(DRY_RUN_CODE),
            AwsError::Sdk { code, .. } => code.as_deref(),
            AwsError::Waiter { .. } => None,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is the provider's "dry run would have succeeded" answer
    pub fn is_dry_run_success(&self) -> bool {
        matches!(self, AwsError::DryRunOperation)
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        self.code().and_then(suggestion_for_code)
    }
}

/// Error code returned by EC2 when a dry-run request is permitted
const DRY_RUN_CODE: &str = "DryRunOperation";

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "InvalidInstanceID.NotFound",
    "InvalidVolume.NotFound",
    "InvalidSnapshot.NotFound",
    "InvalidAMIID.NotFound",
    "InvalidAMIID.Unavailable",
    "InvalidGroup.NotFound",
    "InvalidGroupId.NotFound",
];

/// Known AWS error codes for authorization failures
const UNAUTHORIZED_CODES: &[&str] = &[
    "UnauthorizedOperation",
    "AuthFailure",
    "AccessDenied",
    "OptInRequired",
];

/// Known AWS error codes for operations rejected by resource state
const INCORRECT_STATE_CODES: &[&str] = &[
    "IncorrectInstanceState",
    "IncorrectState",
    "VolumeInUse",
    "InvalidSnapshot.InUse",
    "OperationNotPermitted",
    "CannotDelete",
    "UnsupportedOperation",
];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Classify an AWS error from its code and message.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(DRY_RUN_CODE) => AwsError::DryRunOperation,
        Some("DependencyViolation") => AwsError::DependencyViolation { message },
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if UNAUTHORIZED_CODES.contains(&c) => AwsError::Unauthorized {
            code: c.to_string(),
            message,
        },
        Some(c) if INCORRECT_STATE_CODES.contains(&c) => AwsError::IncorrectState {
            code: c.to_string(),
            message,
        },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled {
            code: c.to_string(),
            message,
        },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an SDK operation error via its `ProvideErrorMetadata`.
///
/// Errors without service metadata (dispatch, timeout, response parsing)
/// become [`AwsError::Sdk`] with no code and the full error context as
/// message.
pub fn classify_sdk_error<E, R>(err: &SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    match err.code() {
        Some(code) => classify_aws_error(Some(code), err.message()),
        None => AwsError::Sdk {
            code: None,
            message: DisplayErrorContext(err).to_string(),
        },
    }
}

/// Convert an SDK result into a unit result, treating the dry-run success
/// answer as success.
pub(crate) fn dry_run_ok<T, E, R>(result: Result<T, SdkError<E, R>>) -> Result<(), AwsError>
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    match result {
        Ok(_) => Ok(()),
        Err(e) => {
            let err = classify_sdk_error(&e);
            if err.is_dry_run_success() {
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "UnauthorizedOperation",
        "Grant the cleaner's IAM principal the matching ec2:* permission.",
    ),
    (
        "AuthFailure",
        "Check that the configured credentials are valid for this region.",
    ),
    (
        "OptInRequired",
        "The region is not enabled for this account; remove it from the config.",
    ),
    (
        "IncorrectInstanceState",
        "The instance is transitioning; rerun after it settles.",
    ),
    (
        "VolumeInUse",
        "The volume was re-attached after it was listed.",
    ),
    (
        "InvalidSnapshot.InUse",
        "A registered image still references this snapshot; deregister it first.",
    ),
    (
        "DependencyViolation",
        "Another security group or network interface still references this group.",
    ),
    (
        "RequestLimitExceeded",
        "AWS API rate limit hit. Rerun later or reduce the number of regions.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<&'static str> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
}
