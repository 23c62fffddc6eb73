//! service-cleaner-common - Shared types and constants
//!
//! This crate holds the vocabulary shared by the cleanup engine and its
//! report sinks, without any AWS SDK dependencies to keep it lightweight.
//!
//! ## Modules
//!
//! - [`defaults`]: Default configuration values
//! - [`regions`]: The set of regions the cleaner knows how to visit
//! - [`resource_kind`]: Resource kinds and their cleanup ordering
//! - [`tags`]: The reserved retention tag and its values

pub mod defaults;
pub mod regions;
pub mod resource_kind;
pub mod tags;

// Re-export commonly used types
pub use regions::{KNOWN_REGIONS, is_known_region};
pub use resource_kind::ResourceKind;
