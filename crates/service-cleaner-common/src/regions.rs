//! Regions the cleaner knows how to visit

/// Every region accepted in configuration. `regions.all = true` expands to
/// this list, in this order.
pub const KNOWN_REGIONS: &[&str] = &[
    "eu-north-1",
    "ap-south-1",
    "eu-west-3",
    "eu-west-2",
    "eu-west-1",
    "ap-northeast-2",
    "ap-northeast-1",
    "sa-east-1",
    "ca-central-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "eu-central-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

/// Check whether `region` (surrounding whitespace ignored) is a known region
pub fn is_known_region(region: &str) -> bool {
    KNOWN_REGIONS.contains(&region.trim())
}
