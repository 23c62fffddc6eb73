//! S3 upload of finished reports and log files

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_s3::{Client, primitives::ByteStream};
use std::path::Path;
use tracing::{debug, info};

/// S3 client for sharing run artifacts
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Create an S3 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Upload a file to S3
    pub async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        debug!(bucket = %bucket, key = %key, path = %path.display(), "Uploading file");

        let body = ByteStream::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .context("Failed to upload file")?;

        info!(bucket = %bucket, key = %key, "Uploaded");
        Ok(())
    }
}

/// Object key for an uploaded artifact: its file name, or the full path when
/// the path has no file name component.
pub fn object_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_uses_file_name() {
        assert_eq!(
            object_key(Path::new("/tmp/reports/ServiceCleaner_2024.json")),
            "ServiceCleaner_2024.json"
        );
        assert_eq!(object_key(Path::new("clean_log.log")), "clean_log.log");
    }
}
