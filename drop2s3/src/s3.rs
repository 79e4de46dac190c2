#![doc = "S3 transport: implements the core `ObjectStore` seam with aws-sdk-s3."]
//
//! # S3 object store
//!
//! [`S3ObjectStore`] is the production [`ObjectStore`]. Credentials come from the standard
//! `aws-config` provider chain (environment, profile, SSO, instance metadata). The
//! `remote` config section can pin a region or point at an S3-compatible endpoint such as
//! MinIO; a custom endpoint switches the client to path-style addressing.
//!
//! [`build_remote`] picks between this store and the core's directory emulation.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use drop2s3_core::contract::ObjectStore;
use drop2s3_core::error::TransportError;
use drop2s3_core::remote::DirectoryObjectStore;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::load_config::RemoteSection;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub async fn connect(bucket: &str, remote: &RemoteSection) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &remote.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &remote.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }
        tracing::info!(
            bucket,
            region = ?shared.region(),
            endpoint = ?remote.endpoint_url,
            "Initialized S3 client"
        );

        Self {
            client: Client::from_conf(builder.build()),
            bucket: bucket.to_string(),
        }
    }
}

fn sdk_error(err: impl std::error::Error) -> TransportError {
    DisplayErrorContext(err).to_string().into()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, TransportError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(1000)
                .prefix(prefix);
            if let Some(token) = continuation_token.as_deref() {
                request = request.continuation_token(token);
            }

            let output = request.send().await.map_err(sdk_error)?;
            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            if output.is_truncated().unwrap_or(false) {
                continuation_token = output.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        tracing::debug!(bucket = %self.bucket, prefix, count = keys.len(), "[SCAN] Listed S3 objects");
        keys.sort();
        Ok(keys)
    }

    async fn upload(&self, local_path: &Path, key: &str) -> Result<(), TransportError> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| format!("Failed to stream {}: {e}", local_path.display()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(sdk_error)?;
        tracing::debug!(bucket = %self.bucket, key, "[UPLOAD] put_object done");
        Ok(())
    }

    async fn download(&self, key: &str, local_path: &Path) -> Result<(), TransportError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(sdk_error)?;

        let written = match write_body(output.body, local_path).await {
            Ok(written) => written,
            Err(err) => {
                // A partial file would read as staged on the next scan.
                let _ = tokio::fs::remove_file(local_path).await;
                return Err(err);
            }
        };
        tracing::debug!(bucket = %self.bucket, key, bytes = written, "[DOWNLOAD] get_object done");
        Ok(())
    }
}

/// Streams `body` into `local_path` chunk by chunk and returns the byte count.
async fn write_body(mut body: ByteStream, local_path: &Path) -> Result<u64, TransportError> {
    let file = tokio::fs::File::create(local_path)
        .await
        .map_err(|e| format!("Failed to create {}: {e}", local_path.display()))?;
    let mut writer = BufWriter::new(file);
    let mut written: u64 = 0;

    while let Some(bytes) = body
        .try_next()
        .await
        .map_err(|e| format!("Download stream failed: {e}"))?
    {
        writer
            .write_all(&bytes)
            .await
            .map_err(|e| format!("Failed writing {}: {e}", local_path.display()))?;
        written += bytes.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| format!("Failed flushing {}: {e}", local_path.display()))?;
    Ok(written)
}

/// The bucket to reconcile against: a directory under `emulate_root` when one is
/// configured, S3 otherwise.
pub async fn build_remote(bucket: &str, remote: &RemoteSection) -> Result<Box<dyn ObjectStore>> {
    match &remote.emulate_root {
        Some(root) => {
            let store = DirectoryObjectStore::new(root.join(bucket));
            tracing::info!(root = %store.root().display(), "Using emulated bucket");
            Ok(Box::new(store))
        }
        None => Ok(Box::new(S3ObjectStore::connect(bucket, remote).await)),
    }
}
