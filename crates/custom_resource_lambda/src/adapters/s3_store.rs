use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use tokio::runtime::Handle;

use super::blob_store::{BlobStore, PutObjectOptions};

/// S3-backed blob store.
///
/// Handlers run on a blocking thread, so each call drives the async SDK on the
/// runtime handle captured at startup.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    runtime: Handle,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }
}

impl BlobStore for S3BlobStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        let client = self.client.clone();
        self.runtime.block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|error| format!("failed to read s3://{bucket}/{key}: {error}"))?;
            output
                .body
                .collect()
                .await
                .map(|bytes| bytes.into_bytes().to_vec())
                .map_err(|error| format!("failed to stream s3://{bucket}/{key}: {error}"))
        })
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &PutObjectOptions,
    ) -> Result<(), String> {
        let client = self.client.clone();
        let content_type = options.content_type.clone();
        let acl = options.acl.as_deref().map(ObjectCannedAcl::from);
        self.runtime.block_on(async move {
            client
                .put_object()
                .bucket(bucket)
                .key(key)
                .set_content_type(content_type)
                .set_acl(acl)
                .body(ByteStream::from(body))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to write s3://{bucket}/{key}: {error}"))
        })
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, String> {
        let client = self.client.clone();
        self.runtime.block_on(async move {
            let mut pages = client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .into_paginator()
                .send();

            let mut keys = Vec::new();
            while let Some(page) = pages.next().await {
                let page = page
                    .map_err(|error| format!("failed to list s3://{bucket}/{prefix}: {error}"))?;
                keys.extend(
                    page.contents()
                        .iter()
                        .filter_map(|object| object.key().map(str::to_string)),
                );
            }
            Ok(keys)
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), String> {
        let client = self.client.clone();
        self.runtime.block_on(async move {
            client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| format!("failed to delete s3://{bucket}/{key}: {error}"))
        })
    }
}
