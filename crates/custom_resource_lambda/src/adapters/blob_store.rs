/// Per-object upload settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutObjectOptions {
    pub content_type: Option<String>,
    pub acl: Option<String>,
}

/// Bucket/key addressed object storage used by the UI deployer.
pub trait BlobStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String>;

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &PutObjectOptions,
    ) -> Result<(), String>;

    /// Every key under `prefix`; an empty listing is not an error.
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, String>;

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), String>;
}
