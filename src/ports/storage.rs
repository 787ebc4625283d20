use crate::domain::objects::{ObjectHead, StoredObject};
use crate::error::PipelineResult;
use async_trait::async_trait;

/// Object storage addressed by (bucket, key). Writes are last-write-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    /// Fails with `InvalidRequest` when this store cannot hold `key`.
    fn check_key(&self, key: &str) -> PipelineResult<()>;

    /// Make sure a bucket exists, creating it when the store says it does not.
    async fn ensure_bucket(&self, bucket: &str) -> PipelineResult<()>;

    /// Create or overwrite an object
    async fn put_object(&self, object: StoredObject) -> PipelineResult<()>;

    /// Read content type and metadata of an object.
    /// Fails with `SourceUnavailable` when the object is missing or unreadable.
    async fn head_object(&self, bucket: &str, key: &str) -> PipelineResult<ObjectHead>;

    /// Read a whole object
    async fn get_object(&self, bucket: &str, key: &str) -> PipelineResult<StoredObject>;
}
