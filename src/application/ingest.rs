use crate::config::PipelineConfig;
use crate::domain::objects::{StoredObject, OUTPUT_BUCKET_METADATA_KEY};
use crate::domain::requests::{
    non_blank, reject_reserved_metadata, require_non_blank, validate_bucket_name, IngestReceipt,
    IngestRequest,
};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::ingest::IngestPort;
use crate::ports::storage::ObjectStorePort;
use async_trait::async_trait;
use std::sync::Arc;

/// Writes payloads into the landing store. Never starts the transform job itself;
/// that is left to whoever observes the write.
pub struct IngestService<S> {
    storage: S,
    config: Arc<PipelineConfig>,
}

impl<S> IngestService<S>
where
    S: ObjectStorePort,
{
    pub fn new(storage: S, config: Arc<PipelineConfig>) -> Self {
        Self { storage, config }
    }

    pub async fn ingest(&self, request: IngestRequest) -> PipelineResult<IngestReceipt> {
        require_non_blank("key", &request.key)?;

        let bucket = non_blank(request.bucket.as_deref())
            .or_else(|| non_blank(Some(self.config.landing_bucket.as_str())))
            .ok_or_else(|| {
                PipelineError::InvalidRequest("unable to resolve target bucket".to_string())
            })?
            .to_string();
        validate_bucket_name(&bucket)?;
        self.storage.check_key(&request.key)?;

        let mut metadata = request.metadata.clone().unwrap_or_default();
        reject_reserved_metadata(&metadata)?;
        if let Some(output_bucket) = non_blank(request.output_bucket.as_deref()) {
            validate_bucket_name(output_bucket)?;
            metadata.insert(
                OUTPUT_BUCKET_METADATA_KEY.to_string(),
                output_bucket.to_string(),
            );
        }

        let content_type = non_blank(request.content_type.as_deref())
            .unwrap_or(&self.config.default_content_type)
            .to_string();

        let mut metadata_keys: Vec<String> = metadata.keys().cloned().collect();
        metadata_keys.sort();

        let object = StoredObject {
            bucket: bucket.clone(),
            key: request.key.clone(),
            content: request.content_bytes(),
            content_type,
            metadata,
        };

        self.storage.ensure_bucket(&bucket).await?;
        self.storage.put_object(object).await?;

        tracing::info!(bucket = %bucket, key = %request.key, "ingested object");

        Ok(IngestReceipt {
            bucket,
            key: request.key,
            metadata_keys,
        })
    }
}

#[async_trait]
impl<S> IngestPort for IngestService<S>
where
    S: ObjectStorePort,
{
    async fn ingest(&self, request: IngestRequest) -> PipelineResult<IngestReceipt> {
        IngestService::ingest(self, request).await
    }
}
