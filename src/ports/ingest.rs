use crate::domain::requests::{IngestReceipt, IngestRequest};
use crate::error::PipelineResult;
use async_trait::async_trait;

/// Entry point that lands a payload in the landing store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IngestPort: Send + Sync {
    async fn ingest(&self, request: IngestRequest) -> PipelineResult<IngestReceipt>;
}
