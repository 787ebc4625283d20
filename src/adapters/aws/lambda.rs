use crate::domain::requests::{IngestReceipt, IngestRequest};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::ingest::IngestPort;
use async_trait::async_trait;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_sdk_lambda::Client;

const SERVICE: &str = "lambda";

/// Delegates ingestion to the deployed ingest function and waits for its receipt.
#[derive(Clone)]
pub struct LambdaIngestInvoker {
    client: Client,
    function_name: String,
}

impl LambdaIngestInvoker {
    pub fn new(client: Client, function_name: impl Into<String>) -> Self {
        Self {
            client,
            function_name: function_name.into(),
        }
    }
}

fn read_receipt(function_error: Option<&str>, payload: &[u8]) -> PipelineResult<IngestReceipt> {
    if let Some(kind) = function_error {
        return Err(PipelineError::upstream(
            SERVICE,
            format!("{kind}: {}", String::from_utf8_lossy(payload)),
        ));
    }
    serde_json::from_slice(payload)
        .map_err(|e| PipelineError::upstream(SERVICE, format!("unreadable ingest receipt: {e}")))
}

#[async_trait]
impl IngestPort for LambdaIngestInvoker {
    async fn ingest(&self, request: IngestRequest) -> PipelineResult<IngestReceipt> {
        let payload = serde_json::to_vec(&request)
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;

        let output = self
            .client
            .invoke()
            .function_name(&self.function_name)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| PipelineError::upstream(SERVICE, DisplayErrorContext(&e)))?;

        let body = output.payload().map(|blob| blob.as_ref()).unwrap_or_default();
        let receipt = read_receipt(output.function_error(), body)?;

        tracing::info!(
            function = %self.function_name,
            bucket = %receipt.bucket,
            key = %receipt.key,
            "ingest function stored object"
        );
        Ok(receipt)
    }
}
