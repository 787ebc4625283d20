//! AWS Ingest Binary - Lambda function storing one payload in S3
//!
//! Input: `{bucket?, key, content, contentType?, metadata?, outputBucket?}`
//! Output: `{bucket, key, metadataKeys}`

use etl_pipeline::adapters::aws::{load_sdk_config, S3Adapter};
use etl_pipeline::application::ingest::IngestService;
use etl_pipeline::config::PipelineConfig;
use etl_pipeline::domain::requests::{IngestReceipt, IngestRequest};
use etl_pipeline::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(true);

    let config = Arc::new(PipelineConfig::from_env());
    let sdk_config = load_sdk_config(&config.region).await;
    let storage = S3Adapter::new(aws_sdk_s3::Client::new(&sdk_config), config.region.clone());
    let service = Arc::new(IngestService::new(storage, config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<IngestRequest>| {
        let service = service.clone();
        async move {
            let receipt: IngestReceipt = service.ingest(event.payload).await?;
            Ok::<_, Error>(receipt)
        }
    }))
    .await
}
