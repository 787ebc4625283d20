//! AWS API Binary - orchestration API backed by S3 and Glue
//!
//! Environment Variables:
//! - AWS_REGION, AWS_SOURCE_BUCKET, AWS_TRANSFORMED_BUCKET, AWS_GLUE_JOB_NAME
//! - INGEST_MODE: `in-process` writes to S3 directly, `lambda` invokes
//!   AWS_INGEST_LAMBDA_FUNCTION_NAME
//! - ADDR, PORT: listen address

use etl_pipeline::adapters::aws::{load_sdk_config, GlueAdapter, LambdaIngestInvoker, S3Adapter};
use etl_pipeline::adapters::http::{router, serve};
use etl_pipeline::application::{
    dispatcher::DispatcherService, ingest::IngestService, pipeline::PipelineService,
};
use etl_pipeline::config::{IngestMode, PipelineConfig, ServerConfig};
use etl_pipeline::ports::ingest::IngestPort;
use etl_pipeline::telemetry::init_tracing;
use std::sync::Arc;

type Dispatcher = Arc<DispatcherService<S3Adapter, GlueAdapter>>;

async fn run<I>(ingest: I, dispatcher: Dispatcher, address: &str) -> std::io::Result<()>
where
    I: IngestPort + 'static,
{
    let pipeline = Arc::new(PipelineService::new(ingest, dispatcher));
    serve(address, router(pipeline)).await
}

#[tokio::main]
async fn main() {
    init_tracing(false);

    let pipeline_config = Arc::new(PipelineConfig::from_env());
    let server_config = ServerConfig::from_env();

    let sdk_config = load_sdk_config(&pipeline_config.region).await;
    let storage = S3Adapter::new(
        aws_sdk_s3::Client::new(&sdk_config),
        pipeline_config.region.clone(),
    );
    let jobs = GlueAdapter::new(aws_sdk_glue::Client::new(&sdk_config));
    let dispatcher = Arc::new(DispatcherService::new(
        storage.clone(),
        jobs,
        pipeline_config.clone(),
    ));

    let address = server_config.bind_address();
    tracing::info!(
        region = %pipeline_config.region,
        ingest_mode = ?server_config.ingest_mode,
        job_name = %pipeline_config.job_name,
        "starting API"
    );

    let result = match server_config.ingest_mode {
        IngestMode::InProcess => {
            let ingest = IngestService::new(storage, pipeline_config.clone());
            run(ingest, dispatcher, &address).await
        }
        IngestMode::Lambda => {
            let ingest = LambdaIngestInvoker::new(
                aws_sdk_lambda::Client::new(&sdk_config),
                pipeline_config.ingest_function_name.clone(),
            );
            run(ingest, dispatcher, &address).await
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
