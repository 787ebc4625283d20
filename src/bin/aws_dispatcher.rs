//! AWS Dispatcher Binary - Lambda function triggered by S3 notifications
//!
//! Starts one transform job run per created object. The first failure fails
//! the invocation so the notification can be redelivered.

use aws_lambda_events::event::s3::S3Event;
use etl_pipeline::adapters::aws::notifications::object_created_events;
use etl_pipeline::adapters::aws::{load_sdk_config, GlueAdapter, S3Adapter};
use etl_pipeline::application::dispatcher::DispatcherService;
use etl_pipeline::config::PipelineConfig;
use etl_pipeline::domain::jobs::JobRunRef;
use etl_pipeline::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(true);

    let config = Arc::new(PipelineConfig::from_env());
    let sdk_config = load_sdk_config(&config.region).await;
    let storage = S3Adapter::new(aws_sdk_s3::Client::new(&sdk_config), config.region.clone());
    let jobs = GlueAdapter::new(aws_sdk_glue::Client::new(&sdk_config));
    let dispatcher = Arc::new(DispatcherService::new(storage, jobs, config));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<S3Event>| {
        let dispatcher = dispatcher.clone();
        async move {
            let events = object_created_events(&event.payload);
            tracing::info!(records = events.len(), "received S3 notification");
            let runs: Vec<JobRunRef> = dispatcher.dispatch_all(&events).await?;
            Ok::<_, Error>(runs)
        }
    }))
    .await
}
