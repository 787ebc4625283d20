//! Monolith Binary - single-process deployment
//!
//! Wires up:
//! - Filesystem object store, notifying on writes to the landing bucket
//! - In-process job runner standing in for the managed transform job
//! - Event listener feeding notifications to the dispatcher
//! - HTTP orchestration API

use etl_pipeline::adapters::http::{router, serve};
use etl_pipeline::adapters::local::{events, EventHub, FsObjectStore, LocalJobRunner};
use etl_pipeline::application::{
    dispatcher::DispatcherService, ingest::IngestService, pipeline::PipelineService,
};
use etl_pipeline::config::{IngestMode, LocalConfig, PipelineConfig, ServerConfig};
use etl_pipeline::telemetry::init_tracing;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    init_tracing(false);

    let pipeline_config = Arc::new(PipelineConfig::from_env());
    let server_config = ServerConfig::from_env();
    let local_config = LocalConfig::from_env();

    if server_config.ingest_mode == IngestMode::Lambda {
        tracing::warn!("INGEST_MODE=lambda is not available locally, ingesting in-process");
    }

    // 1. Adapters (Local implementations)
    let event_hub = Arc::new(EventHub::new());
    let mut store = FsObjectStore::new(&local_config.data_dir);
    if local_config.notifications {
        store = store.with_notifications(event_hub.clone(), pipeline_config.landing_bucket.clone());
    }
    let jobs = LocalJobRunner::new(store.clone(), pipeline_config.job_name.clone());

    // 2. Application Services
    let dispatcher = Arc::new(DispatcherService::new(
        store.clone(),
        jobs,
        pipeline_config.clone(),
    ));
    let ingest = IngestService::new(store, pipeline_config.clone());
    let pipeline = Arc::new(PipelineService::new(ingest, dispatcher.clone()));

    // 3. Event System (landing bucket notifications)
    if local_config.notifications {
        events::listener::start(event_hub, dispatcher);
    }

    tracing::info!(
        data_dir = %local_config.data_dir.display(),
        landing_bucket = %pipeline_config.landing_bucket,
        job_name = %pipeline_config.job_name,
        notifications = local_config.notifications,
        "starting monolith"
    );

    // 4. HTTP Layer
    if let Err(e) = serve(&server_config.bind_address(), router(pipeline)).await {
        tracing::error!(error = %e, "server failed");
        std::process::exit(1);
    }
}
