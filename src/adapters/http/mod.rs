//! HTTP inbound adapter: the orchestration API.
//!
//! - `POST /etl/upload` lands a payload and returns `{bucket, key}`
//! - `POST /etl/run` lands a payload, starts the transform job and returns
//!   `{bucket, key, jobRunId}`
//! - `GET /etl/jobs/:job_run_id` returns the job's status record, 404 if unknown

mod error;

pub use error::{ApiError, ErrorResponse};

use crate::application::pipeline::PipelineService;
use crate::domain::jobs::JobRun;
use crate::domain::requests::{
    RunPipelineRequest, RunPipelineResponse, UploadRequest, UploadResponse,
};
use crate::ports::{ingest::IngestPort, jobs::TransformJobPort, storage::ObjectStorePort};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type SharedPipeline<I, S, J> = Arc<PipelineService<I, S, J>>;

pub fn router<I, S, J>(service: SharedPipeline<I, S, J>) -> Router
where
    I: IngestPort + 'static,
    S: ObjectStorePort + 'static,
    J: TransformJobPort + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/etl/upload", post(upload::<I, S, J>))
        .route("/etl/run", post(run_pipeline::<I, S, J>))
        .route("/etl/jobs/:job_run_id", get(get_job_run::<I, S, J>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

async fn upload<I, S, J>(
    State(service): State<SharedPipeline<I, S, J>>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError>
where
    I: IngestPort,
    S: ObjectStorePort,
    J: TransformJobPort,
{
    let Json(request) = payload?;
    let response = service.upload(request).await?;
    Ok(Json(response))
}

async fn run_pipeline<I, S, J>(
    State(service): State<SharedPipeline<I, S, J>>,
    payload: Result<Json<RunPipelineRequest>, JsonRejection>,
) -> Result<Json<RunPipelineResponse>, ApiError>
where
    I: IngestPort,
    S: ObjectStorePort,
    J: TransformJobPort,
{
    let Json(request) = payload?;
    let response = service.run_pipeline(request).await?;
    Ok(Json(response))
}

async fn get_job_run<I, S, J>(
    State(service): State<SharedPipeline<I, S, J>>,
    Path(job_run_id): Path<String>,
) -> Result<Json<JobRun>, ApiError>
where
    I: IngestPort,
    S: ObjectStorePort,
    J: TransformJobPort,
{
    let run = service.get_job_run(&job_run_id).await?;
    Ok(Json(run))
}

/// Binds and serves the API until the process is stopped.
pub async fn serve(address: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(address = %address, "listening");
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::DispatcherService;
    use crate::config::PipelineConfig;
    use crate::error::PipelineError;
    use crate::ports::ingest::MockIngestPort;
    use crate::ports::jobs::MockTransformJobPort;
    use crate::ports::storage::MockObjectStorePort;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app(ingest: MockIngestPort, jobs: MockTransformJobPort) -> Router {
        let dispatcher = Arc::new(DispatcherService::new(
            MockObjectStorePort::new(),
            jobs,
            Arc::new(PipelineConfig::default()),
        ));
        router(Arc::new(PipelineService::new(ingest, dispatcher)))
    }

    async fn error_body(response: axum::response::Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let mut ingest = MockIngestPort::new();
        ingest.expect_ingest().times(0);

        let response = app(ingest, MockTransformJobPort::new())
            .oneshot(
                Request::post("/etl/upload")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_body(response).await.code, "invalid_request");
    }

    #[tokio::test]
    async fn empty_key_is_a_bad_request() {
        let mut ingest = MockIngestPort::new();
        ingest.expect_ingest().times(0);

        let response = app(ingest, MockTransformJobPort::new())
            .oneshot(
                Request::post("/etl/run")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"","content":"{}"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_job_run_is_not_found() {
        let mut jobs = MockTransformJobPort::new();
        jobs.expect_get_job_run()
            .returning(|_, id| Err(PipelineError::NotFound(format!("job run {id}"))));

        let response = app(MockIngestPort::new(), jobs)
            .oneshot(
                Request::get("/etl/jobs/unknown-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_body(response).await.code, "not_found");
    }

    #[tokio::test]
    async fn upstream_failure_is_a_bad_gateway() {
        let mut ingest = MockIngestPort::new();
        ingest
            .expect_ingest()
            .returning(|_| Err(PipelineError::upstream("s3", "AccessDenied")));

        let response = app(ingest, MockTransformJobPort::new())
            .oneshot(
                Request::post("/etl/upload")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"key":"a.json","content":"{}"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
