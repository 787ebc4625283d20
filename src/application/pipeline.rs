use super::dispatcher::DispatcherService;
use crate::domain::jobs::JobRun;
use crate::domain::objects::ObjectCreatedEvent;
use crate::domain::requests::{
    RunPipelineRequest, RunPipelineResponse, UploadRequest, UploadResponse,
};
use crate::error::PipelineResult;
use crate::ports::ingest::IngestPort;
use crate::ports::jobs::TransformJobPort;
use crate::ports::storage::ObjectStorePort;
use std::sync::Arc;

/// Synchronous entry points to the pipeline, as served by the HTTP API.
///
/// `run_pipeline` dispatches by itself so the caller gets a run id back right
/// away. Where the landing store also notifies the dispatcher, that same upload
/// starts a second run; this duplication is accepted.
pub struct PipelineService<I, S, J> {
    ingest: I,
    dispatcher: Arc<DispatcherService<S, J>>,
}

impl<I, S, J> PipelineService<I, S, J>
where
    I: IngestPort,
    S: ObjectStorePort,
    J: TransformJobPort,
{
    pub fn new(ingest: I, dispatcher: Arc<DispatcherService<S, J>>) -> Self {
        Self { ingest, dispatcher }
    }

    /// Lands the payload and returns without waiting for any transformation.
    pub async fn upload(&self, request: UploadRequest) -> PipelineResult<UploadResponse> {
        request.validate()?;
        let receipt = self.ingest.ingest(request.into_ingest(None)).await?;
        Ok(UploadResponse {
            bucket: receipt.bucket,
            key: receipt.key,
        })
    }

    /// Lands the payload, then starts the transform job for it.
    pub async fn run_pipeline(
        &self,
        request: RunPipelineRequest,
    ) -> PipelineResult<RunPipelineResponse> {
        request.validate()?;
        let receipt = self.ingest.ingest(request.into_ingest()).await?;

        let event = ObjectCreatedEvent::for_object(&receipt.bucket, &receipt.key);
        let run = self.dispatcher.dispatch(&event).await?;

        Ok(RunPipelineResponse {
            bucket: receipt.bucket,
            key: receipt.key,
            job_run_id: run.run_id,
        })
    }

    pub async fn get_job_run(&self, job_run_id: &str) -> PipelineResult<JobRun> {
        self.dispatcher.job_run(job_run_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::domain::objects::ObjectHead;
    use crate::domain::requests::IngestReceipt;
    use crate::error::PipelineError;
    use crate::ports::ingest::MockIngestPort;
    use crate::ports::jobs::MockTransformJobPort;
    use crate::ports::storage::MockObjectStorePort;

    fn dispatcher(
        storage: MockObjectStorePort,
        jobs: MockTransformJobPort,
    ) -> Arc<DispatcherService<MockObjectStorePort, MockTransformJobPort>> {
        Arc::new(DispatcherService::new(
            storage,
            jobs,
            Arc::new(PipelineConfig::default()),
        ))
    }

    fn upload_request(key: &str, content: &str) -> UploadRequest {
        UploadRequest {
            key: key.to_string(),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn invalid_upload_fails_before_ingest() {
        let mut ingest = MockIngestPort::new();
        ingest.expect_ingest().times(0);

        let service = PipelineService::new(
            ingest,
            dispatcher(MockObjectStorePort::new(), MockTransformJobPort::new()),
        );
        let err = service
            .upload(upload_request("", "{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));

        let err = service
            .upload(upload_request("orders/1.json", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn upload_never_starts_a_job() {
        let mut ingest = MockIngestPort::new();
        ingest.expect_ingest().times(1).returning(|req| {
            Ok(IngestReceipt {
                bucket: "etl-source-bucket".to_string(),
                key: req.key,
                metadata_keys: vec![],
            })
        });
        let mut jobs = MockTransformJobPort::new();
        jobs.expect_start_job_run().times(0);

        let service = PipelineService::new(ingest, dispatcher(MockObjectStorePort::new(), jobs));
        let response = service
            .upload(upload_request("orders/1.json", "{\"id\":1}"))
            .await
            .unwrap();
        assert_eq!(response.bucket, "etl-source-bucket");
        assert_eq!(response.key, "orders/1.json");
    }

    #[tokio::test]
    async fn run_pipeline_dispatches_the_ingested_object() {
        let mut ingest = MockIngestPort::new();
        ingest
            .expect_ingest()
            .withf(|req| req.output_bucket.as_deref() == Some("bucket-x"))
            .returning(|req| {
                Ok(IngestReceipt {
                    bucket: "etl-source-bucket".to_string(),
                    key: req.key,
                    metadata_keys: vec!["pipeline-output-bucket".to_string()],
                })
            });
        let mut storage = MockObjectStorePort::new();
        storage
            .expect_head_object()
            .withf(|bucket, key| bucket == "etl-source-bucket" && key == "daily report.json")
            .returning(|_, _| {
                let mut head = ObjectHead::default();
                head.metadata
                    .insert("pipeline-output-bucket".to_string(), "bucket-x".to_string());
                Ok(head)
            });
        let mut jobs = MockTransformJobPort::new();
        jobs.expect_start_job_run()
            .withf(|req| req.output_bucket == "bucket-x" && req.source_key == "daily report.json")
            .returning(|_| Ok("jr_42".to_string()));

        let service = PipelineService::new(ingest, dispatcher(storage, jobs));
        let response = service
            .run_pipeline(RunPipelineRequest {
                upload: upload_request("daily report.json", "{\"id\":1}"),
                output_bucket: Some("bucket-x".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(response.job_run_id, "jr_42");
        assert_eq!(response.key, "daily report.json");
    }

    #[tokio::test]
    async fn run_pipeline_surfaces_job_failure() {
        let mut ingest = MockIngestPort::new();
        ingest.expect_ingest().returning(|req| {
            Ok(IngestReceipt {
                bucket: "etl-source-bucket".to_string(),
                key: req.key,
                metadata_keys: vec![],
            })
        });
        let mut storage = MockObjectStorePort::new();
        storage
            .expect_head_object()
            .returning(|_, _| Ok(ObjectHead::default()));
        let mut jobs = MockTransformJobPort::new();
        jobs.expect_start_job_run()
            .returning(|_| Err(PipelineError::upstream("glue", "ConcurrentRunsExceededException")));

        let service = PipelineService::new(ingest, dispatcher(storage, jobs));
        let err = service
            .run_pipeline(RunPipelineRequest {
                upload: upload_request("orders/1.json", "{}"),
                output_bucket: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Upstream { service: "glue", .. }));
    }
}
