use crate::config::PipelineConfig;
use crate::domain::jobs::{JobRun, JobRunRef, TransformJobRequest};
use crate::domain::objects::ObjectCreatedEvent;
use crate::domain::requests::{non_blank, require_non_blank, validate_bucket_name};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::jobs::TransformJobPort;
use crate::ports::storage::ObjectStorePort;
use std::sync::Arc;

/// Turns "an object landed" into a transform job run.
///
/// Safe to call more than once for the same event: each call starts its own
/// run, and the job's own concurrency limit decides what happens to extras.
pub struct DispatcherService<S, J> {
    storage: S,
    jobs: J,
    config: Arc<PipelineConfig>,
}

impl<S, J> DispatcherService<S, J>
where
    S: ObjectStorePort,
    J: TransformJobPort,
{
    pub fn new(storage: S, jobs: J, config: Arc<PipelineConfig>) -> Self {
        Self {
            storage,
            jobs,
            config,
        }
    }

    pub async fn dispatch(&self, event: &ObjectCreatedEvent) -> PipelineResult<JobRunRef> {
        let source_bucket = require_non_blank("bucket", &event.bucket)?.to_string();
        let source_key = event.decoded_key()?;
        require_non_blank("key", &source_key)?;

        // Missing or unreadable objects surface as SourceUnavailable from the store.
        let head = self.storage.head_object(&source_bucket, &source_key).await?;
        let output_bucket = self.resolve_output_bucket(head.output_bucket_hint())?;

        let request = TransformJobRequest {
            job_name: self.config.job_name.clone(),
            source_bucket,
            source_key,
            output_bucket,
        };

        let run_id = self.jobs.start_job_run(&request).await?;
        if run_id.is_empty() {
            return Err(PipelineError::upstream(
                "transform job",
                "start request returned no run id",
            ));
        }

        tracing::info!(
            job_name = %request.job_name,
            run_id = %run_id,
            bucket = %request.source_bucket,
            key = %request.source_key,
            output_bucket = %request.output_bucket,
            "started transform job"
        );

        Ok(JobRunRef {
            job_name: request.job_name,
            run_id,
            source_bucket: request.source_bucket,
            source_key: request.source_key,
            output_bucket: request.output_bucket,
        })
    }

    /// Dispatches events in order and stops at the first failure.
    pub async fn dispatch_all(
        &self,
        events: &[ObjectCreatedEvent],
    ) -> PipelineResult<Vec<JobRunRef>> {
        let mut runs = Vec::with_capacity(events.len());
        for event in events {
            runs.push(self.dispatch(event).await?);
        }
        Ok(runs)
    }

    /// Status of a run of the configured job.
    pub async fn job_run(&self, run_id: &str) -> PipelineResult<JobRun> {
        let run_id = require_non_blank("jobRunId", run_id)?;
        self.jobs.get_job_run(&self.config.job_name, run_id).await
    }

    fn resolve_output_bucket(&self, hint: Option<&str>) -> PipelineResult<String> {
        let bucket = hint
            .or_else(|| non_blank(Some(self.config.transformed_bucket.as_str())))
            .ok_or_else(|| {
                PipelineError::InvalidRequest(
                    "no output bucket: object carries no hint and no default is configured"
                        .to_string(),
                )
            })?;
        validate_bucket_name(bucket)?;
        Ok(bucket.to_string())
    }
}
