use crate::domain::jobs::{JobRun, TransformJobRequest};
use crate::error::PipelineResult;
use async_trait::async_trait;

/// The managed transform job. Concurrency limits are enforced on its side.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransformJobPort: Send + Sync {
    /// Start a run and return its identifier
    async fn start_job_run(&self, request: &TransformJobRequest) -> PipelineResult<String>;

    /// Status record of a run. Fails with `NotFound` for an unknown id.
    async fn get_job_run(&self, job_name: &str, run_id: &str) -> PipelineResult<JobRun>;
}
