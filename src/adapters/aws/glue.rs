use crate::domain::jobs::{JobRun, JobRunState, TransformJobRequest};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::jobs::TransformJobPort;
use async_trait::async_trait;
use aws_sdk_glue::error::{DisplayErrorContext, SdkError};
use aws_sdk_glue::operation::get_job_run::GetJobRunError;
use aws_sdk_glue::primitives::DateTime as AwsDateTime;
use aws_sdk_glue::types::JobRun as GlueJobRun;
use aws_sdk_glue::Client;
use chrono::{DateTime, Utc};

const SERVICE: &str = "glue";

/// GlueAdapter implements TransformJobPort on top of an AWS Glue job.
#[derive(Clone)]
pub struct GlueAdapter {
    client: Client,
}

impl GlueAdapter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn to_utc(value: &AwsDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

fn to_job_run(run: &GlueJobRun, job_name: &str) -> JobRun {
    JobRun {
        id: run.id().unwrap_or_default().to_string(),
        job_name: run.job_name().unwrap_or(job_name).to_string(),
        state: run
            .job_run_state()
            .map(|state| JobRunState::parse(state.as_str()))
            .unwrap_or(JobRunState::Unknown),
        arguments: run.arguments().cloned().unwrap_or_default(),
        started_on: run.started_on().and_then(to_utc),
        completed_on: run.completed_on().and_then(to_utc),
        execution_time_seconds: i64::from(run.execution_time()),
        error_message: run.error_message().map(str::to_string),
        attempt: run.attempt(),
    }
}

#[async_trait]
impl TransformJobPort for GlueAdapter {
    async fn start_job_run(&self, request: &TransformJobRequest) -> PipelineResult<String> {
        let output = self
            .client
            .start_job_run()
            .job_name(&request.job_name)
            .set_arguments(Some(request.arguments()))
            .send()
            .await
            .map_err(|e| PipelineError::upstream(SERVICE, DisplayErrorContext(&e)))?;

        Ok(output.job_run_id().unwrap_or_default().to_string())
    }

    async fn get_job_run(&self, job_name: &str, run_id: &str) -> PipelineResult<JobRun> {
        let output = self
            .client
            .get_job_run()
            .job_name(job_name)
            .run_id(run_id)
            .predecessors_included(false)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(se)
                    if matches!(se.err(), GetJobRunError::EntityNotFoundException(_)) =>
                {
                    PipelineError::NotFound(format!("job run {run_id}"))
                }
                _ => PipelineError::upstream(SERVICE, DisplayErrorContext(&e)),
            })?;

        output
            .job_run()
            .map(|run| to_job_run(run, job_name))
            .ok_or_else(|| PipelineError::NotFound(format!("job run {run_id}")))
    }
}
