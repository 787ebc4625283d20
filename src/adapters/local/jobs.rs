//! In-process stand-in for the managed transform job.
//!
//! Runs execute the record transform against the object store on a background
//! task. At most [`MAX_CONCURRENT_RUNS`] execute at once; the rest wait in
//! `WAITING` for a slot.

use crate::domain::jobs::{JobRun, JobRunState, TransformJobRequest};
use crate::domain::objects::{StoredObject, DEFAULT_CONTENT_TYPE};
use crate::domain::transform::transform_body;
use crate::error::{PipelineError, PipelineResult};
use crate::ports::jobs::TransformJobPort;
use crate::ports::storage::ObjectStorePort;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

pub const MAX_CONCURRENT_RUNS: usize = 1;

struct Inner<S> {
    storage: S,
    job_name: String,
    /// Every run started by this process, finished ones included. Like the
    /// managed job's own history, records are kept until the process exits.
    runs: RwLock<HashMap<String, JobRun>>,
    slots: Semaphore,
}

pub struct LocalJobRunner<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for LocalJobRunner<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> LocalJobRunner<S>
where
    S: ObjectStorePort + 'static,
{
    pub fn new(storage: S, job_name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                job_name: job_name.into(),
                runs: RwLock::new(HashMap::new()),
                slots: Semaphore::new(MAX_CONCURRENT_RUNS),
            }),
        }
    }

    /// Polls a run until it finishes or `timeout` elapses; returns its last record.
    #[cfg(test)]
    pub(crate) async fn wait_for(&self, run_id: &str, timeout: Duration) -> Option<JobRun> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let run = self.inner.runs.read().await.get(run_id).cloned()?;
            if run.state.is_finished() || tokio::time::Instant::now() >= deadline {
                return Some(run);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl<S> Inner<S>
where
    S: ObjectStorePort,
{
    async fn update<F>(&self, run_id: &str, f: F)
    where
        F: FnOnce(&mut JobRun),
    {
        if let Some(run) = self.runs.write().await.get_mut(run_id) {
            f(run);
        }
    }

    async fn execute(&self, run_id: String, request: TransformJobRequest) {
        let Ok(_permit) = self.slots.acquire().await else {
            return;
        };

        let started = Utc::now();
        self.update(&run_id, |run| {
            run.state = JobRunState::Running;
            run.started_on = Some(started);
            run.attempt = 1;
        })
        .await;
        tracing::info!(run_id = %run_id, key = %request.source_key, "transform run started");

        let outcome = self.transform(&request).await;

        let completed = Utc::now();
        self.update(&run_id, |run| {
            run.completed_on = Some(completed);
            run.execution_time_seconds = (completed - started).num_seconds();
            match &outcome {
                Ok(()) => run.state = JobRunState::Succeeded,
                Err(message) => {
                    run.state = JobRunState::Failed;
                    run.error_message = Some(message.clone());
                }
            }
        })
        .await;

        match outcome {
            Ok(()) => tracing::info!(
                run_id = %run_id,
                output_bucket = %request.output_bucket,
                output_key = %request.output_key(),
                "transform run succeeded"
            ),
            Err(message) => {
                tracing::warn!(run_id = %run_id, error = %message, "transform run failed")
            }
        }
    }

    async fn transform(&self, request: &TransformJobRequest) -> Result<(), String> {
        let source = self
            .storage
            .get_object(&request.source_bucket, &request.source_key)
            .await
            .map_err(|e| e.to_string())?;
        let output = transform_body(&source.content).map_err(|e| e.to_string())?;

        self.storage
            .ensure_bucket(&request.output_bucket)
            .await
            .map_err(|e| e.to_string())?;
        self.storage
            .put_object(StoredObject {
                bucket: request.output_bucket.clone(),
                key: request.output_key(),
                content: Bytes::from(output),
                content_type: DEFAULT_CONTENT_TYPE.to_string(),
                metadata: HashMap::new(),
            })
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl<S> TransformJobPort for LocalJobRunner<S>
where
    S: ObjectStorePort + 'static,
{
    async fn start_job_run(&self, request: &TransformJobRequest) -> PipelineResult<String> {
        if request.job_name != self.inner.job_name {
            return Err(PipelineError::upstream(
                "local job runner",
                format!("EntityNotFoundException: job {} not found", request.job_name),
            ));
        }

        let run_id = format!("jr_{}", Uuid::new_v4().simple());
        let run = JobRun {
            id: run_id.clone(),
            job_name: request.job_name.clone(),
            state: JobRunState::Waiting,
            arguments: request.arguments(),
            started_on: None,
            completed_on: None,
            execution_time_seconds: 0,
            error_message: None,
            attempt: 0,
        };
        self.inner.runs.write().await.insert(run_id.clone(), run);

        let inner = Arc::clone(&self.inner);
        let task_run_id = run_id.clone();
        let request = request.clone();
        tokio::spawn(async move { inner.execute(task_run_id, request).await });

        Ok(run_id)
    }

    async fn get_job_run(&self, job_name: &str, run_id: &str) -> PipelineResult<JobRun> {
        if job_name != self.inner.job_name {
            return Err(PipelineError::NotFound(format!("job {job_name}")));
        }
        self.inner
            .runs
            .read()
            .await
            .get(run_id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("job run {run_id}")))
    }
}
