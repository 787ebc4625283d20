use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SOURCE_BUCKET_ARG: &str = "--SOURCE_BUCKET";
pub const SOURCE_KEY_ARG: &str = "--SOURCE_KEY";
pub const OUTPUT_BUCKET_ARG: &str = "--OUTPUT_BUCKET";

/// Prefix under which the transform job writes its result in the output bucket.
pub const TRANSFORMED_KEY_PREFIX: &str = "transformed/";

/// One request to start the transform job. Built fresh per dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformJobRequest {
    pub job_name: String,
    pub source_bucket: String,
    pub source_key: String,
    pub output_bucket: String,
}

impl TransformJobRequest {
    /// Named arguments as the managed job receives them.
    pub fn arguments(&self) -> HashMap<String, String> {
        HashMap::from([
            (SOURCE_BUCKET_ARG.to_string(), self.source_bucket.clone()),
            (SOURCE_KEY_ARG.to_string(), self.source_key.clone()),
            (OUTPUT_BUCKET_ARG.to_string(), self.output_bucket.clone()),
        ])
    }

    /// Rebuilds a request from the job's named arguments.
    pub fn from_arguments(job_name: &str, args: &HashMap<String, String>) -> Option<Self> {
        Some(Self {
            job_name: job_name.to_string(),
            source_bucket: args.get(SOURCE_BUCKET_ARG)?.clone(),
            source_key: args.get(SOURCE_KEY_ARG)?.clone(),
            output_bucket: args.get(OUTPUT_BUCKET_ARG)?.clone(),
        })
    }

    pub fn output_key(&self) -> String {
        format!("{}{}", TRANSFORMED_KEY_PREFIX, self.source_key)
    }
}

/// What a successful dispatch hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRunRef {
    pub job_name: String,
    pub run_id: String,
    pub source_bucket: String,
    pub source_key: String,
    pub output_bucket: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobRunState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Succeeded,
    Failed,
    Timeout,
    Error,
    Waiting,
    Expired,
    #[serde(other)]
    Unknown,
}

impl JobRunState {
    pub fn parse(state: &str) -> Self {
        match state {
            "STARTING" => Self::Starting,
            "RUNNING" => Self::Running,
            "STOPPING" => Self::Stopping,
            "STOPPED" => Self::Stopped,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "TIMEOUT" => Self::Timeout,
            "ERROR" => Self::Error,
            "WAITING" => Self::Waiting,
            "EXPIRED" => Self::Expired,
            _ => Self::Unknown,
        }
    }

    pub fn is_finished(self) -> bool {
        matches!(
            self,
            Self::Stopped
                | Self::Succeeded
                | Self::Failed
                | Self::Timeout
                | Self::Error
                | Self::Expired
        )
    }
}

/// Status record of a transform job run, owned by the job service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRun {
    pub id: String,
    pub job_name: String,
    pub state: JobRunState,
    pub arguments: HashMap<String, String>,
    pub started_on: Option<DateTime<Utc>>,
    pub completed_on: Option<DateTime<Utc>>,
    pub execution_time_seconds: i64,
    pub error_message: Option<String>,
    pub attempt: i32,
}
