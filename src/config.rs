//! Configuration for different deployment environments.
//!
//! Everything is read once at process start and shared read-only afterwards.

use std::env;
#[cfg(feature = "local")]
use std::path::PathBuf;

/// Process-wide pipeline settings. Defaults apply whenever a request omits a value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    pub region: String,
    /// Landing bucket raw payloads are written to
    pub landing_bucket: String,
    /// Default bucket the transform job writes to
    pub transformed_bucket: String,
    /// Name of the managed transform job
    pub job_name: String,
    /// Function name of the ingest Lambda
    pub ingest_function_name: String,
    pub default_content_type: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            region: var("AWS_REGION", "us-east-1"),
            landing_bucket: var("AWS_SOURCE_BUCKET", "etl-source-bucket"),
            transformed_bucket: var("AWS_TRANSFORMED_BUCKET", "etl-transformed-bucket"),
            job_name: var("AWS_GLUE_JOB_NAME", "etl-demo-job"),
            ingest_function_name: var("AWS_INGEST_LAMBDA_FUNCTION_NAME", "etl-ingest"),
            default_content_type: var(
                "AWS_DEFAULT_CONTENT_TYPE",
                crate::domain::objects::DEFAULT_CONTENT_TYPE,
            ),
        }
    }
}

/// How the orchestration API reaches the ingest entry point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IngestMode {
    /// Call the ingest service inside the API process.
    #[default]
    InProcess,
    /// Invoke the ingest Lambda function and wait for its receipt.
    Lambda,
}

impl IngestMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in-process" | "inprocess" | "local" => Some(Self::InProcess),
            "lambda" => Some(Self::Lambda),
            _ => None,
        }
    }
}

/// HTTP server settings for the orchestration API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub addr: String,
    /// HTTP server port
    pub port: String,
    pub ingest_mode: IngestMode,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let ingest_mode = match lookup("INGEST_MODE") {
            Some(raw) => IngestMode::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "unknown INGEST_MODE, using in-process ingest");
                IngestMode::InProcess
            }),
            None => IngestMode::InProcess,
        };

        Self {
            addr: lookup("ADDR")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| String::from("127.0.0.1")),
            port: lookup("PORT")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| String::from("3000")),
            ingest_mode,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }
}

/// Configuration for local/monolith deployment.
#[cfg(feature = "local")]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalConfig {
    /// Root directory of the filesystem object store
    pub data_dir: PathBuf,
    /// Whether writes to the store notify the dispatcher
    pub notifications: bool,
}

#[cfg(feature = "local")]
impl LocalConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            data_dir: PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| String::from("./data"))),
            notifications: lookup("LOCAL_NOTIFICATIONS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(true),
        }
    }
}
