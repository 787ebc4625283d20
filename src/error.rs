//! Error taxonomy shared by every port and service.

use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller error. Raised before any store or job interaction.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The object an event points at is gone or cannot be read.
    #[error("source object s3://{bucket}/{key} is unavailable: {reason}")]
    SourceUnavailable {
        bucket: String,
        key: String,
        reason: String,
    },

    /// A storage, job or function service call failed.
    #[error("{service} call failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("not found: {0}")]
    NotFound(String),
}

impl PipelineError {
    pub fn upstream(service: &'static str, message: impl ToString) -> Self {
        Self::Upstream {
            service,
            message: message.to_string(),
        }
    }

    pub fn source_unavailable(bucket: &str, key: &str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            bucket: bucket.to_string(),
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable name of the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::Upstream { .. } => "upstream_failure",
            Self::NotFound(_) => "not_found",
        }
    }
}
