//! Request and response bodies of the ingest and orchestration surfaces,
//! together with the checks every request passes before it touches a store.

use super::objects::OUTPUT_BUCKET_METADATA_KEY;
use crate::error::PipelineError;
use bytes::Bytes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Body of `POST /etl/upload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub content: String,
    pub content_type: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

impl UploadRequest {
    pub fn validate(&self) -> Result<(), PipelineError> {
        require_non_blank("key", &self.key)?;
        if self.content.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "content must be a non-empty string".to_string(),
            ));
        }
        if let Some(bucket) = non_blank(self.bucket.as_deref()) {
            validate_bucket_name(bucket)?;
        }
        if let Some(metadata) = &self.metadata {
            reject_reserved_metadata(metadata)?;
        }
        Ok(())
    }

    pub fn into_ingest(self, output_bucket: Option<String>) -> IngestRequest {
        IngestRequest {
            bucket: self.bucket,
            key: self.key,
            content: Value::String(self.content),
            content_type: self.content_type,
            metadata: self.metadata,
            output_bucket,
        }
    }
}

/// Body of `POST /etl/run`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineRequest {
    #[serde(flatten)]
    pub upload: UploadRequest,
    pub output_bucket: Option<String>,
}

impl RunPipelineRequest {
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.upload.validate()?;
        if let Some(bucket) = non_blank(self.output_bucket.as_deref()) {
            validate_bucket_name(bucket)?;
        }
        Ok(())
    }

    pub fn into_ingest(self) -> IngestRequest {
        let output_bucket = non_blank(self.output_bucket.as_deref()).map(str::to_string);
        self.upload.into_ingest(output_bucket)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunPipelineResponse {
    pub bucket: String,
    pub key: String,
    pub job_run_id: String,
}

/// Event accepted by the ingest entry point.
///
/// `content` is stored verbatim when it is a JSON string and as serialized
/// JSON text otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub content: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_bucket: Option<String>,
}

impl IngestRequest {
    pub fn content_bytes(&self) -> Bytes {
        match &self.content {
            Value::String(s) => Bytes::from(s.clone()),
            Value::Null => Bytes::from_static(b"{}"),
            other => Bytes::from(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub metadata_keys: Vec<String>,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn require_non_blank<'a>(field: &str, value: &'a str) -> Result<&'a str, PipelineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::InvalidRequest(format!(
            "{field} must be a non-empty string"
        )));
    }
    Ok(trimmed)
}

fn bucket_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("bucket name pattern is valid")
    })
}

pub fn validate_bucket_name(bucket: &str) -> Result<(), PipelineError> {
    if !bucket_name_pattern().is_match(bucket) || bucket.contains("..") {
        return Err(PipelineError::InvalidRequest(format!(
            "{bucket:?} is not a valid bucket name"
        )));
    }
    Ok(())
}

pub fn reject_reserved_metadata(metadata: &HashMap<String, String>) -> Result<(), PipelineError> {
    if metadata
        .keys()
        .any(|k| k.eq_ignore_ascii_case(OUTPUT_BUCKET_METADATA_KEY))
    {
        return Err(PipelineError::InvalidRequest(format!(
            "metadata key {OUTPUT_BUCKET_METADATA_KEY:?} is reserved; use outputBucket instead"
        )));
    }
    Ok(())
}
