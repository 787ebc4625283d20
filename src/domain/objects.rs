use crate::error::PipelineError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata key the ingest side uses to tell the dispatcher where the
/// transformed output of an object should go.
pub const OUTPUT_BUCKET_METADATA_KEY: &str = "pipeline-output-bucket";

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// An object as written to (or read back from) a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub content: Bytes,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

impl StoredObject {
    /// The output bucket hint carried by this object, if any.
    pub fn output_bucket_hint(&self) -> Option<&str> {
        output_bucket_hint(&self.metadata)
    }
}

/// What a store reports about an object without reading its body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectHead {
    pub content_type: Option<String>,
    pub content_length: Option<i64>,
    pub metadata: HashMap<String, String>,
}

impl ObjectHead {
    pub fn output_bucket_hint(&self) -> Option<&str> {
        output_bucket_hint(&self.metadata)
    }
}

fn output_bucket_hint(metadata: &HashMap<String, String>) -> Option<&str> {
    metadata
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(OUTPUT_BUCKET_METADATA_KEY))
        .map(|(_, v)| v.trim())
        .filter(|v| !v.is_empty())
}

/// Signal that an object appeared in the landing store.
///
/// `key` is in its transport encoding: notifications deliver keys
/// percent-encoded, so it must go through [`decode_object_key`] before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreatedEvent {
    pub bucket: String,
    pub key: String,
}

impl ObjectCreatedEvent {
    pub fn new(bucket: impl Into<String>, encoded_key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: encoded_key.into(),
        }
    }

    /// Builds an event for an object whose key is known in plain form.
    pub fn for_object(bucket: &str, key: &str) -> Self {
        Self::new(bucket, urlencoding::encode(key).into_owned())
    }

    pub fn decoded_key(&self) -> Result<String, PipelineError> {
        decode_object_key(&self.key)
    }
}

/// Decodes a notification key. `+` stands for a space, as in S3 event payloads.
pub fn decode_object_key(encoded: &str) -> Result<String, PipelineError> {
    let spaced = encoded.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|key| key.into_owned())
        .map_err(|e| PipelineError::InvalidRequest(format!("object key {encoded:?}: {e}")))
}
