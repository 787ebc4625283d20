//! Record enrichment applied by the transform job.
//!
//! Input is newline-delimited JSON. Every record must be an object; it keeps its
//! fields and gains `processed: true` and `uppercase_name`.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("source object is not valid UTF-8")]
    NotUtf8(#[from] std::str::Utf8Error),
    #[error("line {line}: {source}")]
    InvalidJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: expected a JSON object")]
    NotAnObject { line: usize },
}

pub fn transform_body(body: &[u8]) -> Result<String, TransformError> {
    let text = std::str::from_utf8(body)?;
    transform_records(text)
}

pub fn transform_records(text: &str) -> Result<String, TransformError> {
    let mut out = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|source| {
            TransformError::InvalidJson {
                line: idx + 1,
                source,
            }
        })?;
        let Value::Object(record) = value else {
            return Err(TransformError::NotAnObject { line: idx + 1 });
        };
        out.push(Value::Object(enrich(record)).to_string());
    }
    Ok(out.join("\n"))
}

fn enrich(mut record: Map<String, Value>) -> Map<String, Value> {
    let upper = record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_uppercase();
    record.insert("processed".to_string(), Value::Bool(true));
    record.insert("uppercase_name".to_string(), Value::String(upper));
    record
}
