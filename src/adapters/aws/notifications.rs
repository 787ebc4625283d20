//! Mapping of S3 bucket notifications onto object created events.

use crate::domain::objects::ObjectCreatedEvent;
use aws_lambda_events::event::s3::{S3Event, S3EventRecord};

const OBJECT_CREATED_PREFIX: &str = "ObjectCreated";

fn to_event(record: &S3EventRecord) -> Option<ObjectCreatedEvent> {
    if let Some(name) = record.event_name.as_deref() {
        if !name.starts_with(OBJECT_CREATED_PREFIX) {
            tracing::debug!(event_name = name, "skipping non object created record");
            return None;
        }
    }
    match (&record.s3.bucket.name, &record.s3.object.key) {
        (Some(bucket), Some(key)) => Some(ObjectCreatedEvent::new(bucket, key)),
        _ => {
            tracing::warn!("skipping S3 record without bucket or key");
            None
        }
    }
}

/// Events for every created object in `event`, in record order.
///
/// Keys stay URL encoded as delivered by S3.
pub fn object_created_events(event: &S3Event) -> Vec<ObjectCreatedEvent> {
    event.records.iter().filter_map(to_event).collect()
}
