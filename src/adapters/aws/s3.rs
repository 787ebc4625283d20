use crate::domain::objects::{ObjectHead, StoredObject};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::storage::ObjectStorePort;
use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;

const SERVICE: &str = "s3";

/// Longest key S3 accepts, in UTF-8 bytes.
const MAX_KEY_BYTES: usize = 1024;

/// Region where buckets are created without a location constraint.
const DEFAULT_REGION: &str = "us-east-1";

/// S3Adapter implements ObjectStorePort for AWS S3.
#[derive(Clone)]
pub struct S3Adapter {
    client: Client,
    region: String,
}

impl S3Adapter {
    pub fn new(client: Client, region: String) -> Self {
        Self { client, region }
    }

    async fn create_bucket(&self, bucket: &str) -> PipelineResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| PipelineError::upstream(SERVICE, DisplayErrorContext(&e)))?;
        Ok(())
    }
}

fn http_status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|resp| resp.status().as_u16())
}

/// What to do after a failed head-bucket request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeadBucketOutcome {
    Create,
    /// The credentials cannot see the bucket; writes may still be allowed.
    AssumeExists,
    Fail,
}

fn classify_head_bucket_failure(status: Option<u16>, not_found: bool) -> HeadBucketOutcome {
    match status {
        _ if not_found => HeadBucketOutcome::Create,
        Some(404) => HeadBucketOutcome::Create,
        Some(403) => HeadBucketOutcome::AssumeExists,
        _ => HeadBucketOutcome::Fail,
    }
}

fn validate_key(key: &str) -> PipelineResult<()> {
    if key.is_empty() || key.len() > MAX_KEY_BYTES {
        return Err(PipelineError::InvalidRequest(format!(
            "object key must be 1 to {MAX_KEY_BYTES} bytes long"
        )));
    }
    Ok(())
}

/// Missing or forbidden objects count as unavailable sources.
fn is_unavailable(status: Option<u16>) -> bool {
    matches!(status, Some(403) | Some(404))
}

#[async_trait]
impl ObjectStorePort for S3Adapter {
    fn check_key(&self, key: &str) -> PipelineResult<()> {
        validate_key(key)
    }

    async fn ensure_bucket(&self, bucket: &str) -> PipelineResult<()> {
        let err = match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        let not_found = matches!(
            &err,
            SdkError::ServiceError(e) if matches!(e.err(), HeadBucketError::NotFound(_))
        );

        match classify_head_bucket_failure(http_status(&err), not_found) {
            HeadBucketOutcome::Create => {
                tracing::info!(bucket, "bucket not found, creating it");
                self.create_bucket(bucket).await
            }
            HeadBucketOutcome::AssumeExists => {
                tracing::warn!(
                    bucket,
                    "credentials cannot access bucket, assuming it exists and skipping creation"
                );
                Ok(())
            }
            HeadBucketOutcome::Fail => Err(PipelineError::upstream(SERVICE, DisplayErrorContext(&err))),
        }
    }

    async fn put_object(&self, object: StoredObject) -> PipelineResult<()> {
        self.client
            .put_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .body(ByteStream::from(object.content))
            .content_type(&object.content_type)
            .set_metadata(Some(object.metadata))
            .send()
            .await
            .map_err(|e| PipelineError::upstream(SERVICE, DisplayErrorContext(&e)))?;

        tracing::info!(bucket = %object.bucket, key = %object.key, "uploaded object");
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> PipelineResult<ObjectHead> {
        let resp = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let not_found = matches!(
                    &e,
                    SdkError::ServiceError(se) if matches!(se.err(), HeadObjectError::NotFound(_))
                );
                if not_found || is_unavailable(http_status(&e)) {
                    PipelineError::source_unavailable(bucket, key, DisplayErrorContext(&e))
                } else {
                    PipelineError::upstream(SERVICE, DisplayErrorContext(&e))
                }
            })?;

        Ok(ObjectHead {
            content_type: resp.content_type().map(str::to_string),
            content_length: resp.content_length(),
            metadata: resp.metadata().cloned().unwrap_or_default(),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> PipelineResult<StoredObject> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let no_such_key = matches!(
                    &e,
                    SdkError::ServiceError(se) if matches!(se.err(), GetObjectError::NoSuchKey(_))
                );
                if no_such_key || is_unavailable(http_status(&e)) {
                    PipelineError::source_unavailable(bucket, key, DisplayErrorContext(&e))
                } else {
                    PipelineError::upstream(SERVICE, DisplayErrorContext(&e))
                }
            })?;

        let content_type = resp
            .content_type()
            .unwrap_or(crate::domain::objects::DEFAULT_CONTENT_TYPE)
            .to_string();
        let metadata = resp.metadata().cloned().unwrap_or_default();
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| PipelineError::upstream(SERVICE, e))?;

        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content: body.into_bytes(),
            content_type,
            metadata,
        })
    }
}
