//! Filesystem object store.
//!
//! Layout under the root directory:
//! - `<bucket>/objects/<name>`: object body
//! - `<bucket>/meta/<name>.json`: content type and user metadata
//!
//! `<name>` is the percent-encoded key with `.` escaped as well, so every key
//! maps to exactly one flat file name and never to a directory.

use super::events::hub::EventHub;
use crate::domain::objects::{ObjectCreatedEvent, ObjectHead, StoredObject};
use crate::error::{PipelineError, PipelineResult};
use crate::ports::storage::ObjectStorePort;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

const SERVICE: &str = "local store";

/// Longest file name most filesystems accept.
const MAX_FILE_NAME: usize = 255;
const META_SUFFIX: &str = ".json";

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    content_type: String,
    metadata: HashMap<String, String>,
}

#[derive(Clone, Debug)]
struct Notifications {
    hub: Arc<EventHub>,
    bucket: String,
}

#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    notifications: Option<Notifications>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            notifications: None,
        }
    }

    /// Publish an event on `hub` for every object written to `bucket`.
    pub fn with_notifications(mut self, hub: Arc<EventHub>, bucket: impl Into<String>) -> Self {
        self.notifications = Some(Notifications {
            hub,
            bucket: bucket.into(),
        });
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PipelineResult<PathBuf> {
        let path = Path::new(bucket);
        let mut components = path.components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single {
            return Err(PipelineError::InvalidRequest(format!(
                "{bucket:?} is not a valid bucket name"
            )));
        }
        Ok(self.root.join(path))
    }

    fn object_path(&self, bucket: &str, key: &str) -> PipelineResult<PathBuf> {
        let name = file_name(key)?;
        Ok(self.bucket_dir(bucket)?.join("objects").join(name))
    }

    fn meta_path(&self, bucket: &str, key: &str) -> PipelineResult<PathBuf> {
        let name = file_name(key)?;
        Ok(self
            .bucket_dir(bucket)?
            .join("meta")
            .join(format!("{name}{META_SUFFIX}")))
    }

    fn notify(&self, bucket: &str, key: &str) {
        let Some(notifications) = &self.notifications else {
            return;
        };
        if notifications.bucket != bucket {
            return;
        }
        if let Err(e) = notifications
            .hub
            .publish(ObjectCreatedEvent::for_object(bucket, key))
        {
            tracing::debug!(error = %e, bucket, key, "no listener for object created event");
        }
    }

    async fn read_sidecar(&self, bucket: &str, key: &str) -> PipelineResult<Sidecar> {
        let path = self.meta_path(bucket, key)?;
        let raw = tokio::fs::read(&path)
            .await
            .map_err(|e| read_error(bucket, key, e))?;
        serde_json::from_slice(&raw).map_err(|e| PipelineError::upstream(SERVICE, e))
    }
}

/// Flat file name of a key.
fn file_name(key: &str) -> PipelineResult<String> {
    if key.is_empty() {
        return Err(PipelineError::InvalidRequest(
            "object key must not be empty".to_string(),
        ));
    }
    let name = urlencoding::encode(key).replace('.', "%2E");
    if name.len() + META_SUFFIX.len() > MAX_FILE_NAME {
        return Err(PipelineError::InvalidRequest(format!(
            "object key {key:?} is too long for the local store"
        )));
    }
    Ok(name)
}

fn read_error(bucket: &str, key: &str, err: std::io::Error) -> PipelineError {
    match err.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            PipelineError::source_unavailable(bucket, key, err)
        }
        _ => PipelineError::upstream(SERVICE, err),
    }
}

fn write_error(err: std::io::Error) -> PipelineError {
    PipelineError::upstream(SERVICE, err)
}

async fn write_file(path: &Path, contents: &[u8]) -> PipelineResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    tokio::fs::write(path, contents).await.map_err(write_error)
}

#[async_trait]
impl ObjectStorePort for FsObjectStore {
    fn check_key(&self, key: &str) -> PipelineResult<()> {
        file_name(key).map(|_| ())
    }

    async fn ensure_bucket(&self, bucket: &str) -> PipelineResult<()> {
        let dir = self.bucket_dir(bucket)?;
        if tokio::fs::try_exists(&dir).await.map_err(write_error)? {
            return Ok(());
        }
        tracing::info!(bucket, "bucket not found, creating it");
        tokio::fs::create_dir_all(&dir).await.map_err(write_error)
    }

    async fn put_object(&self, object: StoredObject) -> PipelineResult<()> {
        let dir = self.bucket_dir(&object.bucket)?;
        if !tokio::fs::try_exists(&dir).await.map_err(write_error)? {
            return Err(PipelineError::upstream(
                SERVICE,
                format!("NoSuchBucket: {}", object.bucket),
            ));
        }

        let object_path = self.object_path(&object.bucket, &object.key)?;
        let meta_path = self.meta_path(&object.bucket, &object.key)?;

        // Stores lower-case user metadata keys.
        let sidecar = Sidecar {
            content_type: object.content_type,
            metadata: object
                .metadata
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        };
        let sidecar = serde_json::to_vec(&sidecar).map_err(|e| PipelineError::upstream(SERVICE, e))?;

        write_file(&meta_path, &sidecar).await?;
        write_file(&object_path, &object.content).await?;

        tracing::debug!(bucket = %object.bucket, key = %object.key, "stored object");
        self.notify(&object.bucket, &object.key);
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> PipelineResult<ObjectHead> {
        let object_path = self.object_path(bucket, key)?;
        let stat = tokio::fs::metadata(&object_path)
            .await
            .map_err(|e| read_error(bucket, key, e))?;
        let sidecar = self.read_sidecar(bucket, key).await?;

        Ok(ObjectHead {
            content_type: Some(sidecar.content_type),
            content_length: i64::try_from(stat.len()).ok(),
            metadata: sidecar.metadata,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> PipelineResult<StoredObject> {
        let object_path = self.object_path(bucket, key)?;
        let content = tokio::fs::read(&object_path)
            .await
            .map_err(|e| read_error(bucket, key, e))?;
        let sidecar = self.read_sidecar(bucket, key).await?;

        Ok(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content: Bytes::from(content),
            content_type: sidecar.content_type,
            metadata: sidecar.metadata,
        })
    }
}
