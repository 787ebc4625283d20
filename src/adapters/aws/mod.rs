//! AWS adapters: S3 for storage, Glue for the transform job, Lambda for the
//! remote ingest entry point, plus the mapping of S3 notifications.

pub mod glue;
pub mod lambda;
pub mod notifications;
pub mod s3;

pub use glue::GlueAdapter;
pub use lambda::LambdaIngestInvoker;
pub use s3::S3Adapter;

/// Loads the shared SDK configuration for `region`.
pub async fn load_sdk_config(region: &str) -> aws_config::SdkConfig {
    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()))
        .load()
        .await
}
