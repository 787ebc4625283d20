//! ETL Pipeline - landing, dispatch and transform orchestration
//!
//! Hexagonal Architecture:
//! - domain/: Pure business logic (objects, requests, jobs, transform)
//! - ports/: Trait definitions (object store, transform job, ingest)
//! - adapters/: Concrete implementations (HTTP API, local, AWS)
//! - application/: Generic services (ingest, dispatcher, pipeline)
//! - config: Environment configuration
//!
//! # Features
//! - `local`: Single-process deployment (filesystem store, in-process job runner)
//! - `aws`: S3, Glue and Lambda adapters plus the Lambda entry points
//! - `full`: All features

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod telemetry;

// Re-exports for convenience
pub use config::{IngestMode, PipelineConfig, ServerConfig};
pub use error::{PipelineError, PipelineResult};

#[cfg(feature = "local")]
pub use adapters::local::{EventHub, FsObjectStore, LocalJobRunner};

#[cfg(feature = "local")]
pub use config::LocalConfig;
