//! Ports - Traits at the seams to the external services.

pub mod ingest;
pub mod jobs;
pub mod storage;
