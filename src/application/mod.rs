//! Application layer - Services generic over the ports.

pub mod dispatcher;
pub mod ingest;
pub mod pipeline;
