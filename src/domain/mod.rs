//! Domain layer - Pure data and logic, no I/O.

pub mod jobs;
pub mod objects;
pub mod requests;
pub mod transform;
