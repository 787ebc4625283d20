//! Local adapters for monolith deployment.

pub mod events;
pub mod fs;
pub mod jobs;

pub use events::hub::EventHub;
pub use fs::FsObjectStore;
pub use jobs::LocalJobRunner;
