//! In-process notification bridge: the filesystem store publishes an
//! [`ObjectCreatedEvent`](crate::domain::objects::ObjectCreatedEvent) after
//! each write to the watched bucket, the listener hands it to the dispatcher.

pub mod hub;
pub mod listener;
