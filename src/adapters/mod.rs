//! Adapters - Concrete implementations of ports, plus the HTTP inbound adapter.

#[cfg(feature = "aws")]
pub mod aws;

pub mod http;

#[cfg(feature = "local")]
pub mod local;
