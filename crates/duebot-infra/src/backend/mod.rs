//! HTTP client the chat bot uses to reach the REST API.

pub mod client;

pub use client::{BackendClient, BackendError};
