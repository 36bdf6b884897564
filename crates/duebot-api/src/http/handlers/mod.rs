//! HTTP request handlers for the REST API.

pub mod category;
pub mod task;
pub mod telegram;
