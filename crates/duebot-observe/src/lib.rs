//! Observability setup shared by every duebot entry point.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, shutdown_tracing, verbosity_filter};
