//! Repository trait definitions (ports).
//!
//! These traits define the storage interface that the infrastructure layer
//! (duebot-infra) implements. Every per-user query takes the owner so rows of
//! other users stay invisible.

pub mod category;
pub mod task;
pub mod user;

#[cfg(test)]
pub(crate) mod memory;
