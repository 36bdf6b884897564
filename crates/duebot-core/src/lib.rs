//! Business logic and repository trait definitions for duebot.
//!
//! This crate defines the "ports" (repository traits, messenger) that the
//! infrastructure layer implements. It depends only on `duebot-types` --
//! never on `duebot-infra` or any database/IO crate.

pub mod dialog;
pub mod reminder;
pub mod repository;
pub mod service;
