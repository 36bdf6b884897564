//! ContentHasher trait for deriving task keys.
//!
//! The `Sha256ContentHasher` adapter lives in duebot-infra.

/// Abstraction over content hashing.
///
/// `TaskService` feeds it the task key source and keeps the first 32 hex
/// characters of the digest.
pub trait ContentHasher: Send + Sync {
    /// Compute a lowercase hex-encoded hash of the given content.
    fn compute_hash(&self, content: &str) -> String;
}
