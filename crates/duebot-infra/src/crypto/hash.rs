//! SHA-256 content hashing for task keys.
//!
//! Implements the `ContentHasher` trait from `duebot-core` using the
//! `sha2` crate (RustCrypto ecosystem).

use sha2::{Digest, Sha256};

use duebot_core::service::hash::ContentHasher;

/// SHA-256 implementation of `ContentHasher`.
///
/// Computes lowercase hex-encoded SHA-256 digests of content strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256ContentHasher;

impl Sha256ContentHasher {
    pub fn new() -> Self {
        Self
    }
}

impl ContentHasher for Sha256ContentHasher {
    fn compute_hash(&self, content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        format!("{:x}", digest)
    }
}
