//! User and profile repository trait definition.

use duebot_types::error::RepositoryError;
use duebot_types::user::{User, UserId, UserProfile};

/// Repository trait for accounts and their Telegram profiles.
///
/// Implementations live in duebot-infra (e.g., SqliteUserRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    /// Return the user with this username, creating it if absent.
    fn get_or_create_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    /// Look up a user without creating one.
    fn find_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get the Telegram profile of a user, if one was registered.
    fn get_profile(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<UserProfile>, RepositoryError>> + Send;

    /// Create or replace the profile of `profile.user_id`.
    ///
    /// Returns `Conflict` when a Telegram id is already bound to another user.
    fn upsert_profile(
        &self,
        profile: &UserProfile,
    ) -> impl std::future::Future<Output = Result<UserProfile, RepositoryError>> + Send;
}
