//! Category repository trait definition.

use duebot_types::category::{Category, CategoryId};
use duebot_types::error::RepositoryError;
use duebot_types::user::UserId;

/// Repository trait for per-user categories.
pub trait CategoryRepository: Send + Sync {
    /// List the owner's categories ordered by name.
    fn list(
        &self,
        owner: UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// Get one of the owner's categories.
    fn get(
        &self,
        owner: UserId,
        id: CategoryId,
    ) -> impl std::future::Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Owner of a category regardless of who asks. `None` if it does not exist.
    fn owner_of(
        &self,
        id: CategoryId,
    ) -> impl std::future::Future<Output = Result<Option<UserId>, RepositoryError>> + Send;

    /// Find one of the owner's categories by exact name.
    fn find_by_name(
        &self,
        owner: UserId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Create a category. Duplicate names for the same owner yield `Conflict`.
    fn create(
        &self,
        owner: UserId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Category, RepositoryError>> + Send;

    /// Rename a category. `NotFound` if the owner has no such category.
    fn rename(
        &self,
        owner: UserId,
        id: CategoryId,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Category, RepositoryError>> + Send;

    /// Delete a category and its task links.
    fn delete(
        &self,
        owner: UserId,
        id: CategoryId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
