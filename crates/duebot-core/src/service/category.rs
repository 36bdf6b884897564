//! Per-user category management.

use duebot_types::category::{
    Category, CategoryId, CreateCategoryRequest, UpdateCategoryRequest, normalize_category_name,
};
use duebot_types::error::{CategoryError, RepositoryError};
use duebot_types::user::UserId;

use crate::repository::category::CategoryRepository;

pub struct CategoryService<C: CategoryRepository> {
    category_repo: C,
}

impl<C: CategoryRepository> CategoryService<C> {
    pub fn new(category_repo: C) -> Self {
        Self { category_repo }
    }

    pub async fn list(&self, owner: UserId) -> Result<Vec<Category>, CategoryError> {
        self.category_repo.list(owner).await.map_err(storage)
    }

    pub async fn get(&self, owner: UserId, id: CategoryId) -> Result<Category, CategoryError> {
        self.category_repo
            .get(owner, id)
            .await
            .map_err(storage)?
            .ok_or(CategoryError::NotFound)
    }

    pub async fn create(
        &self,
        owner: UserId,
        request: CreateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let name = normalize_category_name(&request.name).map_err(CategoryError::InvalidName)?;
        let category = self
            .category_repo
            .create(owner, &name)
            .await
            .map_err(|e| conflict_or_storage(e, &name))?;
        tracing::debug!(owner = %owner, category_id = %category.id, "category created");
        Ok(category)
    }

    /// Rename a category. Keeping its current name is a no-op success.
    pub async fn rename(
        &self,
        owner: UserId,
        id: CategoryId,
        request: UpdateCategoryRequest,
    ) -> Result<Category, CategoryError> {
        let name = normalize_category_name(&request.name).map_err(CategoryError::InvalidName)?;
        self.category_repo
            .rename(owner, id, &name)
            .await
            .map_err(|e| conflict_or_storage(e, &name))
    }

    /// Delete a category. Tasks lose the link but are kept.
    pub async fn delete(&self, owner: UserId, id: CategoryId) -> Result<(), CategoryError> {
        self.category_repo
            .delete(owner, id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CategoryError::NotFound,
                other => storage(other),
            })
    }
}

fn storage(e: RepositoryError) -> CategoryError {
    CategoryError::StorageError(e.to_string())
}

fn conflict_or_storage(e: RepositoryError, name: &str) -> CategoryError {
    match e {
        RepositoryError::Conflict(_) => CategoryError::NameConflict(name.to_string()),
        RepositoryError::NotFound => CategoryError::NotFound,
        other => storage(other),
    }
}
