//! SQLite category repository.

use sqlx::Row;

use duebot_core::repository::category::CategoryRepository;
use duebot_types::category::{Category, CategoryId};
use duebot_types::error::RepositoryError;
use duebot_types::user::UserId;

use super::map_write_error;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `CategoryRepository`.
#[derive(Clone)]
pub struct SqliteCategoryRepository {
    pool: DatabasePool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Category, RepositoryError> {
    Ok(Category {
        id: CategoryId(
            row.try_get("id")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
        ),
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
    })
}

impl CategoryRepository for SqliteCategoryRepository {
    async fn list(&self, owner: UserId) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query("SELECT id, name FROM categories WHERE user_id = ? ORDER BY name")
            .bind(owner.0)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(category_from_row).collect()
    }

    async fn get(&self, owner: UserId, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = ? AND user_id = ?")
            .bind(id.0)
            .bind(owner.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(category_from_row).transpose()
    }

    async fn owner_of(&self, id: CategoryId) -> Result<Option<UserId>, RepositoryError> {
        let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM categories WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(owner.map(|(user_id,)| UserId(user_id)))
    }

    async fn find_by_name(
        &self,
        owner: UserId,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        // Writer: callers look a name up right after a conflicting insert.
        let row = sqlx::query("SELECT id, name FROM categories WHERE user_id = ? AND name = ?")
            .bind(owner.0)
            .bind(name)
            .fetch_optional(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(category_from_row).transpose()
    }

    async fn create(&self, owner: UserId, name: &str) -> Result<Category, RepositoryError> {
        let result = sqlx::query("INSERT INTO categories (user_id, name) VALUES (?, ?)")
            .bind(owner.0)
            .bind(name)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_write_error(e, || format!("category '{name}' already exists")))?;

        Ok(Category {
            id: CategoryId(result.last_insert_rowid()),
            name: name.to_string(),
        })
    }

    async fn rename(
        &self,
        owner: UserId,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let result = sqlx::query("UPDATE categories SET name = ? WHERE id = ? AND user_id = ?")
            .bind(name)
            .bind(id.0)
            .bind(owner.0)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_write_error(e, || format!("category '{name}' already exists")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    async fn delete(&self, owner: UserId, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
            .bind(id.0)
            .bind(owner.0)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::test_pool;
    use crate::sqlite::user::SqliteUserRepository;
    use duebot_core::repository::user::UserRepository;

    async fn setup() -> (SqliteCategoryRepository, UserId, UserId) {
        let pool = test_pool().await;
        let users = SqliteUserRepository::new(pool.clone());
        let alice = users.get_or_create_by_username("tg_1").await.unwrap().id;
        let bob = users.get_or_create_by_username("tg_2").await.unwrap().id;
        (SqliteCategoryRepository::new(pool), alice, bob)
    }

    #[tokio::test]
    async fn test_create_and_list_sorted() {
        let (repo, alice, bob) = setup().await;
        repo.create(alice, "Work").await.unwrap();
        repo.create(alice, "Home").await.unwrap();
        repo.create(bob, "Gym").await.unwrap();

        let names: Vec<String> = repo.list(alice).await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Home", "Work"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_per_owner() {
        let (repo, alice, bob) = setup().await;
        repo.create(alice, "Work").await.unwrap();
        assert!(matches!(
            repo.create(alice, "Work").await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(repo.create(bob, "Work").await.is_ok());
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let (repo, alice, bob) = setup().await;
        let cat = repo.create(alice, "Work").await.unwrap();

        assert_eq!(repo.get(alice, cat.id).await.unwrap(), Some(cat.clone()));
        assert!(repo.get(bob, cat.id).await.unwrap().is_none());
        assert_eq!(repo.owner_of(cat.id).await.unwrap(), Some(alice));
        assert!(repo.owner_of(CategoryId(404)).await.unwrap().is_none());
        assert!(matches!(repo.delete(bob, cat.id).await, Err(RepositoryError::NotFound)));
        assert!(matches!(
            repo.rename(bob, cat.id, "Mine").await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let (repo, alice, _) = setup().await;
        let work = repo.create(alice, "Work").await.unwrap();
        repo.create(alice, "Home").await.unwrap();

        assert!(repo.rename(alice, work.id, "Work").await.is_ok());
        assert!(matches!(
            repo.rename(alice, work.id, "Home").await,
            Err(RepositoryError::Conflict(_))
        ));
        let renamed = repo.rename(alice, work.id, "Office").await.unwrap();
        assert_eq!(repo.find_by_name(alice, "Office").await.unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, alice, _) = setup().await;
        let cat = repo.create(alice, "Temp").await.unwrap();
        repo.delete(alice, cat.id).await.unwrap();
        assert!(repo.list(alice).await.unwrap().is_empty());
    }
}
