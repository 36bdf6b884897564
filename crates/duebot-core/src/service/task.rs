//! Task lifecycle: validation, category resolution and key derivation.

use chrono::{DateTime, SubsecRound, Utc};

use duebot_types::category::{Category, CategoryId, normalize_category_name};
use duebot_types::error::{RepositoryError, TaskError};
use duebot_types::task::{
    CreateTaskRequest, Task, TaskId, UpdateTaskRequest, normalize_title, task_key_source,
};
use duebot_types::user::UserId;

use crate::repository::category::CategoryRepository;
use crate::repository::task::TaskRepository;
use crate::service::hash::ContentHasher;

/// Service orchestrating task CRUD for a single caller at a time.
///
/// Generic over repository and hasher traits so duebot-core never depends on
/// duebot-infra.
pub struct TaskService<T: TaskRepository, C: CategoryRepository, H: ContentHasher> {
    task_repo: T,
    category_repo: C,
    hasher: H,
}

impl<T: TaskRepository, C: CategoryRepository, H: ContentHasher> TaskService<T, C, H> {
    pub fn new(task_repo: T, category_repo: C, hasher: H) -> Self {
        Self {
            task_repo,
            category_repo,
            hasher,
        }
    }

    /// The caller's tasks, newest first.
    pub async fn list(&self, owner: UserId) -> Result<Vec<Task>, TaskError> {
        self.task_repo.list(owner).await.map_err(storage)
    }

    pub async fn get(&self, owner: UserId, id: &TaskId) -> Result<Task, TaskError> {
        self.task_repo
            .get(owner, id)
            .await
            .map_err(storage)?
            .ok_or(TaskError::NotFound)
    }

    pub async fn create(
        &self,
        owner: UserId,
        request: CreateTaskRequest,
    ) -> Result<Task, TaskError> {
        self.create_at(owner, request, Utc::now()).await
    }

    /// Create a task as of `now`.
    ///
    /// The key is the first 32 hex characters of
    /// `hash("{owner}:{title}:{due}:{created_secs}")`. Timestamps are kept at
    /// microsecond precision, matching storage. Nothing is written until the
    /// whole request has been validated.
    pub async fn create_at(
        &self,
        owner: UserId,
        request: CreateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task, TaskError> {
        let now = now.trunc_subsecs(6);
        let due_date = request.due_date.trunc_subsecs(6);
        let title = normalize_title(&request.title).map_err(TaskError::InvalidTitle)?;
        if due_date <= now {
            return Err(TaskError::DueDateInPast);
        }

        let plan = self
            .plan_categories(
                owner,
                request.category_ids.as_deref().unwrap_or_default(),
                request.category_names.as_deref().unwrap_or_default(),
            )
            .await?;

        let source = task_key_source(owner, &title, &due_date, &now);
        let digest = self.hasher.compute_hash(&source);
        let id = TaskId::from_digest(&digest).ok_or_else(|| {
            TaskError::StorageError(format!("hasher produced an unusable digest: '{digest}'"))
        })?;

        let categories = self.apply_plan(owner, plan).await?;
        let task = Task {
            id,
            title,
            description: request.description.unwrap_or_default(),
            created_at: now,
            due_date,
            is_completed: request.is_completed.unwrap_or(false),
            notification_sent: false,
            categories,
        };

        let task = self.task_repo.create(owner, &task).await.map_err(storage)?;
        tracing::info!(owner = %owner, task_id = %task.id, due = %task.due_date, "task created");
        Ok(task)
    }

    pub async fn update(
        &self,
        owner: UserId,
        id: &TaskId,
        request: UpdateTaskRequest,
    ) -> Result<Task, TaskError> {
        self.update_at(owner, id, request, Utc::now()).await
    }

    /// Apply the provided fields of `request` as of `now`.
    ///
    /// A due date equal to the stored one is accepted even when already past.
    /// Categories named in the request are only created once every field has
    /// been validated.
    pub async fn update_at(
        &self,
        owner: UserId,
        id: &TaskId,
        request: UpdateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task, TaskError> {
        let mut task = self.get(owner, id).await?;

        if let Some(title) = &request.title {
            task.title = normalize_title(title).map_err(TaskError::InvalidTitle)?;
        }
        if let Some(due_date) = request.due_date {
            let due_date = due_date.trunc_subsecs(6);
            if due_date != task.due_date && due_date <= now {
                return Err(TaskError::DueDateInPast);
            }
            task.due_date = due_date;
        }

        let plan = if request.replaces_categories() {
            Some(
                self.plan_categories(
                    owner,
                    request.category_ids.as_deref().unwrap_or_default(),
                    request.category_names.as_deref().unwrap_or_default(),
                )
                .await?,
            )
        } else {
            None
        };
        if let Some(plan) = plan {
            task.categories = self.apply_plan(owner, plan).await?;
        }
        if let Some(description) = request.description {
            task.description = description;
        }
        if let Some(is_completed) = request.is_completed {
            task.is_completed = is_completed;
        }

        self.task_repo.update(owner, &task).await.map_err(|e| match e {
            RepositoryError::NotFound => TaskError::NotFound,
            other => storage(other),
        })
    }

    pub async fn delete(&self, owner: UserId, id: &TaskId) -> Result<(), TaskError> {
        self.task_repo.delete(owner, id).await.map_err(|e| match e {
            RepositoryError::NotFound => TaskError::NotFound,
            other => storage(other),
        })?;
        tracing::info!(owner = %owner, task_id = %id, "task deleted");
        Ok(())
    }

    /// Check category ids and names without writing anything.
    ///
    /// Ids must exist and belong to `owner`; names are normalized, blank ones
    /// skipped.
    async fn plan_categories(
        &self,
        owner: UserId,
        ids: &[CategoryId],
        names: &[String],
    ) -> Result<CategoryPlan, TaskError> {
        let mut resolved: Vec<Category> = Vec::with_capacity(ids.len());

        for &id in ids {
            let category = match self.category_repo.get(owner, id).await.map_err(storage)? {
                Some(category) => category,
                None => {
                    return Err(match self.category_repo.owner_of(id).await.map_err(storage)? {
                        Some(_) => TaskError::ForeignCategory(id),
                        None => TaskError::CategoryNotFound(id),
                    });
                }
            };
            push_unique(&mut resolved, category);
        }

        let mut normalized: Vec<String> = Vec::with_capacity(names.len());
        for raw in names {
            if raw.trim().is_empty() {
                continue;
            }
            let name = normalize_category_name(raw).map_err(TaskError::InvalidCategoryName)?;
            if !normalized.contains(&name) {
                normalized.push(name);
            }
        }

        Ok(CategoryPlan {
            resolved,
            names: normalized,
        })
    }

    /// Get-or-create the planned names and return the deduplicated union,
    /// first occurrence wins.
    async fn apply_plan(
        &self,
        owner: UserId,
        plan: CategoryPlan,
    ) -> Result<Vec<Category>, TaskError> {
        let mut resolved = plan.resolved;
        for name in &plan.names {
            let category = self.get_or_create_category(owner, name).await?;
            push_unique(&mut resolved, category);
        }
        Ok(resolved)
    }

    async fn get_or_create_category(
        &self,
        owner: UserId,
        name: &str,
    ) -> Result<Category, TaskError> {
        if let Some(existing) = self
            .category_repo
            .find_by_name(owner, name)
            .await
            .map_err(storage)?
        {
            return Ok(existing);
        }
        match self.category_repo.create(owner, name).await {
            Ok(created) => Ok(created),
            // Lost a race with a concurrent insert of the same name.
            Err(RepositoryError::Conflict(_)) => self
                .category_repo
                .find_by_name(owner, name)
                .await
                .map_err(storage)?
                .ok_or_else(|| TaskError::StorageError(format!("category '{name}' vanished"))),
            Err(e) => Err(storage(e)),
        }
    }
}

/// Validated category selection, pending creation of named categories.
struct CategoryPlan {
    resolved: Vec<Category>,
    names: Vec<String>,
}

fn push_unique(resolved: &mut Vec<Category>, category: Category) {
    if !resolved.iter().any(|c| c.id == category.id) {
        resolved.push(category);
    }
}

fn storage(e: RepositoryError) -> TaskError {
    TaskError::StorageError(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;
    use chrono::{Duration, TimeZone};

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    /// Deterministic stand-in producing 64 hex characters.
    struct MockHasher;

    impl ContentHasher for MockHasher {
        fn compute_hash(&self, content: &str) -> String {
            let mut h = DefaultHasher::new();
            content.hash(&mut h);
            let v = h.finish();
            format!("{v:016x}").repeat(4)
        }
    }

    type Service = TaskService<MemoryStore, MemoryStore, MockHasher>;

    fn service() -> (Service, MemoryStore) {
        let store = MemoryStore::new();
        (
            TaskService::new(store.clone(), store.clone(), MockHasher),
            store,
        )
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    fn request(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            description: None,
            due_date: now() + Duration::days(1),
            is_completed: None,
            category_ids: None,
            category_names: None,
        }
    }

    #[tokio::test]
    async fn test_create_derives_key_from_content() {
        let (service, _) = service();
        let task = service.create_at(UserId(5), request(" Buy milk "), now()).await.unwrap();

        let source = task_key_source(UserId(5), "Buy milk", &task.due_date, &now());
        let expected = TaskId::from_digest(&MockHasher.compute_hash(&source)).unwrap();
        assert_eq!(task.id, expected);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, "");
        assert!(!task.is_completed);
        assert!(!task.notification_sent);
        assert_eq!(task.created_at, now());
    }

    #[tokio::test]
    async fn test_create_rejects_past_due_and_blank_title() {
        let (service, _) = service();
        let mut req = request("Late");
        req.due_date = now();
        assert!(matches!(
            service.create_at(UserId(1), req, now()).await,
            Err(TaskError::DueDateInPast)
        ));
        assert!(matches!(
            service.create_at(UserId(1), request("   "), now()).await,
            Err(TaskError::InvalidTitle(_))
        ));
    }

    #[tokio::test]
    async fn test_create_with_names_get_or_creates() {
        let (service, store) = service();
        let existing = CategoryRepository::create(&store, UserId(1), "Work").await.unwrap();

        let mut req = request("Report");
        req.category_names = Some(vec![" Work ".into(), "".into(), "Urgent".into(), "Work".into()]);
        let task = service.create_at(UserId(1), req, now()).await.unwrap();

        let names: Vec<&str> = task.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Work", "Urgent"]);
        assert_eq!(task.categories[0].id, existing.id);
        assert_eq!(CategoryRepository::list(&store, UserId(1)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_with_ids_checks_ownership() {
        let (service, store) = service();
        let mine = CategoryRepository::create(&store, UserId(1), "Home").await.unwrap();
        let theirs = CategoryRepository::create(&store, UserId(2), "Home").await.unwrap();

        let mut req = request("Clean");
        req.category_ids = Some(vec![theirs.id]);
        assert!(matches!(
            service.create_at(UserId(1), req, now()).await,
            Err(TaskError::ForeignCategory(id)) if id == theirs.id
        ));

        let mut req = request("Clean");
        req.category_ids = Some(vec![CategoryId(999)]);
        assert!(matches!(
            service.create_at(UserId(1), req, now()).await,
            Err(TaskError::CategoryNotFound(CategoryId(999)))
        ));

        let mut req = request("Clean");
        req.category_ids = Some(vec![mine.id]);
        req.category_names = Some(vec!["Home".into()]);
        let task = service.create_at(UserId(1), req, now()).await.unwrap();
        assert_eq!(task.categories, vec![mine]);
    }

    #[tokio::test]
    async fn test_tasks_are_scoped_to_owner() {
        let (service, _) = service();
        let task = service.create_at(UserId(1), request("Mine"), now()).await.unwrap();

        assert!(matches!(
            service.get(UserId(2), &task.id).await,
            Err(TaskError::NotFound)
        ));
        assert!(matches!(
            service.delete(UserId(2), &task.id).await,
            Err(TaskError::NotFound)
        ));
        assert!(service.list(UserId(2)).await.unwrap().is_empty());
        assert_eq!(service.list(UserId(1)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (service, _) = service();
        service.create_at(UserId(1), request("old"), now()).await.unwrap();
        service
            .create_at(UserId(1), request("new"), now() + Duration::minutes(1))
            .await
            .unwrap();
        let titles: Vec<String> = service
            .list(UserId(1))
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn test_update_keeps_key_and_validates_due_date() {
        let (service, _) = service();
        let task = service.create_at(UserId(1), request("Draft"), now()).await.unwrap();
        let later = now() + Duration::days(3);

        let updated = service
            .update_at(
                UserId(1),
                &task.id,
                UpdateTaskRequest {
                    title: Some("Final".into()),
                    is_completed: Some(true),
                    ..Default::default()
                },
                later,
            )
            .await
            .unwrap();
        assert_eq!(updated.id, task.id);
        assert_eq!(updated.title, "Final");
        assert!(updated.is_completed);

        // Unchanged past due date is fine, a new past one is not.
        let same_due = UpdateTaskRequest {
            due_date: Some(task.due_date),
            ..Default::default()
        };
        assert!(service.update_at(UserId(1), &task.id, same_due, later).await.is_ok());

        let new_past = UpdateTaskRequest {
            due_date: Some(now() + Duration::days(2)),
            ..Default::default()
        };
        assert!(matches!(
            service.update_at(UserId(1), &task.id, new_past, later).await,
            Err(TaskError::DueDateInPast)
        ));
    }

    #[tokio::test]
    async fn test_update_category_lists() {
        let (service, _) = service();
        let mut req = request("Tagged");
        req.category_names = Some(vec!["A".into()]);
        let task = service.create_at(UserId(1), req, now()).await.unwrap();

        let untouched = service
            .update_at(
                UserId(1),
                &task.id,
                UpdateTaskRequest {
                    description: Some("notes".into()),
                    ..Default::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(untouched.categories.len(), 1);
        assert_eq!(untouched.description, "notes");

        let replaced = service
            .update_at(
                UserId(1),
                &task.id,
                UpdateTaskRequest {
                    category_names: Some(vec!["B".into()]),
                    ..Default::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert_eq!(replaced.categories[0].name, "B");

        let cleared = service
            .update_at(
                UserId(1),
                &task.id,
                UpdateTaskRequest {
                    category_ids: Some(vec![]),
                    ..Default::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert!(cleared.categories.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_requests_create_no_categories() {
        let (service, store) = service();
        let task = service.create_at(UserId(1), request("Plain"), now()).await.unwrap();
        let later = now() + Duration::days(5);

        let past_due = UpdateTaskRequest {
            due_date: Some(now() + Duration::days(2)),
            category_names: Some(vec!["Fresh".into()]),
            ..Default::default()
        };
        assert!(matches!(
            service.update_at(UserId(1), &task.id, past_due, later).await,
            Err(TaskError::DueDateInPast)
        ));

        let blank_title = UpdateTaskRequest {
            title: Some("  ".into()),
            category_names: Some(vec!["Fresh".into()]),
            ..Default::default()
        };
        assert!(matches!(
            service.update_at(UserId(1), &task.id, blank_title, now()).await,
            Err(TaskError::InvalidTitle(_))
        ));

        let mut bad_name = request("Tagged");
        bad_name.category_names = Some(vec!["Fresh".into(), "x".repeat(500)]);
        assert!(matches!(
            service.create_at(UserId(1), bad_name, now()).await,
            Err(TaskError::InvalidCategoryName(_))
        ));

        let mut missing_id = request("Tagged");
        missing_id.category_names = Some(vec!["Fresh".into()]);
        missing_id.category_ids = Some(vec![CategoryId(42)]);
        assert!(matches!(
            service.create_at(UserId(1), missing_id, now()).await,
            Err(TaskError::CategoryNotFound(CategoryId(42)))
        ));

        assert!(CategoryRepository::list(&store, UserId(1)).await.unwrap().is_empty());
        assert!(store.task(&task.id).unwrap().categories.is_empty());
    }

    #[tokio::test]
    async fn test_create_truncates_to_microseconds() {
        let (service, store) = service();
        let created = now() + Duration::nanoseconds(1_234_567);
        let mut req = request("Precise");
        req.due_date = now() + Duration::days(1) + Duration::nanoseconds(987_654_321);

        let task = service.create_at(UserId(1), req, created).await.unwrap();
        assert_eq!(task.created_at, now() + Duration::microseconds(1_234));
        assert_eq!(
            task.due_date,
            now() + Duration::days(1) + Duration::microseconds(987_654)
        );
        assert_eq!(store.task(&task.id).unwrap(), task);
    }

    #[tokio::test]
    async fn test_update_does_not_reset_notification_flag() {
        let (service, store) = service();
        let task = service.create_at(UserId(1), request("Ping"), now()).await.unwrap();
        TaskRepository::mark_notified(&store, &task.id).await.unwrap();

        let updated = service
            .update_at(
                UserId(1),
                &task.id,
                UpdateTaskRequest {
                    title: Some("Pong".into()),
                    ..Default::default()
                },
                now(),
            )
            .await
            .unwrap();
        assert!(updated.notification_sent);
        assert!(store.task(&task.id).unwrap().notification_sent);
    }
}
