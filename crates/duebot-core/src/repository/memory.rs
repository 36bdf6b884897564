//! In-memory repository implementations for service tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use duebot_types::category::{Category, CategoryId};
use duebot_types::error::RepositoryError;
use duebot_types::task::{DueTask, Task, TaskId};
use duebot_types::user::{User, UserId, UserProfile};

use super::category::CategoryRepository;
use super::task::TaskRepository;
use super::user::UserRepository;

#[derive(Default)]
struct State {
    users: Vec<User>,
    profiles: Vec<UserProfile>,
    categories: Vec<(UserId, Category)>,
    tasks: Vec<(UserId, Task)>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// One shared store implementing every repository trait.
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a task bypassing service validation (e.g. already overdue).
    pub(crate) fn insert_task(&self, owner: UserId, task: Task) {
        self.state.lock().unwrap().tasks.push((owner, task));
    }

    pub(crate) fn task(&self, id: &TaskId) -> Option<Task> {
        let state = self.state.lock().unwrap();
        state
            .tasks
            .iter()
            .find(|(_, t)| &t.id == id)
            .map(|(_, t)| t.clone())
    }
}

impl UserRepository for MemoryStore {
    async fn get_or_create_by_username(&self, username: &str) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(user) = state.users.iter().find(|u| u.username == username) {
            return Ok(user.clone());
        }
        let user = User {
            id: UserId(state.next_id()),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let clash = state.profiles.iter().any(|p| {
            p.user_id != profile.user_id
                && ((profile.telegram_chat_id.is_some()
                    && p.telegram_chat_id == profile.telegram_chat_id)
                    || (profile.telegram_user_id.is_some()
                        && p.telegram_user_id == profile.telegram_user_id))
        });
        if clash {
            return Err(RepositoryError::Conflict("telegram id already bound".to_string()));
        }
        state.profiles.retain(|p| p.user_id != profile.user_id);
        state.profiles.push(profile.clone());
        Ok(profile.clone())
    }
}

impl CategoryRepository for MemoryStore {
    async fn list(&self, owner: UserId) -> Result<Vec<Category>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut categories: Vec<Category> = state
            .categories
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, c)| c.clone())
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get(&self, owner: UserId, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|(o, c)| *o == owner && c.id == id)
            .map(|(_, c)| c.clone()))
    }

    async fn owner_of(&self, id: CategoryId) -> Result<Option<UserId>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.categories.iter().find(|(_, c)| c.id == id).map(|(o, _)| *o))
    }

    async fn find_by_name(
        &self,
        owner: UserId,
        name: &str,
    ) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .categories
            .iter()
            .find(|(o, c)| *o == owner && c.name == name)
            .map(|(_, c)| c.clone()))
    }

    async fn create(&self, owner: UserId, name: &str) -> Result<Category, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.categories.iter().any(|(o, c)| *o == owner && c.name == name) {
            return Err(RepositoryError::Conflict(format!("category '{name}' exists")));
        }
        let category = Category {
            id: CategoryId(state.next_id()),
            name: name.to_string(),
        };
        state.categories.push((owner, category.clone()));
        Ok(category)
    }

    async fn rename(
        &self,
        owner: UserId,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state
            .categories
            .iter()
            .any(|(o, c)| *o == owner && c.name == name && c.id != id)
        {
            return Err(RepositoryError::Conflict(format!("category '{name}' exists")));
        }
        let (_, category) = state
            .categories
            .iter_mut()
            .find(|(o, c)| *o == owner && c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        category.name = name.to_string();
        let renamed = category.clone();
        for (_, task) in state.tasks.iter_mut() {
            for linked in task.categories.iter_mut().filter(|c| c.id == id) {
                linked.name = name.to_string();
            }
        }
        Ok(renamed)
    }

    async fn delete(&self, owner: UserId, id: CategoryId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.categories.len();
        state.categories.retain(|(o, c)| !(*o == owner && c.id == id));
        if state.categories.len() == before {
            return Err(RepositoryError::NotFound);
        }
        for (_, task) in state.tasks.iter_mut() {
            task.categories.retain(|c| c.id != id);
        }
        Ok(())
    }
}

impl TaskRepository for MemoryStore {
    async fn list(&self, owner: UserId) -> Result<Vec<Task>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|(o, _)| *o == owner)
            .map(|(_, t)| t.clone())
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn get(&self, owner: UserId, id: &TaskId) -> Result<Option<Task>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .find(|(o, t)| *o == owner && &t.id == id)
            .map(|(_, t)| t.clone()))
    }

    async fn create(&self, owner: UserId, task: &Task) -> Result<Task, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.tasks.iter().any(|(_, t)| t.id == task.id) {
            return Err(RepositoryError::Conflict(format!("task {} exists", task.id)));
        }
        state.tasks.push((owner, task.clone()));
        Ok(task.clone())
    }

    async fn update(&self, owner: UserId, task: &Task) -> Result<Task, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let (_, stored) = state
            .tasks
            .iter_mut()
            .find(|(o, t)| *o == owner && t.id == task.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = task.clone();
        Ok(task.clone())
    }

    async fn delete(&self, owner: UserId, id: &TaskId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let before = state.tasks.len();
        state.tasks.retain(|(o, t)| !(*o == owner && &t.id == id));
        if state.tasks.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_due_unnotified(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<DueTask>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .tasks
            .iter()
            .filter(|(_, t)| !t.is_completed && !t.notification_sent && t.due_date <= now)
            .map(|(owner, t)| DueTask {
                task: t.clone(),
                user_id: *owner,
                chat_id: state
                    .profiles
                    .iter()
                    .find(|p| p.user_id == *owner)
                    .and_then(|p| p.telegram_chat_id),
            })
            .collect())
    }

    async fn mark_notified(&self, id: &TaskId) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let (_, task) = state
            .tasks
            .iter_mut()
            .find(|(_, t)| &t.id == id)
            .ok_or(RepositoryError::NotFound)?;
        task.notification_sent = true;
        Ok(())
    }
}
