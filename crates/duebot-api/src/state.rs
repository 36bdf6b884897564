//! Application state wiring all services together.
//!
//! Services are generic over repository and hasher traits; AppState pins them
//! to the SQLite and SHA-256 implementations.

use std::path::PathBuf;
use std::sync::Arc;

use chrono_tz::Tz;

use duebot_core::service::account::AccountService;
use duebot_core::service::category::CategoryService;
use duebot_core::service::task::TaskService;
use duebot_infra::config::{database_url, load_config};
use duebot_infra::crypto::hash::Sha256ContentHasher;
use duebot_infra::sqlite::category::SqliteCategoryRepository;
use duebot_infra::sqlite::pool::DatabasePool;
use duebot_infra::sqlite::task::SqliteTaskRepository;
use duebot_infra::sqlite::user::SqliteUserRepository;
use duebot_types::config::AppConfig;

pub type ConcreteAccountService = AccountService<SqliteUserRepository>;

pub type ConcreteCategoryService = CategoryService<SqliteCategoryRepository>;

pub type ConcreteTaskService =
    TaskService<SqliteTaskRepository, SqliteCategoryRepository, Sha256ContentHasher>;

/// Shared application state used by CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<ConcreteAccountService>,
    pub category_service: Arc<ConcreteCategoryService>,
    pub task_service: Arc<ConcreteTaskService>,
    pub config: Arc<AppConfig>,
    pub tz: Tz,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Connect to the configured database and wire services.
    pub async fn init(config: AppConfig, data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let db_url = database_url(&config, &data_dir);
        let db_pool = DatabasePool::new(&db_url).await?;
        Self::from_pool(config, db_pool)
    }

    /// Wire services over an already opened pool.
    pub fn from_pool(config: AppConfig, db_pool: DatabasePool) -> anyhow::Result<Self> {
        let tz = config.tz().map_err(anyhow::Error::msg)?;

        let account_service = AccountService::new(SqliteUserRepository::new(db_pool.clone()));
        let category_service =
            CategoryService::new(SqliteCategoryRepository::new(db_pool.clone()));
        let task_service = TaskService::new(
            SqliteTaskRepository::new(db_pool.clone()),
            SqliteCategoryRepository::new(db_pool.clone()),
            Sha256ContentHasher::new(),
        );

        Ok(Self {
            account_service: Arc::new(account_service),
            category_service: Arc::new(category_service),
            task_service: Arc::new(task_service),
            config: Arc::new(config),
            tz,
            db_pool,
        })
    }
}

/// Load configuration for a command and resolve the data directory.
pub async fn load() -> (AppConfig, PathBuf) {
    let data_dir = duebot_infra::config::resolve_data_dir();
    let config = load_config(&data_dir).await;
    (config, data_dir)
}
