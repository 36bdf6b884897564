//! Header authentication and Telegram chat registration.

use duebot_types::error::{AccountError, RepositoryError};
use duebot_types::user::{
    ProfileView, Registration, User, UserProfile, telegram_username,
};

use crate::repository::user::UserRepository;

/// Resolves callers from the identifier header and binds them to a chat.
///
/// There is no credential check: whoever names an id acts as that user.
pub struct AccountService<U: UserRepository> {
    user_repo: U,
}

impl<U: UserRepository> AccountService<U> {
    pub fn new(user_repo: U) -> Self {
        Self { user_repo }
    }

    /// Parse the raw header value into a Telegram user id.
    pub fn parse_external_id(raw: &str) -> Result<i64, AccountError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AccountError::MissingExternalId);
        }
        trimmed
            .parse::<i64>()
            .map_err(|_| AccountError::InvalidExternalId(trimmed.to_string()))
    }

    /// Get or create the account `tg_<id>` for a header value.
    pub async fn authenticate(&self, external_id: &str) -> Result<User, AccountError> {
        let telegram_id = Self::parse_external_id(external_id)?;
        let username = telegram_username(telegram_id);
        self.user_repo
            .get_or_create_by_username(&username)
            .await
            .map_err(|e| AccountError::StorageError(e.to_string()))
    }

    /// Look up the account of a Telegram user without creating it.
    pub async fn find(&self, telegram_user_id: i64) -> Result<Option<User>, AccountError> {
        self.user_repo
            .find_by_username(&telegram_username(telegram_user_id))
            .await
            .map_err(|e| AccountError::StorageError(e.to_string()))
    }

    /// Bind `telegram_chat_id` to the caller's profile.
    ///
    /// An already stored Telegram user id wins over the header value.
    pub async fn register(
        &self,
        user: &User,
        header_id: i64,
        telegram_chat_id: Option<i64>,
    ) -> Result<Registration, AccountError> {
        let chat_id = match telegram_chat_id {
            Some(id) if id != 0 => id,
            _ => return Err(AccountError::MissingChatId),
        };

        let existing = self
            .user_repo
            .get_profile(user.id)
            .await
            .map_err(|e| AccountError::StorageError(e.to_string()))?;

        let telegram_user_id = existing
            .and_then(|p| p.telegram_user_id)
            .unwrap_or(header_id);

        let profile = UserProfile {
            user_id: user.id,
            telegram_user_id: Some(telegram_user_id),
            telegram_chat_id: Some(chat_id),
        };

        let saved = self
            .user_repo
            .upsert_profile(&profile)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AccountError::ChatAlreadyBound(chat_id),
                other => AccountError::StorageError(other.to_string()),
            })?;

        tracing::info!(user_id = %user.id, chat_id, "telegram chat registered");

        Ok(Registration {
            user_id: user.id,
            username: user.username.clone(),
            profile: ProfileView::from(&saved),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory::MemoryStore;

    #[tokio::test]
    async fn test_authenticate_creates_once() {
        let service = AccountService::new(MemoryStore::new());
        let first = service.authenticate("42").await.unwrap();
        let second = service.authenticate(" 42 ").await.unwrap();
        assert_eq!(first.username, "tg_42");
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_header() {
        let service = AccountService::new(MemoryStore::new());
        assert!(matches!(
            service.authenticate("  ").await,
            Err(AccountError::MissingExternalId)
        ));
        assert!(matches!(
            service.authenticate("abc").await,
            Err(AccountError::InvalidExternalId(v)) if v == "abc"
        ));
    }

    #[tokio::test]
    async fn test_find_does_not_create() {
        let service = AccountService::new(MemoryStore::new());
        assert!(service.find(5).await.unwrap().is_none());
        let user = service.authenticate("5").await.unwrap();
        assert_eq!(service.find(5).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_register_requires_chat_id() {
        let service = AccountService::new(MemoryStore::new());
        let user = service.authenticate("7").await.unwrap();
        assert!(matches!(
            service.register(&user, 7, None).await,
            Err(AccountError::MissingChatId)
        ));
        assert!(matches!(
            service.register(&user, 7, Some(0)).await,
            Err(AccountError::MissingChatId)
        ));
    }

    #[tokio::test]
    async fn test_register_keeps_existing_telegram_user_id() {
        let store = MemoryStore::new();
        let service = AccountService::new(store.clone());
        let user = service.authenticate("7").await.unwrap();

        let first = service.register(&user, 7, Some(700)).await.unwrap();
        assert_eq!(first.profile.telegram_user_id, Some(7));
        assert_eq!(first.profile.telegram_chat_id, Some(700));

        let second = service.register(&user, 99, Some(701)).await.unwrap();
        assert_eq!(second.profile.telegram_user_id, Some(7));
        assert_eq!(second.profile.telegram_chat_id, Some(701));
        assert_eq!(second.username, "tg_7");
    }

    #[tokio::test]
    async fn test_register_chat_bound_elsewhere() {
        let service = AccountService::new(MemoryStore::new());
        let alice = service.authenticate("1").await.unwrap();
        let bob = service.authenticate("2").await.unwrap();
        service.register(&alice, 1, Some(500)).await.unwrap();
        assert!(matches!(
            service.register(&bob, 2, Some(500)).await,
            Err(AccountError::ChatAlreadyBound(500))
        ));
    }
}
