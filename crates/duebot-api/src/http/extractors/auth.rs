//! Caller identification from the `X-Telegram-User-Id` header.
//!
//! There is no credential check: the header value alone names the acting
//! user, whose `tg_<id>` account is created on first use.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use duebot_types::error::AccountError;
use duebot_types::user::User;

use crate::http::error::AppError;
use crate::state::{AppState, ConcreteAccountService};

pub const USER_ID_HEADER: &str = "x-telegram-user-id";

/// The authenticated caller.
pub struct CurrentUser {
    pub user: User,
    /// The id the header carried.
    pub telegram_user_id: i64,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = match parts.headers.get(USER_ID_HEADER) {
            Some(value) => value.to_str().map_err(|_| {
                AccountError::InvalidExternalId("<non-ascii header>".to_string())
            })?,
            None => return Err(AccountError::MissingExternalId.into()),
        };

        let telegram_user_id = ConcreteAccountService::parse_external_id(raw)?;
        let user = state.account_service.authenticate(raw).await?;

        Ok(CurrentUser {
            user,
            telegram_user_id,
        })
    }
}
