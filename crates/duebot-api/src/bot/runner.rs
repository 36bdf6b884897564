//! Long-polling loop that turns Telegram updates into API calls.
//!
//! Dialog state lives in memory, one [`TaskDialog`] per chat. A dialog is
//! taken out of the map while an update for its chat is processed and put
//! back only if it continues, so no map guard is held across an await.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use duebot_core::dialog::{
    DialogAction, DialogInput, DialogOutcome, DialogStep, TaskDialog, TaskSubmission,
};
use duebot_infra::backend::{BackendClient, BackendError};
use duebot_infra::telegram::TelegramClient;
use duebot_infra::telegram::client::next_offset;
use duebot_infra::telegram::types::{CallbackQuery, Message, ReplyMarkup, Update};
use duebot_types::error::NotifyError;

use super::commands::{self, BotCommand};
use super::format::{GREETING, REGISTER_FAILED, format_created, format_task_list};
use super::keyboard::{inline_markup, main_menu};

/// Long-poll timeout passed to `getUpdates`.
const POLL_TIMEOUT_SECS: u64 = 30;

/// Pause after a failed poll.
const RETRY_DELAY: Duration = Duration::from_secs(5);

const CANCELLED: &str = "Task creation cancelled.";

pub struct BotRunner {
    telegram: Arc<TelegramClient>,
    backend: BackendClient,
    dialogs: DashMap<i64, TaskDialog>,
    tz: Tz,
}

impl BotRunner {
    pub fn new(telegram: Arc<TelegramClient>, backend: BackendClient, tz: Tz) -> Self {
        Self {
            telegram,
            backend,
            dialogs: DashMap::new(),
            tz,
        }
    }

    /// Poll until `shutdown` is cancelled.
    ///
    /// Fails fast when the token is missing or rejected by `getMe`.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), NotifyError> {
        let me = self.telegram.get_me().await?;
        tracing::info!(bot_id = me.id, username = ?me.username, "bot polling started");

        let mut offset = None;
        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.telegram.get_updates(offset, POLL_TIMEOUT_SECS) => polled,
            };

            match polled {
                Ok(updates) => {
                    offset = next_offset(offset, &updates);
                    for update in updates {
                        self.handle_update(update).await;
                    }
                }
                Err(NotifyError::NotConfigured) => return Err(NotifyError::NotConfigured),
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed, retrying");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            }
        }

        tracing::info!("bot polling stopped");
        Ok(())
    }

    pub async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let (Some(text), Some(from)) = (message.text.as_deref(), message.from.as_ref()) else {
            return;
        };
        let chat_id = message.chat.id;
        let user_id = from.id;

        match commands::parse(text) {
            Some(command) => {
                if let Err(e) = self.backend.register_user(user_id, chat_id).await {
                    tracing::warn!(user_id, chat_id, error = %e, "registration failed");
                    self.send(chat_id, REGISTER_FAILED, None).await;
                    return;
                }
                self.run_command(command, chat_id, user_id).await;
            }
            None => match self.dialogs.remove(&chat_id) {
                Some((_, dialog)) => {
                    self.advance(chat_id, user_id, dialog, DialogInput::Text(text.to_string()))
                        .await;
                }
                None => {
                    self.send(
                        chat_id,
                        "Use /newtask to create a task or /tasks to list them.",
                        Some(&main_menu()),
                    )
                    .await;
                }
            },
        }
    }

    async fn run_command(&self, command: BotCommand, chat_id: i64, user_id: i64) {
        match command {
            BotCommand::Start => {
                self.send(chat_id, GREETING, Some(&main_menu())).await;
            }
            BotCommand::NewTask => {
                let dialog = TaskDialog::new(self.tz);
                self.show(chat_id, user_id, dialog, None).await;
            }
            BotCommand::Tasks => {
                let text = match self.backend.list_tasks(user_id).await {
                    Ok(tasks) => format_task_list(&tasks, &self.tz),
                    Err(e) => format!("Failed to load tasks: {e}"),
                };
                self.send(chat_id, &text, Some(&main_menu())).await;
            }
            BotCommand::Cancel => {
                let text = if self.dialogs.remove(&chat_id).is_some() {
                    CANCELLED
                } else {
                    "Nothing to cancel."
                };
                self.send(chat_id, text, Some(&main_menu())).await;
            }
            BotCommand::Unknown(cmd) => {
                let text = format!("Unknown command {cmd}. Use /newtask or /tasks.");
                self.send(chat_id, &text, Some(&main_menu())).await;
            }
        }
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        let action = callback
            .data
            .as_deref()
            .and_then(|d| d.parse::<DialogAction>().ok());
        let chat_id = callback.message.as_ref().map(|m| m.chat.id);

        let (Some(action), Some(chat_id)) = (action, chat_id) else {
            tracing::debug!(data = ?callback.data, "ignoring unknown callback");
            self.ack(&callback.id, None).await;
            return;
        };

        let Some((_, dialog)) = self.dialogs.remove(&chat_id) else {
            self.ack(&callback.id, Some("This dialog has expired.")).await;
            return;
        };

        self.ack(&callback.id, action.toast().as_deref()).await;
        self.advance(chat_id, callback.from.id, dialog, DialogInput::Action(action))
            .await;
    }

    /// Feed one input and carry out what the dialog asks for.
    async fn advance(&self, chat_id: i64, user_id: i64, mut dialog: TaskDialog, input: DialogInput) {
        let mut outcome = dialog.handle(input, Utc::now());
        loop {
            match outcome {
                DialogOutcome::Show { notice } => {
                    self.show(chat_id, user_id, dialog, notice).await;
                    return;
                }
                DialogOutcome::Retry(text) => {
                    self.send(chat_id, &text, None).await;
                    self.dialogs.insert(chat_id, dialog);
                    return;
                }
                DialogOutcome::CreateCategory(name) => {
                    match self.backend.create_category(user_id, &name).await {
                        Ok(category) => outcome = dialog.category_created(category.name),
                        // The name already exists for this user: use it.
                        Err(BackendError::Api { status: 409, .. }) => {
                            outcome = dialog.category_created(name)
                        }
                        Err(e) => {
                            let text = format!("Could not create the category: {e}");
                            self.send(chat_id, &text, None).await;
                            self.dialogs.insert(chat_id, dialog);
                            return;
                        }
                    }
                }
                DialogOutcome::Submit(submission) => {
                    self.submit(chat_id, user_id, submission).await;
                    return;
                }
                DialogOutcome::Cancelled => {
                    self.send(chat_id, CANCELLED, Some(&main_menu())).await;
                    return;
                }
            }
        }
    }

    /// Render the dialog's current screen and keep the dialog.
    async fn show(&self, chat_id: i64, user_id: i64, mut dialog: TaskDialog, notice: Option<String>) {
        if dialog.step() == DialogStep::CategorySelect {
            let categories = match self.backend.list_categories(user_id).await {
                Ok(categories) => categories,
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "could not load categories");
                    Vec::new()
                }
            };
            dialog.set_categories(categories);
        }

        let screen = dialog.screen();
        let text = match notice {
            Some(notice) => format!("{notice}\n\n{}", screen.text),
            None => screen.text.clone(),
        };
        self.send(chat_id, &text, Some(&inline_markup(&screen))).await;
        self.dialogs.insert(chat_id, dialog);
    }

    async fn submit(&self, chat_id: i64, user_id: i64, submission: TaskSubmission) {
        let result = self
            .backend
            .create_task(
                user_id,
                &submission.title,
                &submission.description,
                submission.due_at,
                &submission.categories,
            )
            .await;

        match result {
            Ok(task) => {
                tracing::info!(chat_id, task_id = %task.id, "task created from chat");
                let text = format_created(&task.due_date, &self.tz);
                self.send(chat_id, &text, Some(&main_menu())).await;
            }
            Err(e) => {
                let text = format!("Failed to create task: {e}");
                self.send(chat_id, &text, Some(&main_menu())).await;
            }
        }
    }

    async fn send(&self, chat_id: i64, text: &str, markup: Option<&ReplyMarkup>) {
        if let Err(e) = self.telegram.send_message(chat_id, text, markup).await {
            tracing::error!(chat_id, error = %e, "sendMessage failed");
        }
    }

    async fn ack(&self, callback_id: &str, text: Option<&str>) {
        if let Err(e) = self.telegram.answer_callback_query(callback_id, text).await {
            tracing::debug!(error = %e, "answerCallbackQuery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duebot_types::config::{BackendConfig, TelegramConfig};
    use mockito::{Matcher, Server};
    use serde_json::json;

    const SEND_PATH: &str = "/bot123:testtoken/sendMessage";

    fn runner(server: &Server) -> BotRunner {
        let telegram = TelegramClient::new(&TelegramConfig {
            bot_token: Some("123:testtoken".to_string()),
            api_base_url: server.url(),
            request_timeout_secs: 5,
        })
        .unwrap();
        let backend = BackendClient::new(&BackendConfig {
            api_base_url: server.url(),
            request_timeout_secs: 5,
        })
        .unwrap();
        BotRunner::new(Arc::new(telegram), backend, Tz::UTC)
    }

    fn text_update(id: i64, text: &str) -> Update {
        serde_json::from_value(json!({
            "update_id": id,
            "message": {
                "message_id": id,
                "from": {"id": 42, "first_name": "Ann"},
                "chat": {"id": 4200},
                "text": text
            }
        }))
        .unwrap()
    }

    fn sent_ok() -> String {
        json!({"ok": true, "result": {"message_id": 1, "chat": {"id": 4200}}}).to_string()
    }

    fn registered() -> String {
        json!({
            "data": {
                "user_id": 1,
                "username": "tg_42",
                "profile": {"telegram_user_id": 42, "telegram_chat_id": 4200}
            },
            "meta": {},
            "errors": []
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_start_registers_then_greets() {
        let mut server = Server::new_async().await;
        let register = server
            .mock("POST", "/api/v1/telegram/register")
            .match_header("x-telegram-user-id", "42")
            .match_body(Matcher::PartialJson(json!({"telegram_chat_id": 4200})))
            .with_body(registered())
            .create_async()
            .await;
        let greet = server
            .mock("POST", SEND_PATH)
            .match_body(Matcher::PartialJson(json!({"chat_id": 4200, "text": GREETING})))
            .with_body(sent_ok())
            .create_async()
            .await;

        runner(&server).handle_update(text_update(1, "/start")).await;

        register.assert_async().await;
        greet.assert_async().await;
    }

    #[tokio::test]
    async fn test_registration_failure_aborts_command() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/telegram/register")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;
        let notice = server
            .mock("POST", SEND_PATH)
            .match_body(Matcher::PartialJson(json!({"text": REGISTER_FAILED})))
            .with_body(sent_ok())
            .expect(1)
            .create_async()
            .await;
        let tasks = server
            .mock("GET", "/api/v1/tasks")
            .expect(0)
            .create_async()
            .await;

        runner(&server).handle_update(text_update(1, "/tasks")).await;

        notice.assert_async().await;
        tasks.assert_async().await;
    }

    #[tokio::test]
    async fn test_dialog_title_then_category_screen() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/telegram/register")
            .with_body(registered())
            .create_async()
            .await;
        let title_prompt = server
            .mock("POST", SEND_PATH)
            .match_body(Matcher::Regex("Enter the task title".to_string()))
            .with_body(sent_ok())
            .create_async()
            .await;
        server
            .mock("GET", "/api/v1/categories")
            .with_body(
                json!({"data": [{"id": 3, "name": "Home"}], "meta": {}, "errors": []}).to_string(),
            )
            .create_async()
            .await;
        let category_screen = server
            .mock("POST", SEND_PATH)
            .match_body(Matcher::Regex(r#""callback_data":"cat:3""#.to_string()))
            .with_body(sent_ok())
            .create_async()
            .await;

        let runner = runner(&server);
        runner.handle_update(text_update(1, "/newtask")).await;
        assert_eq!(runner.dialogs.get(&4200).unwrap().step(), DialogStep::Title);

        runner.handle_update(text_update(2, "Buy milk")).await;
        {
            let dialog = runner.dialogs.get(&4200).unwrap();
            assert_eq!(dialog.step(), DialogStep::CategorySelect);
            assert_eq!(dialog.title(), Some("Buy milk"));
        }

        title_prompt.assert_async().await;
        category_screen.assert_async().await;
    }

    #[tokio::test]
    async fn test_cancel_drops_dialog() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v1/telegram/register")
            .with_body(registered())
            .create_async()
            .await;
        server
            .mock("POST", SEND_PATH)
            .with_body(sent_ok())
            .create_async()
            .await;

        let runner = runner(&server);
        runner.handle_update(text_update(1, "/newtask")).await;
        assert!(runner.dialogs.contains_key(&4200));
        runner.handle_update(text_update(2, "/cancel")).await;
        assert!(!runner.dialogs.contains_key(&4200));
    }
}
