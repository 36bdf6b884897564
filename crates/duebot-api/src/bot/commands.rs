//! Slash commands and main-menu buttons understood by the bot.

use super::keyboard::{MENU_CANCEL, MENU_MY_TASKS, MENU_NEW_TASK};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    NewTask,
    Tasks,
    Cancel,
    /// A slash command the bot does not know.
    Unknown(String),
}

/// Parse a message as a command or menu button.
///
/// Returns `None` for plain text. Accepts the `/cmd@botname` form used in
/// group chats.
pub fn parse(input: &str) -> Option<BotCommand> {
    let trimmed = input.trim();
    match trimmed {
        MENU_NEW_TASK => return Some(BotCommand::NewTask),
        MENU_MY_TASKS => return Some(BotCommand::Tasks),
        MENU_CANCEL => return Some(BotCommand::Cancel),
        _ => {}
    }
    if !trimmed.starts_with('/') {
        return None;
    }

    let word = trimmed.split_whitespace().next().unwrap_or(trimmed);
    let cmd = word.split('@').next().unwrap_or(word).to_lowercase();

    match cmd.as_str() {
        "/start" | "/help" => Some(BotCommand::Start),
        "/newtask" => Some(BotCommand::NewTask),
        "/tasks" => Some(BotCommand::Tasks),
        "/cancel" => Some(BotCommand::Cancel),
        other => Some(BotCommand::Unknown(other.to_string())),
    }
}
