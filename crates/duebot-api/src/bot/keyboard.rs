//! Conversions from dialog screens to Telegram keyboards.

use duebot_core::dialog::Screen;
use duebot_infra::telegram::types::{InlineKeyboardButton, KeyboardButton, ReplyMarkup};

pub const MENU_NEW_TASK: &str = "📝 New task";
pub const MENU_MY_TASKS: &str = "📋 My tasks";
pub const MENU_CANCEL: &str = "❌ Cancel";

/// Persistent reply keyboard shown outside dialogs.
pub fn main_menu() -> ReplyMarkup {
    let button = |text: &str| KeyboardButton {
        text: text.to_string(),
    };
    ReplyMarkup::Keyboard {
        keyboard: vec![
            vec![button(MENU_NEW_TASK), button(MENU_MY_TASKS)],
            vec![button(MENU_CANCEL)],
        ],
        resize_keyboard: true,
    }
}

/// Inline keyboard for a dialog screen.
pub fn inline_markup(screen: &Screen) -> ReplyMarkup {
    ReplyMarkup::Inline {
        inline_keyboard: screen
            .buttons
            .iter()
            .filter(|row| !row.is_empty())
            .map(|row| {
                row.iter()
                    .map(|b| InlineKeyboardButton {
                        text: b.label.clone(),
                        callback_data: b.action.to_callback_data(),
                    })
                    .collect()
            })
            .collect(),
    }
}
