//! Message texts sent by the bot.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use duebot_types::task::Task;

pub const GREETING: &str =
    "Hello! I'll help manage tasks.\n- /newtask: create a task\n- /tasks: show the task list";

pub const REGISTER_FAILED: &str =
    "Could not register you on the server. Please try again later.";

pub const NO_TASKS: &str = "You have no tasks.";

const TITLE_WIDTH: usize = 50;
const PLACEHOLDER: &str = "...";

/// Collapse whitespace and cut at a word boundary so the result, including
/// the trailing placeholder, fits in `width` characters.
pub fn shorten(text: &str, width: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let collapsed = words.join(" ");
    if collapsed.chars().count() <= width {
        return collapsed;
    }

    let budget = width.saturating_sub(PLACEHOLDER.chars().count());
    let mut out = String::new();
    for word in words {
        let extra = if out.is_empty() { 0 } else { 1 } + word.chars().count();
        if out.chars().count() + extra > budget {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        // A single word longer than the budget is hard-cut.
        out = collapsed.chars().take(budget).collect();
    }
    out.push_str(PLACEHOLDER);
    out
}

pub fn format_due(due: &DateTime<Utc>, tz: &Tz) -> String {
    due.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

/// One block per task, newest first as returned by the API.
pub fn format_task_list(tasks: &[Task], tz: &Tz) -> String {
    if tasks.is_empty() {
        return NO_TASKS.to_string();
    }

    tasks
        .iter()
        .map(|task| {
            let mark = if task.is_completed { "✅" } else { "⏳" };
            let categories = if task.categories.is_empty() {
                "no category".to_string()
            } else {
                task.categories
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            format!(
                "{mark} {}\nCategories: {categories}\nDue: {}\n---",
                shorten(&task.title, TITLE_WIDTH),
                format_due(&task.due_date, tz)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_created(due: &DateTime<Utc>, tz: &Tz) -> String {
    format!("Task created ✅\nDue: {} {}", format_due(due, tz), tz.name())
}
