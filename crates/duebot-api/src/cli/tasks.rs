//! `duebot tasks --user <id>`: operator view of one user's tasks.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use duebot_types::task::Task;

use crate::bot::format::format_due;
use crate::state::AppState;

pub async fn list_tasks(state: &AppState, telegram_user_id: i64, json: bool) -> Result<()> {
    let tasks = match state.account_service.find(telegram_user_id).await? {
        Some(user) => state.task_service.list(user.id).await?,
        None => Vec::new(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    }

    if tasks.is_empty() {
        println!();
        println!(
            "  {} No tasks for Telegram user {}.",
            style("i").blue().bold(),
            style(telegram_user_id).yellow()
        );
        println!();
        return Ok(());
    }

    println!("{}", render_table(&tasks, state));
    Ok(())
}

fn render_table(tasks: &[Task], state: &AppState) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Categories").fg(Color::White),
        Cell::new(format!("Due ({})", state.tz.name())).fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Reminded").fg(Color::White),
    ]);

    for task in tasks {
        let status = if task.is_completed {
            Cell::new("✓ done").fg(Color::Green)
        } else {
            Cell::new("○ open").fg(Color::Yellow)
        };
        let categories = task
            .categories
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(&task.id.as_str()[..8]).fg(Color::DarkGrey),
            Cell::new(&task.title),
            Cell::new(categories),
            Cell::new(format_due(&task.due_date, &state.tz)),
            status,
            Cell::new(if task.notification_sent { "yes" } else { "no" }),
        ]);
    }
    table
}
