//! `duebot remind`: one reminder sweep.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use console::style;

use duebot_core::reminder::{ReminderReport, ReminderService};
use duebot_infra::sqlite::task::SqliteTaskRepository;
use duebot_infra::telegram::TelegramClient;

use crate::state::AppState;

pub async fn run_sweep(state: &AppState, json: bool) -> Result<()> {
    let telegram = TelegramClient::new(&state.config.telegram)?;
    if !telegram.is_configured() {
        tracing::warn!("TELEGRAM_BOT_TOKEN is not set; due reminders will count as failed");
    }

    let service = ReminderService::new(
        SqliteTaskRepository::new(state.db_pool.clone()),
        Arc::new(telegram),
        state.tz,
    );
    let report = service.run_once(Utc::now()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &ReminderReport) {
    println!();
    if report.due == 0 {
        println!("  {} No reminders due.", style("i").blue().bold());
        println!();
        return;
    }
    println!(
        "  {} {} due, {} sent, {} skipped (no chat), {} failed",
        style("⏰").bold(),
        report.due,
        style(report.sent).green(),
        style(report.skipped).yellow(),
        style(report.failed).red()
    );
    println!();
}
