//! duebot CLI, REST API and Telegram bot entry point.
//!
//! Binary name: `duebot`

mod bot;
mod cli;
mod http;
mod state;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clap_complete::generate;
use tokio_util::sync::CancellationToken;

use duebot_core::reminder::ReminderService;
use duebot_core::reminder::scheduler::{ReminderScheduler, sweep_callback};
use duebot_infra::backend::BackendClient;
use duebot_infra::sqlite::task::SqliteTaskRepository;
use duebot_infra::telegram::TelegramClient;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    duebot_infra::config::load_dotenv();
    duebot_observe::init_tracing(
        duebot_observe::verbosity_filter(cli.verbose, cli.quiet),
        cli.log_json,
        cli.otel,
    )
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    duebot_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need config or a database.
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "duebot", &mut std::io::stdout());
        return Ok(());
    }

    let (config, data_dir) = state::load().await;
    let tz = config.tz().map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            no_reminders,
        } => {
            let state = AppState::init(config, data_dir).await?;
            serve(state, host, port, no_reminders).await?;
        }

        Commands::Bot => {
            let telegram = TelegramClient::new(&config.telegram)?;
            if !telegram.is_configured() {
                anyhow::bail!("TELEGRAM_BOT_TOKEN is not set");
            }
            let backend = BackendClient::new(&config.backend)?;
            let runner = bot::BotRunner::new(Arc::new(telegram), backend, tz);

            let shutdown = CancellationToken::new();
            let trigger = shutdown.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                trigger.cancel();
            });

            if !cli.quiet {
                println!(
                    "  {} Bot polling {}",
                    console::style("🤖").bold(),
                    console::style(&config.backend.api_base_url).cyan()
                );
            }
            runner.run(shutdown).await.context("bot stopped")?;
        }

        Commands::Remind => {
            let state = AppState::init(config, data_dir).await?;
            cli::remind::run_sweep(&state, cli.json).await?;
        }

        Commands::Tasks { user } => {
            let state = AppState::init(config, data_dir).await?;
            cli::tasks::list_tasks(&state, user, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

async fn serve(
    state: AppState,
    host: Option<String>,
    port: Option<u16>,
    no_reminders: bool,
) -> anyhow::Result<()> {
    let scheduler = ReminderScheduler::new();
    if no_reminders || !state.config.reminder.enabled {
        tracing::info!("reminder scheduler disabled");
    } else {
        let telegram = TelegramClient::new(&state.config.telegram)?;
        if !telegram.is_configured() {
            tracing::warn!("TELEGRAM_BOT_TOKEN is not set; reminders will not be delivered");
        }
        let service = ReminderService::new(
            SqliteTaskRepository::new(state.db_pool.clone()),
            Arc::new(telegram),
            state.tz,
        );
        scheduler
            .start(
                &state.config.reminder.schedule,
                state.tz,
                sweep_callback(Arc::new(service)),
            )
            .await?;
    }

    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} duebot API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await?;
    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
