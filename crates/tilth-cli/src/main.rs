use clap::Parser;
use mockable::DefaultClock;
use owo_colors::{OwoColorize, Style};
use std::sync::Arc;
use tilth_core::db;
use tilth_core::error::CoreError;
use tilth_core::repository::SqliteStorage;
use tilth_core::series::SeriesManager;
use tilth_core::tasks::TaskService;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TILTH_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let config = config::Config::new()?;
    let plan_id = util::resolve_plan_id(cli.plan.as_deref(), &config)?;

    let db_pool = db::establish_connection(&config.database_path).await?;
    tracing::debug!(database = %config.database_path.display(), %plan_id, "database ready");

    let storage = Arc::new(SqliteStorage::new(db_pool));
    let clock = Arc::new(DefaultClock);
    let series = SeriesManager::new(
        Arc::clone(&storage),
        Arc::clone(&clock),
        config.recurrence.clone(),
    );
    let tasks = TaskService::new(storage, clock, config.recurrence.clone());

    match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&tasks, plan_id, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&tasks, plan_id, command).await,
        cli::Commands::Do(command) => commands::r#do::do_task(&tasks, command).await,
        cli::Commands::DoneOn(command) => commands::r#do::done_on(&tasks, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&tasks, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_task(&tasks, command).await,
        cli::Commands::Series(command) => {
            commands::series::series_command(&series, plan_id, command).await
        }
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::RuleParse(e)) => {
            eprintln!(
                "{} Invalid recurrence rule '{}': {}",
                "Error:".style(error_style),
                e.rule.yellow(),
                e.reason
            );
        }
        Some(CoreError::InconsistentState(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s.yellow());
        }
        Some(core_error) => {
            eprintln!("{} {}", "Error:".style(error_style), core_error);
            if let Some(source) = std::error::Error::source(core_error) {
                eprintln!("  caused by: {}", source);
            }
        }
        None => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
