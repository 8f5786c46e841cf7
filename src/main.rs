use clap::Parser;
use daybook::args::{Args, Command, ExpenseCommand, TaskCommand};
use daybook::{commands, Config, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().daybook_home().path();

    let config = match args.command() {
        Command::Init => {
            commands::init(home).await?.print();
            return Ok(());
        }
        _ => Config::load(home).await?,
    };
    let result = run(&config, args.command()).await;
    config.close().await;
    result
}

async fn run(config: &Config, command: &Command) -> Result<()> {
    let _: () = match command {
        Command::Init => {}

        Command::Expense(expense) => match expense {
            ExpenseCommand::Add(a) => commands::expense_add(config, a).await?.print(),
            ExpenseCommand::List => commands::expense_list(config).await?.print(),
            ExpenseCommand::Delete(a) => commands::expense_delete(config, a).await?.print(),
            ExpenseCommand::Summary => commands::expense_summary(config).await?.print(),
        },

        Command::Task(task) => match task {
            TaskCommand::Add(a) => commands::task_add(config, a).await?.print(),
            TaskCommand::Update(a) => commands::task_update(config, a).await?.print(),
            TaskCommand::Delete(a) => commands::task_delete(config, a).await?.print(),
            TaskCommand::Complete(a) => commands::task_complete(config, a).await?.print(),
            TaskCommand::Show(a) => commands::task_show(config, a).await?.print(),
            TaskCommand::List(a) => commands::task_list(config, a).await?.print(),
            TaskCommand::Stats => commands::task_stats(config).await?.print(),
            TaskCommand::Export(a) => commands::task_export(config, a).await?.print(),
            TaskCommand::Import(a) => commands::task_import(config, a).await?.print(),
            TaskCommand::Remind(a) => commands::task_remind(config, a).await?.print(),
        },
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for this crate only.
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
