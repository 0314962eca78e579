pub mod cli;
pub mod config;
pub mod error;
pub mod log;
pub mod providers;
pub mod returns;
pub mod series;
pub mod store;
pub mod sync;

use anyhow::Result;
use chrono::NaiveDate;

pub enum AppCommand {
    Sync {
        years: u32,
    },
    Report {
        start: NaiveDate,
        end: NaiveDate,
        window_years: Option<usize>,
    },
}

/// Reads configuration from the environment and dispatches. Configuration
/// errors surface before any file or network I/O.
pub async fn run_command(command: AppCommand) -> Result<()> {
    let config = config::AppConfig::from_env()?;

    match command {
        AppCommand::Sync { years } => cli::sync::run(&config, years).await,
        AppCommand::Report {
            start,
            end,
            window_years,
        } => cli::report::run(&config, start, end, window_years),
    }
}
