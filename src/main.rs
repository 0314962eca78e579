use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use diusd::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh the stored series from BCB and FRED
    Sync {
        /// Trailing window to keep, in years
        #[arg(default_value_t = 20)]
        years: u32,
    },
    /// Print quote and return tables for a period
    Report {
        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Also summarize the rolling N-year excess series
        #[arg(long)]
        window_years: Option<usize>,
    },
}

impl From<Commands> for diusd::AppCommand {
    fn from(cmd: Commands) -> diusd::AppCommand {
        match cmd {
            Commands::Sync { years } => diusd::AppCommand::Sync { years },
            Commands::Report {
                start,
                end,
                window_years,
            } => diusd::AppCommand::Report {
                start,
                end,
                window_years,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = diusd::run_command(cli.command.into()).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
