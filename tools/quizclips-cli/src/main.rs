//! quizclips CLI: build quiz audio excerpts and the catalog document.
//!
//! Usage:
//!   quizclips [run] [--yes]    Process the piece table (default)
//!   quizclips check            Check that yt-dlp and ffmpeg are available
//!
//! Exit codes: 0 when at least one excerpt is available (or there was nothing
//! to do), 1 on a hard failure, 2 when every record failed.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use quizclips_common::config::{AppConfig, LoggingConfig};
use quizclips_common::error::QuizError;

mod commands;

#[derive(Parser)]
#[command(
    name = "quizclips",
    about = "Turn the music piece spreadsheet into quiz excerpts and a catalog",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (JSON); defaults to the user config location
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download, trim, and publish every piece in the table
    Run {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Source table, overriding the configured path
        #[arg(long)]
        table: Option<PathBuf>,
    },

    /// Check external tool availability
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path),
        None => Ok(AppConfig::load_default()),
    };

    // Initialize logging
    let logging = match &config {
        Ok(config) if !cli.verbose => config.logging.clone(),
        Ok(config) => LoggingConfig {
            level: "debug".to_string(),
            ..config.logging.clone()
        },
        Err(_) => LoggingConfig::default(),
    };
    quizclips_common::logging::init_logging(&logging);

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(1);
        }
    };

    let result = match cli.command.unwrap_or(Commands::Run {
        yes: false,
        table: None,
    }) {
        Commands::Run { yes, table } => {
            if let Some(table) = table {
                config.paths.source_table = table;
            }
            commands::run::run(config, yes).await
        }
        Commands::Check => commands::check::run(config).await,
    };

    match result {
        Ok(status) => status.exit_code(),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Run aborted");
            eprintln!("Error: {e:#}");
            if e
                .downcast_ref::<QuizError>()
                .is_some_and(QuizError::is_fatal_before_processing)
            {
                eprintln!("No records were processed.");
            }
            ExitCode::from(1)
        }
    }
}
