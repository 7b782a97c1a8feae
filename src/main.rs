//! # lede CLI
//!
//! The `lede` binary tracks how an article's opening sentence evolved.
//!
//! ## Usage
//!
//! ```bash
//! lede --config ./config/lede.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `lede analyze <title>` | Fetch new revisions, reconstruct the timeline, save the record |
//! | `lede export <record>` | Write a chronological CSV from a saved record |
//! | `lede summary <record>` | Print distribution statistics for a saved record |
//!
//! ## Examples
//!
//! ```bash
//! # First run fetches every revision; later runs only the new ones
//! lede analyze "27 Club"
//!
//! # Rebuild from scratch, fetching at most 200 revisions this run
//! lede analyze "27 Club" --full --limit 200
//!
//! # Chronological CSV next to the record
//! lede export 27_Club_first_sentence_analysis.json
//! ```
//!
//! Exit status is 0 on success, 3 when the article does not exist, and 1
//! for any other failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use lede::analyze::{self, AnalysisOptions};
use lede::config;
use lede::error::RevisionError;
use lede::export;
use lede::logging;
use lede::progress::ProgressMode;
use lede::report;

const EXIT_FAILURE: u8 = 1;
const EXIT_NOT_FOUND: u8 = 3;

/// lede: first-sentence revision timelines for wiki articles.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Without one, built-in defaults target English Wikipedia.
#[derive(Parser)]
#[command(
    name = "lede",
    about = "Track how an article's first sentence changed over its revision history",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/lede.toml`; when that file does not exist the
    /// built-in defaults are used.
    #[arg(long, global = true, default_value = "./config/lede.toml")]
    config: PathBuf,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level or filter directive (overrides --verbose).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an article's first-sentence history.
    ///
    /// Lists all revisions, fetches the lead of every revision not already
    /// in the saved record, and writes the updated record with the ranked
    /// sentences.
    Analyze {
        /// Article title, e.g. "27 Club".
        title: String,

        /// Ignore the saved record and fetch every revision.
        #[arg(long)]
        full: bool,

        /// Re-fetch revisions whose sentence could not be extracted before.
        #[arg(long)]
        retry_failed: bool,

        /// Fetch at most this many revisions in this run.
        #[arg(long)]
        limit: Option<usize>,

        /// Record path (defaults to `<output.dir>/<Title>_first_sentence_analysis.json`).
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// List and compare against the record without fetching or saving.
        #[arg(long)]
        dry_run: bool,
    },

    /// Export a saved record as a chronological CSV.
    Export {
        /// Path to a saved analysis record.
        record: PathBuf,

        /// CSV path (defaults to `<record>_chronological.csv`).
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print summary statistics for a saved record.
    Summary {
        /// Path to a saved analysis record.
        record: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: {:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Analyze {
            title,
            full,
            retry_failed,
            limit,
            output,
            dry_run,
        } => {
            let cfg = if cli.config.exists() {
                config::load_config(&cli.config)?
            } else {
                config::Config::minimal()
            };
            let options = AnalysisOptions {
                full,
                retry_failed: retry_failed || cfg.fetch.retry_failed,
                limit,
                dry_run,
                as_of: None,
            };
            let reporter = cli
                .progress
                .unwrap_or_else(ProgressMode::default_for_tty)
                .reporter();
            analyze::run_analyze(&cfg, &title, output, options, reporter.as_ref()).await?;
        }
        Commands::Export { record, output } => {
            export::run_export(&record, output.as_deref())?;
        }
        Commands::Summary { record } => {
            let rec = export::read_record(&record)?;
            report::print_summary(&export::chronological_rows(&rec));
        }
    }

    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RevisionError>() {
        Some(RevisionError::NotFound(_)) => EXIT_NOT_FOUND,
        _ => EXIT_FAILURE,
    }
}
