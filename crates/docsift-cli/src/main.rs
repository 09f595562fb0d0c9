//! docsift - index a directory of text files and search it.
//!
//! This binary wires the core library to the terminal: it opens the store once,
//! hands it to the commands, and closes it on the way out.

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docsift_core::config::StoreConfig;
use docsift_core::DocSift;
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "docsift")]
#[command(about = "Full-text search over a directory of documents")]
struct Args {
    /// Database file (defaults to the user data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a directory and add its files to the index
    Index {
        /// Directory to scan (defaults to the last indexed directory)
        dir: Option<PathBuf>,

        /// Extensions to index, e.g. `--ext txt --ext md` (defaults to the saved list)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Index every file regardless of extension
        #[arg(long, conflicts_with = "extensions")]
        all: bool,

        /// Label stored as each document's directory
        #[arg(long)]
        label: Option<String>,
    },

    /// Search by file name prefix and/or content
    Search {
        /// File name prefix
        #[arg(short, long, default_value = "")]
        name: String,

        /// Content term
        #[arg(short, long, default_value = "")]
        content: String,

        /// A complete FTS5 MATCH expression, used instead of --name/--content
        #[arg(long, conflicts_with_all = ["name", "content"])]
        raw: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show document counts, index health and recorded scans
    Status,

    /// Rebuild the full-text index from stored documents
    Rebuild,

    /// List files skipped by previous scans
    Errors {
        /// Forget the recorded errors after listing them
        #[arg(long)]
        clear: bool,
    },
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docsift")
        .join(StoreConfig::DB_FILE_NAME)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for results
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let db_path = args.db.unwrap_or_else(default_db_path);
    debug!("Using database {}", db_path.display());

    let api = DocSift::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let result = match args.command {
        Command::Index {
            dir,
            extensions,
            all,
            label,
        } => commands::index(&api, dir, extensions, all, label).await,
        Command::Search {
            name,
            content,
            raw,
            json,
        } => commands::search(&api, &name, &content, raw.as_deref(), json).await,
        Command::Status => commands::status(&api).await,
        Command::Rebuild => commands::rebuild(&api).await,
        Command::Errors { clear } => commands::errors(&api, clear).await,
    };

    api.close().context("Failed to close database")?;
    result
}
