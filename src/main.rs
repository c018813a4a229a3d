//! # Context Notes CLI (`cnotes`)
//!
//! Manage context-keyed notes and exercise the context resolver against
//! saved page snapshots.
//!
//! ## Usage
//!
//! ```bash
//! cnotes --config ./config/cnotes.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cnotes init` | Create the SQLite database and schema |
//! | `cnotes add` | Add a note to a context key or a resolved page |
//! | `cnotes list <key>` | Show a context's notes with their indices |
//! | `cnotes delete <key> <index>` | Delete one note |
//! | `cnotes related <key>` | Notes from contexts with overlapping titles |
//! | `cnotes all` | Every note, filtered by app and sorted by time |
//! | `cnotes resolve <page.json>` | Resolve a page snapshot to a context |
//! | `cnotes content <page.json>` | Print a page snapshot's capped content |
//! | `cnotes replay <script.json>` | Replay a scripted browsing session |
//! | `cnotes export` | Dump all buckets as JSON |
//! | `cnotes stats` | Store summary |

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use context_notes::notes_cmd::NoteTarget;
use context_notes::{config, export, logging, migrate, notes_cmd, replay, resolve, stats};

/// Context Notes CLI: notes keyed by what you are looking at.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cnotes.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cnotes",
    about = "Context Notes: context-aware notes for web applications",
    version,
    long_about = "Context Notes resolves the mail thread, meeting, document, calendar event, \
    or video you are looking at into a stable context key and keeps notes per key. \
    Notes from contexts with overlapping titles are surfaced as related."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/cnotes.toml`.
    #[arg(long, global = true, default_value = "./config/cnotes.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Add a note.
    ///
    /// The context is either an explicit `<app>:<title>` key or the context
    /// resolved from a saved page snapshot.
    #[command(group(ArgGroup::new("target").required(true).args(["key", "page"])))]
    Add {
        /// Context key, e.g. `docs:Q3 Plan` or `mail:bob@example.com`.
        #[arg(long)]
        key: Option<String>,

        /// Page snapshot (JSON) to resolve the context from.
        #[arg(long)]
        page: Option<PathBuf>,

        /// Note text.
        text: String,
    },

    /// List a context's notes.
    List {
        key: String,
    },

    /// Delete the note at `index` from a context.
    Delete {
        key: String,
        index: usize,
    },

    /// Show notes from related contexts.
    Related {
        key: String,
    },

    /// Show every note across contexts.
    All {
        /// App tag to filter by (`mail`, `videoconf`, `docs`, `calendar`, `video`) or `all`.
        #[arg(long, default_value = "all")]
        app: String,

        /// `newest` or `oldest` first.
        #[arg(long, default_value = "newest")]
        sort: String,
    },

    /// Resolve a page snapshot and print the context as JSON.
    Resolve {
        page: PathBuf,
    },

    /// Print a page snapshot's content, capped to `page_content.max_chars`.
    Content {
        page: PathBuf,
    },

    /// Replay a scripted session and print bridge messages as JSON lines.
    Replay {
        script: PathBuf,
    },

    /// Export all note buckets as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show store statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    let load = || config::load_config(&cli.config);
    // Commands that don't touch the store run without a config file.
    let load_or_minimal = || load().unwrap_or_else(|_| config::Config::minimal());

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&load()?).await?;
            println!("Database initialized successfully.");
        }
        Commands::Add { key, page, text } => {
            let target = match (&key, &page) {
                (Some(key), _) => NoteTarget::Key(key),
                (None, Some(page)) => NoteTarget::Page(page),
                (None, None) => anyhow::bail!("one of --key or --page is required"),
            };
            notes_cmd::run_add(&load()?, target, &text).await?;
        }
        Commands::List { key } => notes_cmd::run_list(&load()?, &key).await?,
        Commands::Delete { key, index } => notes_cmd::run_delete(&load()?, &key, index).await?,
        Commands::Related { key } => notes_cmd::run_related(&load()?, &key).await?,
        Commands::All { app, sort } => notes_cmd::run_all(&load()?, &app, &sort).await?,
        Commands::Resolve { page } => resolve::run_resolve(&load_or_minimal(), &page)?,
        Commands::Content { page } => resolve::run_content(&load_or_minimal(), &page)?,
        Commands::Replay { script } => replay::run_replay(&load_or_minimal(), &script).await?,
        Commands::Export { output } => export::run_export(&load()?, output.as_deref()).await?,
        Commands::Stats => stats::run_stats(&load()?).await?,
    }

    Ok(())
}
