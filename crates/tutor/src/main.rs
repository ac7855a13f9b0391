//! # Textbook Tutor CLI (`tutor`)
//!
//! The `tutor` binary is the operator interface for the textbook
//! retrieval pipeline: ingest a formatted textbook, inspect raw
//! retrieval results, and produce retrieval-augmented prompts.
//!
//! ## Usage
//!
//! ```bash
//! tutor --config ./config/tutor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tutor ingest <FILE>` | Parse a formatted textbook and store its subsections |
//! | `tutor query "<text>"` | Rank stored passages against a query |
//! | `tutor ask "<message>"` | Print the retrieval-augmented prompt for a user message |
//!
//! ## Examples
//!
//! ```bash
//! # Ingest chapter 1 into the default collection
//! tutor ingest chapter_1_textbook_formatted.txt
//!
//! # Raw retrieval, restricted to one chapter
//! tutor query "how do derivatives work?" --chapter "Chapter 1: Derivatives" --top-k 3
//!
//! # The augmented prompt a completion provider would receive
//! tutor ask "what is the chain rule?"
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tutor::{ask, config, ingest, query};

/// Textbook Tutor — a retrieval-augmented textbook pipeline for
/// educational chat agents.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file; a missing file falls back to defaults
/// (in-memory store, disabled embeddings).
#[derive(Parser)]
#[command(
    name = "tutor",
    about = "Textbook Tutor — a retrieval-augmented textbook pipeline for educational chat agents",
    version,
    long_about = "Textbook Tutor parses a hierarchically headed textbook into labeled passages, \
    stores them with embeddings in a named collection, and augments live user messages with the \
    most relevant passages before they reach a language-model completion provider."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/tutor.toml`. Store, collection, embedding,
    /// and retrieval settings are read from this file.
    #[arg(long, global = true, default_value = "./config/tutor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Parse a formatted textbook and ingest its subsections.
    ///
    /// The file uses Markdown-style heading markers (`#` chapter,
    /// `##` section, `###` subsection) with `---` dividers between
    /// major blocks. Each non-empty subsection becomes one stored
    /// passage; the batch commits as a whole or not at all.
    Ingest {
        /// Path to the formatted textbook file (UTF-8 text).
        file: PathBuf,

        /// Collection to ingest into (overrides the configured name).
        #[arg(long)]
        collection: Option<String>,
    },

    /// Rank stored passages against a query and print the matches.
    ///
    /// Diagnostic view of retrieval: distances, labels, and excerpts
    /// in ranked order. Store failures propagate.
    Query {
        /// The query text.
        text: String,

        /// Only rank passages from this chapter (exact metadata match).
        #[arg(long)]
        chapter: Option<String>,

        /// Number of matches to return (overrides the configured top_k).
        #[arg(long)]
        top_k: Option<usize>,

        /// Collection to query (overrides the configured name).
        #[arg(long)]
        collection: Option<String>,

        /// Print matches as JSON instead of the text listing.
        #[arg(long)]
        json: bool,
    },

    /// Print the retrieval-augmented prompt for a user message.
    ///
    /// Emits exactly what a completion provider would receive: the
    /// message plus a context block of retrieved passages. When
    /// retrieval fails or finds nothing, the message is printed
    /// unchanged; this path never fails a chat turn.
    Ask {
        /// The user message to augment.
        message: String,

        /// Only retrieve passages from this chapter (exact metadata match).
        #[arg(long)]
        chapter: Option<String>,

        /// Number of passages to retrieve (overrides the configured top_k).
        #[arg(long)]
        top_k: Option<usize>,

        /// Collection to query (overrides the configured name).
        #[arg(long)]
        collection: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { file, collection } => {
            ingest::run_ingest(&cfg, &file, collection).await?;
        }
        Commands::Query {
            text,
            chapter,
            top_k,
            collection,
            json,
        } => {
            query::run_query(&cfg, &text, chapter, top_k, collection, json).await?;
        }
        Commands::Ask {
            message,
            chapter,
            top_k,
            collection,
        } => {
            ask::run_ask(&cfg, &message, chapter, top_k, collection).await?;
        }
    }

    Ok(())
}
