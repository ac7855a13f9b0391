//! Ingestion command: parse a formatted textbook file and store its
//! subsections as embedded passages.
//!
//! The parse listing is printed before anything touches the store, so
//! the operator sees what was found even when ingestion then fails. A
//! store or embedding failure aborts the run; the batch is
//! all-or-nothing.

use std::path::Path;

use anyhow::{Context, Result};

use tutor_core::ingest::ingest_passages;
use tutor_core::parser::parse_document;

use crate::config::Config;
use crate::sqlite_store::open_collection;

pub async fn run_ingest(config: &Config, file: &Path, collection: Option<String>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read textbook file: {}", file.display()))?;

    let name = collection.unwrap_or_else(|| config.collection.name.clone());

    println!("Parsing textbook from {}...", file.display());
    let passages = parse_document(&text);
    println!("Found {} subsections", passages.len());

    if !passages.is_empty() {
        println!();
        println!("Subsections found:");
        for p in &passages {
            println!("  Paragraph {}: {}", p.id, p.metadata.subsection);
        }
    }

    let coll = open_collection(config, Some(name.as_str())).await?;
    ingest_passages(&coll, &passages).await?;

    println!();
    println!("ingest {}", name);
    println!("  passages ingested: {}", passages.len());
    println!(
        "  embedding model: {}",
        config.embedding.model.as_deref().unwrap_or("disabled")
    );
    match config.store.resolve_persist_dir() {
        Some(dir) => println!("  persisted to: {}", dir.display()),
        None => println!("  storage: in-memory (not persisted)"),
    }
    println!("ok");

    Ok(())
}
