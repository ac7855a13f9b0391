//! Query command: raw ranked retrieval against a collection.
//!
//! Operator-facing view of what the augmenter would retrieve. Unlike
//! `tutor ask`, store failures here propagate; this is a diagnostic
//! tool, not a chat turn.

use anyhow::Result;

use crate::config::Config;
use crate::sqlite_store::open_collection;

use tutor_core::models::PassageFilter;
use tutor_core::store::VectorStore;

pub async fn run_query(
    config: &Config,
    text: &str,
    chapter: Option<String>,
    top_k: Option<usize>,
    collection: Option<String>,
    json: bool,
) -> Result<()> {
    let coll = open_collection(config, collection.as_deref()).await?;

    let filter = chapter.map(PassageFilter::chapter);
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let matches = coll.query(text, top_k, filter.as_ref()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, m) in matches.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} / {} / {}",
            i + 1,
            m.distance,
            m.metadata.chapter,
            m.metadata.section,
            m.metadata.subsection
        );
        println!("    excerpt: \"{}\"", excerpt(&m.text));
        println!("    id: {}", m.id);
        println!();
    }

    Ok(())
}

/// Flatten a passage body into a one-line excerpt.
fn excerpt(text: &str) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    flat.chars().take(240).collect()
}
