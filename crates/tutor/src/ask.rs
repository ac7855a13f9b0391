//! Ask command: augment a user message with textbook context.
//!
//! Prints the augmented prompt, i.e. the exact string a completion
//! provider would receive. A broken store must not break the chat
//! turn: any store failure on this path degrades to printing the
//! original message.

use anyhow::Result;

use tutor_core::retrieval::augment_message;

use crate::config::Config;
use crate::sqlite_store::open_collection;

pub async fn run_ask(
    config: &Config,
    message: &str,
    chapter: Option<String>,
    top_k: Option<usize>,
    collection: Option<String>,
) -> Result<()> {
    let top_k = top_k.unwrap_or(config.retrieval.top_k);

    let augmented = match open_collection(config, collection.as_deref()).await {
        Ok(coll) => augment_message(&coll, message, chapter.as_deref(), top_k).await,
        Err(e) => {
            eprintln!("Warning: failed to open textbook collection: {}", e);
            message.to_string()
        }
    };

    println!("{}", augmented);
    Ok(())
}
