//! Retrieval augmentation for a conversational turn.
//!
//! Queries the passage store with the live user message, renders the
//! ranked matches into a deterministic context block, and appends that
//! block to the message before it is handed to the completion provider.
//!
//! Augmentation must never fail the chat turn: the model should still
//! receive the user's message even when retrieval is unavailable. The
//! error boundary is therefore exactly the store query call: a failure
//! there is reported on stderr and the message passes through
//! unchanged. Bugs anywhere else in this module are not masked.

use crate::models::{PassageFilter, ScoredPassage};
use crate::store::VectorStore;

/// Header line opening the rendered context block.
const CONTEXT_HEADER: &str = "Relevant textbook content:";

/// Visual separator between passages in the context block.
const SEPARATOR_WIDTH: usize = 50;

/// Augment `user_message` with textbook context retrieved from `store`.
///
/// When `chapter` is set, only passages from that chapter are eligible.
/// Returns the augmented message, or the original message unchanged
/// when the query fails, or when it returns no matches.
pub async fn augment_message<S: VectorStore + ?Sized>(
    store: &S,
    user_message: &str,
    chapter: Option<&str>,
    top_k: usize,
) -> String {
    let filter = chapter.map(PassageFilter::chapter);

    let matches = match store.query(user_message, top_k, filter.as_ref()).await {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("Warning: failed to query textbook collection: {}", e);
            return user_message.to_string();
        }
    };

    if matches.is_empty() {
        return user_message.to_string();
    }

    format!(
        "{}\n\nContext from textbook:\n{}",
        user_message,
        format_context(&matches)
    )
}

/// Render ranked matches into the context block.
///
/// Layout: the header, a separator line, then for each match a
/// `[section - subsection]` label line, the passage text, and another
/// separator; all joined by single newlines.
pub fn format_context(matches: &[ScoredPassage]) -> String {
    let separator = "-".repeat(SEPARATOR_WIDTH);

    let mut parts = Vec::with_capacity(2 + matches.len() * 3);
    parts.push(CONTEXT_HEADER.to_string());
    parts.push(separator.clone());
    for m in matches {
        parts.push(format!("[{} - {}]", m.metadata.section, m.metadata.subsection));
        parts.push(m.text.clone());
        parts.push(separator.clone());
    }
    parts.join("\n")
}
