//! Ingestion pipeline: textbook text → parsed passages → stored batch.
//!
//! Parsing and storage are a single batched `add`; a store or embedding
//! failure aborts the run with no partial state beyond what the backend
//! itself guarantees (the SQLite store commits the batch in one
//! transaction).

use anyhow::{Context, Result};

use crate::models::{Passage, PassageMetadata};
use crate::parser::parse_document;
use crate::store::VectorStore;

/// Parse `document_text` and add every passage to `store` in one batch.
///
/// Returns the number of passages ingested. Errors from the store
/// (duplicate ids, embedding failure, connectivity) are fatal to the
/// run and propagate to the caller.
pub async fn ingest_document<S: VectorStore + ?Sized>(
    store: &S,
    document_text: &str,
) -> Result<usize> {
    let passages = parse_document(document_text);
    ingest_passages(store, &passages).await?;
    Ok(passages.len())
}

/// Add already-parsed passages to `store` in one batch.
///
/// Split out of [`ingest_document`] so callers that want to inspect or
/// print the parse result first (the CLI does) don't parse twice.
pub async fn ingest_passages<S: VectorStore + ?Sized>(
    store: &S,
    passages: &[Passage],
) -> Result<()> {
    if passages.is_empty() {
        return Ok(());
    }

    let ids: Vec<String> = passages.iter().map(|p| p.id.clone()).collect();
    let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
    let metadatas: Vec<PassageMetadata> = passages.iter().map(|p| p.metadata.clone()).collect();

    store
        .add(&ids, &texts, Some(&metadatas))
        .await
        .context("failed to add passages to the collection")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::testing::HashEmbedder;

    #[tokio::test]
    async fn test_ingest_returns_passage_count() {
        let store = MemoryStore::new();
        let coll = store.collection("textbook", Arc::new(HashEmbedder::default()));

        let doc = "# C1\n## S1\n### A\nbody a\n### B\nbody b";
        let count = ingest_document(coll.as_ref(), doc).await.unwrap();
        assert_eq!(count, 2);

        let matches = coll.query("body a", 5, None).await.unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[tokio::test]
    async fn test_ingested_metadata_survives_round_trip() {
        let store = MemoryStore::new();
        let coll = store.collection("textbook", Arc::new(HashEmbedder::default()));

        ingest_document(coll.as_ref(), "# C1\n## S1\n### Sub\nsome body")
            .await
            .unwrap();

        let matches = coll.query("some body", 1, None).await.unwrap();
        assert_eq!(matches[0].id, "1");
        assert_eq!(matches[0].metadata.chapter, "C1");
        assert_eq!(matches[0].metadata.section, "S1");
        assert_eq!(matches[0].metadata.subsection, "Sub");
    }

    #[tokio::test]
    async fn test_reingest_into_same_collection_fails_on_duplicate_ids() {
        let store = MemoryStore::new();
        let coll = store.collection("textbook", Arc::new(HashEmbedder::default()));
        let doc = "### Sub\nbody";

        ingest_document(coll.as_ref(), doc).await.unwrap();
        assert!(ingest_document(coll.as_ref(), doc).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_document_ingests_nothing() {
        let store = MemoryStore::new();
        let coll = store.collection("textbook", Arc::new(HashEmbedder::default()));
        let count = ingest_document(coll.as_ref(), "no headings here").await.unwrap();
        assert_eq!(count, 0);
    }
}
