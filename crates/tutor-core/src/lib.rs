//! # Tutor Core
//!
//! Shared logic for Textbook Tutor: passage data model, the
//! heading-marker textbook parser, the vector store abstraction, the
//! embedding trait, the ingestion driver, and retrieval augmentation.
//!
//! This crate contains no tokio runtime, SQLite, or network
//! dependencies; concrete store and embedding backends live in the
//! `tutor` app crate. Everything here works against the
//! [`store::VectorStore`] and [`embedding::Embedder`] traits so any
//! compliant backend (in-process or networked) can be substituted.
//!
//! ## Data Flow
//!
//! 1. [`parser::parse_document`] segments a formatted textbook into
//!    labeled [`models::Passage`]s with sequential ids.
//! 2. [`ingest::ingest_document`] adds the parsed passages to a
//!    [`store::VectorStore`] collection in one batch.
//! 3. [`retrieval::augment_message`] queries the collection with a live
//!    user message and appends the retrieved context block, degrading
//!    to a pass-through when retrieval fails.

pub mod embedding;
pub mod ingest;
pub mod models;
pub mod parser;
pub mod retrieval;
pub mod store;

pub use models::{Passage, PassageFilter, PassageMetadata, ScoredPassage};

#[cfg(test)]
pub(crate) mod testing {
    //! Test support: a deterministic embedder with no model behind it.

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::embedding::Embedder;

    const DIMS: usize = 16;

    /// Maps each whitespace token into a hashed bucket, so identical
    /// texts embed identically and overlapping texts land close.
    #[derive(Default)]
    pub struct HashEmbedder;

    #[async_trait]
    impl Embedder for HashEmbedder {
        fn model_name(&self) -> &str {
            "hash-test"
        }

        fn dims(&self) -> usize {
            DIMS
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; DIMS];
                    for token in text.split_whitespace() {
                        let mut hasher = DefaultHasher::new();
                        token.hash(&mut hasher);
                        v[(hasher.finish() % DIMS as u64) as usize] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }
}
