//! Collaborator seams: the embedding provider and the vector index.
//!
//! Both are injected as `Arc<dyn _>` so the dispatcher can run against Postgres + an
//! embedding API in production and against deterministic fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::document::{DocumentMetadata, DocumentType};

/// One nearest-neighbour hit returned by the vector index.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: String,
    pub text: String,
    /// Cosine distance: 0 is identical, 2 is opposite.
    pub distance: f64,
    pub metadata: DocumentMetadata,
}

/// A vector plus the document it was computed from.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// A document as stored in the index, without its vector.
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    pub indexed_at: DateTime<Utc>,
}

/// Metadata filter applied by the index. Only `{type: ...}` is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataFilter {
    pub doc_type: DocumentType,
}

impl MetadataFilter {
    pub fn resumes_only() -> Self {
        Self {
            doc_type: DocumentType::Resume,
        }
    }
}

/// Text → unit-length vector. Must be deterministic for identical input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

/// The external vector store.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts an entry. Returns `false` when the id already exists; the existing entry
    /// is left untouched.
    async fn upsert(&self, entry: IndexEntry) -> Result<bool, AppError>;

    /// Inserts an entry or overwrites the one with the same id, vector included.
    /// Returns `true` when an existing entry was overwritten.
    async fn replace(&self, entry: IndexEntry) -> Result<bool, AppError>;

    /// Up to `k` entries ordered by ascending distance to `vector`.
    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<Candidate>, AppError>;

    /// Every entry matching `filter`, ordered by id.
    async fn get(&self, filter: Option<MetadataFilter>) -> Result<Vec<StoredDocument>, AppError>;

    /// Total number of entries.
    async fn count(&self) -> Result<usize, AppError>;
}
