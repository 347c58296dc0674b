//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::document::{DocumentMetadata, DocumentType};
use crate::search::backend::{
    Candidate, Embedder, IndexEntry, MetadataFilter, StoredDocument, VectorIndex,
};

pub fn candidate(id: &str, text: &str, distance: f64) -> Candidate {
    with_type(id, text, distance, DocumentType::Resume)
}

pub fn note(id: &str, text: &str, distance: f64) -> Candidate {
    with_type(id, text, distance, DocumentType::Note)
}

fn with_type(id: &str, text: &str, distance: f64, doc_type: DocumentType) -> Candidate {
    Candidate {
        id: id.to_string(),
        text: text.to_string(),
        distance,
        metadata: DocumentMetadata {
            doc_type,
            filename: id.to_string(),
        },
    }
}

/// Returns a constant unit vector and records every text it was asked to embed.
#[derive(Default)]
pub struct FixedEmbedder {
    calls: AtomicUsize,
    texts: Mutex<Vec<String>>,
}

impl FixedEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.lock().unwrap().push(text.to_string());
        Ok(vec![1.0, 0.0, 0.0])
    }
}

pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, AppError> {
        Err(AppError::Embedding("service unavailable".to_string()))
    }
}

/// Serves a preset candidate pool for queries and keeps upserted entries separately.
#[derive(Default)]
pub struct FakeIndex {
    pool: Vec<Candidate>,
    entries: Mutex<Vec<IndexEntry>>,
    queries: Mutex<Vec<(usize, Option<MetadataFilter>)>>,
}

impl FakeIndex {
    pub fn with_pool(pool: Vec<Candidate>) -> Self {
        Self {
            pool,
            ..Self::default()
        }
    }

    /// `(k, filter)` of every query, in call order.
    pub fn queries(&self) -> Vec<(usize, Option<MetadataFilter>)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// Stored text of an upserted entry.
    pub fn entry_text(&self, id: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.text.clone())
    }
}

fn passes(filter: Option<MetadataFilter>, metadata: &DocumentMetadata) -> bool {
    filter.map_or(true, |f| f.doc_type == metadata.doc_type)
}

#[async_trait]
impl VectorIndex for FakeIndex {
    async fn upsert(&self, entry: IndexEntry) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().unwrap();
        if entries.iter().any(|e| e.id == entry.id) {
            return Ok(false);
        }
        entries.push(entry);
        Ok(true)
    }

    async fn replace(&self, entry: IndexEntry) -> Result<bool, AppError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|e| e.id == entry.id) {
            Some(existing) => {
                *existing = entry;
                Ok(true)
            }
            None => {
                entries.push(entry);
                Ok(false)
            }
        }
    }

    async fn query(
        &self,
        _vector: &[f32],
        k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<Candidate>, AppError> {
        self.queries.lock().unwrap().push((k, filter));
        let mut hits: Vec<Candidate> = self
            .pool
            .iter()
            .filter(|c| passes(filter, &c.metadata))
            .cloned()
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn get(&self, filter: Option<MetadataFilter>) -> Result<Vec<StoredDocument>, AppError> {
        let mut docs: Vec<StoredDocument> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| passes(filter, &e.metadata))
            .map(|e| StoredDocument {
                id: e.id.clone(),
                text: e.text.clone(),
                metadata: e.metadata.clone(),
                indexed_at: Utc::now(),
            })
            .collect();
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.pool.len() + self.entries.lock().unwrap().len())
    }
}
