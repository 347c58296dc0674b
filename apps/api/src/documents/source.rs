//! Document sources for the index bootstrap.
//!
//! In practice the corpus is two folders of cleaned `.txt` files: resumes and interview
//! notes. Each file becomes one `Document` whose id is its file name.

use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::document::{Document, DocumentType};

/// Anything that can produce the documents to index.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Document>, AppError>;
}

/// Every non-empty `.txt` file in one directory, tagged with a single document type.
#[derive(Debug, Clone)]
pub struct FolderSource {
    dir: PathBuf,
    doc_type: DocumentType,
}

impl FolderSource {
    pub fn new(dir: impl Into<PathBuf>, doc_type: DocumentType) -> Self {
        Self {
            dir: dir.into(),
            doc_type,
        }
    }
}

#[async_trait]
impl DocumentSource for FolderSource {
    /// Files come back sorted by name. A missing directory yields no documents.
    async fn load(&self) -> Result<Vec<Document>, AppError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} folder {} does not exist", self.doc_type, self.dir.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read {}", self.dir.display()))
                    .into())
            }
        };

        let mut docs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to list {}", self.dir.display()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(id) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
                continue;
            };

            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let text = raw.trim();
            if text.is_empty() {
                debug!("Skipping empty file {id}");
                continue;
            }

            docs.push(Document {
                id,
                text: text.to_string(),
                doc_type: self.doc_type,
            });
        }

        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }
}

/// Several sources loaded one after another.
pub struct CorpusSource {
    sources: Vec<Box<dyn DocumentSource>>,
}

impl CorpusSource {
    pub fn new(sources: Vec<Box<dyn DocumentSource>>) -> Self {
        Self { sources }
    }

    /// The resume and interview-note folders.
    pub fn resumes_and_notes(resumes_dir: &Path, notes_dir: &Path) -> Self {
        let sources: Vec<Box<dyn DocumentSource>> = vec![
            Box::new(FolderSource::new(resumes_dir, DocumentType::Resume)),
            Box::new(FolderSource::new(notes_dir, DocumentType::Note)),
        ];
        Self::new(sources)
    }
}

#[async_trait]
impl DocumentSource for CorpusSource {
    async fn load(&self) -> Result<Vec<Document>, AppError> {
        let mut docs = Vec::new();
        for source in &self.sources {
            docs.extend(source.load().await?);
        }
        Ok(docs)
    }
}
