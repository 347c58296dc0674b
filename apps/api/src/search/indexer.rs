//! Index bootstrap: embeds the document corpus into an empty index.

use serde::Serialize;
use tracing::{info, warn};

use crate::documents::source::DocumentSource;
use crate::errors::AppError;
use crate::models::document::Document;
use crate::search::backend::{Embedder, IndexEntry, VectorIndex};

/// Outcome of one bootstrap run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// The index already held entries, so nothing was loaded or embedded.
    pub already_populated: bool,
    pub inserted: usize,
    /// Documents whose id the store already had.
    pub skipped_duplicates: usize,
}

/// Embeds every document from `source` when the index is empty.
///
/// Running it against a populated index makes no insert calls. Two concurrent runs may
/// both see an empty index; the store ignores the duplicate ids.
pub async fn index_if_needed(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    source: &dyn DocumentSource,
) -> Result<IndexReport, AppError> {
    let existing = index.count().await?;
    if existing > 0 {
        info!("Index already holds {existing} entries, skipping bootstrap");
        return Ok(IndexReport {
            already_populated: true,
            ..IndexReport::default()
        });
    }

    let docs = source.load().await?;
    info!("Indexing {} documents", docs.len());

    let mut report = IndexReport::default();
    for doc in &docs {
        if index_document(embedder, index, doc).await? {
            report.inserted += 1;
        } else {
            report.skipped_duplicates += 1;
        }
    }

    info!(
        "Bootstrap finished: {} inserted, {} duplicates",
        report.inserted, report.skipped_duplicates
    );
    Ok(report)
}

/// Embeds and upserts one document. Returns `false` when its id was already indexed.
pub async fn index_document(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    doc: &Document,
) -> Result<bool, AppError> {
    let vector = embedder.embed(&doc.text).await?;
    let inserted = index
        .upsert(IndexEntry {
            id: doc.id.clone(),
            vector,
            text: doc.text.clone(),
            metadata: doc.metadata(),
        })
        .await?;
    if !inserted {
        warn!("Document {} is already indexed", doc.id);
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::models::document::DocumentType;
    use crate::search::backend::MetadataFilter;
    use crate::search::testing::{FailingEmbedder, FakeIndex, FixedEmbedder};

    struct StaticSource(Vec<Document>);

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn load(&self) -> Result<Vec<Document>, AppError> {
            Ok(self.0.clone())
        }
    }

    fn doc(id: &str, doc_type: DocumentType) -> Document {
        Document {
            id: id.to_string(),
            text: format!("text of {id}"),
            doc_type,
        }
    }

    fn corpus() -> StaticSource {
        StaticSource(vec![
            doc("a_cleaned.txt", DocumentType::Resume),
            doc("b_cleaned.txt", DocumentType::Resume),
            doc("a_interview.txt", DocumentType::Note),
        ])
    }

    #[tokio::test]
    async fn test_bootstrap_fills_empty_index() {
        let embedder = FixedEmbedder::default();
        let index = FakeIndex::default();

        let report = index_if_needed(&embedder, &index, &corpus()).await.unwrap();

        assert_eq!(report.inserted, 3);
        assert!(!report.already_populated);
        assert_eq!(embedder.calls(), 3);
        let resumes = index
            .get(Some(MetadataFilter::resumes_only()))
            .await
            .unwrap();
        assert_eq!(resumes.len(), 2);
    }

    #[tokio::test]
    async fn test_second_bootstrap_inserts_nothing() {
        let embedder = FixedEmbedder::default();
        let index = FakeIndex::default();
        let source = corpus();

        index_if_needed(&embedder, &index, &source).await.unwrap();
        let calls_after_first = embedder.calls();
        let second = index_if_needed(&embedder, &index, &source).await.unwrap();

        assert!(second.already_populated);
        assert_eq!(second.inserted, 0);
        assert_eq!(embedder.calls(), calls_after_first);
        assert_eq!(index.entry_ids().len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_counted_not_inserted() {
        let embedder = FixedEmbedder::default();
        let index = FakeIndex::default();
        let source = StaticSource(vec![
            doc("a_cleaned.txt", DocumentType::Resume),
            doc("a_cleaned.txt", DocumentType::Resume),
        ]);

        let report = index_if_needed(&embedder, &index, &source).await.unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(index.entry_ids(), vec!["a_cleaned.txt"]);
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_bootstrap() {
        let index = FakeIndex::default();
        let err = index_if_needed(&FailingEmbedder, &index, &corpus())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
        assert!(index.entry_ids().is_empty());
    }
}
