//! `VectorIndex` over Postgres + pgvector.
//!
//! Vectors are bound as `REAL[]` and cast to `vector` in SQL. Distance is pgvector's cosine
//! distance (`<=>`), so `1 - distance` is the cosine similarity.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::errors::AppError;
use crate::models::document::{CandidateRow, DocumentMetadata, StoredDocumentRow};
use crate::search::backend::{
    Candidate, IndexEntry, MetadataFilter, StoredDocument, VectorIndex,
};

#[derive(Clone)]
pub struct PgVectorIndex {
    pool: PgPool,
}

impl PgVectorIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn type_param(filter: Option<MetadataFilter>) -> Option<&'static str> {
    filter.map(|f| f.doc_type.as_str())
}

fn metadata(doc_type: &str, filename: String) -> Result<DocumentMetadata, AppError> {
    Ok(DocumentMetadata {
        doc_type: doc_type.parse()?,
        filename,
    })
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = AppError;

    fn try_from(row: CandidateRow) -> Result<Self, Self::Error> {
        Ok(Candidate {
            metadata: metadata(&row.doc_type, row.filename)?,
            id: row.id,
            text: row.body,
            distance: row.distance,
        })
    }
}

impl TryFrom<StoredDocumentRow> for StoredDocument {
    type Error = AppError;

    fn try_from(row: StoredDocumentRow) -> Result<Self, Self::Error> {
        Ok(StoredDocument {
            metadata: metadata(&row.doc_type, row.filename)?,
            id: row.id,
            text: row.body,
            indexed_at: row.created_at,
        })
    }
}

#[async_trait]
impl VectorIndex for PgVectorIndex {
    async fn upsert(&self, entry: IndexEntry) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO resume_embeddings (id, doc_type, filename, body, embedding)
            VALUES ($1, $2, $3, $4, $5::real[]::vector)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&entry.id)
        .bind(entry.metadata.doc_type.as_str())
        .bind(&entry.metadata.filename)
        .bind(&entry.text)
        .bind(&entry.vector)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace(&self, entry: IndexEntry) -> Result<bool, AppError> {
        // xmax is 0 for a freshly inserted row and non-zero for an updated one.
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO resume_embeddings (id, doc_type, filename, body, embedding)
            VALUES ($1, $2, $3, $4, $5::real[]::vector)
            ON CONFLICT (id) DO UPDATE
            SET doc_type = EXCLUDED.doc_type,
                filename = EXCLUDED.filename,
                body = EXCLUDED.body,
                embedding = EXCLUDED.embedding,
                created_at = now()
            RETURNING (xmax = 0)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.metadata.doc_type.as_str())
        .bind(&entry.metadata.filename)
        .bind(&entry.text)
        .bind(&entry.vector)
        .fetch_one(&self.pool)
        .await?;

        Ok(!inserted)
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<MetadataFilter>,
    ) -> Result<Vec<Candidate>, AppError> {
        let limit = i64::try_from(k).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, doc_type, filename, body,
                   (embedding <=> $1::real[]::vector)::float8 AS distance
            FROM resume_embeddings
            WHERE $2::text IS NULL OR doc_type = $2
            ORDER BY distance ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(vector.to_vec())
        .bind(type_param(filter))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!("pgvector returned {} rows (k={k})", rows.len());
        rows.into_iter().map(Candidate::try_from).collect()
    }

    async fn get(&self, filter: Option<MetadataFilter>) -> Result<Vec<StoredDocument>, AppError> {
        let rows = sqlx::query_as::<_, StoredDocumentRow>(
            r#"
            SELECT id, doc_type, filename, body, created_at
            FROM resume_embeddings
            WHERE $1::text IS NULL OR doc_type = $1
            ORDER BY id
            "#,
        )
        .bind(type_param(filter))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(StoredDocument::try_from).collect()
    }

    async fn count(&self) -> Result<usize, AppError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM resume_embeddings")
            .fetch_one(&self.pool)
            .await?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentType;

    #[test]
    fn test_type_param_follows_filter() {
        assert_eq!(type_param(None), None);
        assert_eq!(type_param(Some(MetadataFilter::resumes_only())), Some("resume"));
    }

    #[test]
    fn test_candidate_row_conversion() {
        let row = CandidateRow {
            id: "jane_cleaned.txt".to_string(),
            doc_type: "note".to_string(),
            filename: "jane_cleaned.txt".to_string(),
            body: "Rust".to_string(),
            distance: 0.25,
        };
        let candidate = Candidate::try_from(row).unwrap();
        assert_eq!(candidate.metadata.doc_type, DocumentType::Note);
        assert_eq!(candidate.text, "Rust");
        assert_eq!(candidate.distance, 0.25);
    }

    #[test]
    fn test_unknown_row_type_is_an_error() {
        let row = CandidateRow {
            id: "x".to_string(),
            doc_type: "memo".to_string(),
            filename: "x".to_string(),
            body: String::new(),
            distance: 0.0,
        };
        assert!(matches!(
            Candidate::try_from(row),
            Err(AppError::Internal(_))
        ));
    }
}
