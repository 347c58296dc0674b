use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of indexed document. Most search modes only look at resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Resume,
    Note,
}

impl DocumentType {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::Resume => "resume",
            DocumentType::Note => "note",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume" => Ok(DocumentType::Resume),
            "note" => Ok(DocumentType::Note),
            other => Err(anyhow::anyhow!("unknown document type '{other}'")),
        }
    }
}

/// A document ready for indexing: filename-derived id plus its text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub doc_type: DocumentType,
}

/// Metadata stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub filename: String,
}

impl Document {
    pub fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            doc_type: self.doc_type,
            filename: self.id.clone(),
        }
    }
}

/// Row shape of `resume_embeddings` without the vector column.
#[derive(Debug, Clone, FromRow)]
pub struct StoredDocumentRow {
    pub id: String,
    pub doc_type: String,
    pub filename: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Row shape of a nearest-neighbour query.
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: String,
    pub doc_type: String,
    pub filename: String,
    pub body: String,
    pub distance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_round_trips_through_str() {
        assert_eq!("resume".parse::<DocumentType>().unwrap(), DocumentType::Resume);
        assert_eq!(DocumentType::Note.as_str(), "note");
        assert!("memo".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_metadata_serializes_type_key() {
        let doc = Document {
            id: "jane_cleaned.txt".to_string(),
            text: "Rust".to_string(),
            doc_type: DocumentType::Resume,
        };
        let json = serde_json::to_value(doc.metadata()).unwrap();
        assert_eq!(json["type"], "resume");
        assert_eq!(json["filename"], "jane_cleaned.txt");
    }
}
