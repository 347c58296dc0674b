//! Single-resume ingest: extract, normalize, embed, then store the files and the vector.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use tracing::{info, warn};

use crate::documents::originals::is_plain_file_name;
use crate::errors::AppError;
use crate::matching::normalize::{file_stem, normalize_text};
use crate::models::document::{Document, DocumentType};
use crate::search::backend::{Embedder, IndexEntry, VectorIndex};

/// Suffix of files staged next to their final path until the index write succeeds.
const STAGING_SUFFIX: &str = ".part";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub id: String,
    /// `true` when an earlier upload with the same id was overwritten.
    pub replaced: bool,
    pub characters: usize,
}

/// Id of the cleaned text for an uploaded file: "Jane Doe.pdf" → "Jane Doe_cleaned.txt".
pub fn cleaned_id_for(filename: &str) -> String {
    format!("{}_cleaned.txt", file_stem(filename))
}

fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase()
}

/// Raw text of an uploaded PDF, DOCX or plain-text file.
pub async fn extract_text(filename: &str, bytes: Vec<u8>) -> Result<String, AppError> {
    match extension(filename).as_str() {
        "pdf" => {
            let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}"))
                })?;
            text.map_err(|e| AppError::UnprocessableEntity(format!("Could not read PDF: {e}")))
        }
        "docx" => {
            let text = tokio::task::spawn_blocking(move || docx_text(&bytes))
                .await
                .map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("spawn_blocking failed in DOCX extraction: {e}"))
                })?;
            text.map_err(|e| AppError::UnprocessableEntity(format!("Could not read DOCX: {e:#}")))
        }
        "txt" => String::from_utf8(bytes)
            .map_err(|_| AppError::Validation("Text uploads must be UTF-8".to_string())),
        other => Err(AppError::Validation(format!(
            "Unsupported file type '.{other}', expected .pdf, .docx or .txt"
        ))),
    }
}

/// Body text of a DOCX: every `<w:t>` run from `word/document.xml`, one line per paragraph.
fn docx_text(bytes: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).context("not a DOCX archive")?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("word/document.xml is missing")?
        .read_to_string(&mut xml)
        .context("word/document.xml is unreadable")?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run => {
                let run = t.unescape().context("bad XML escape")?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }
    Ok(text)
}

fn staged(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

async fn write_staged(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(staged(path), contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

async fn discard_staged(paths: &[&Path]) {
    for path in paths {
        let part = staged(path);
        if let Err(e) = tokio::fs::remove_file(&part).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Could not remove {}: {e}", part.display());
            }
        }
    }
}

async fn commit_staged(paths: &[&Path]) -> Result<(), AppError> {
    for path in paths {
        tokio::fs::rename(staged(path), path)
            .await
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
    }
    Ok(())
}

/// Ingests one uploaded resume.
///
/// The original bytes go to `originals_dir` and the cleaned text to `resumes_dir` under its
/// cleaned id, so a later bootstrap from the folders sees the same document. Uploading under
/// an existing id replaces the stored text and vector. Nothing on disk changes unless the
/// document was embedded and written to the index.
pub async fn ingest_resume(
    embedder: &dyn Embedder,
    index: &dyn VectorIndex,
    resumes_dir: &Path,
    originals_dir: &Path,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<IngestOutcome, AppError> {
    if !is_plain_file_name(filename) {
        return Err(AppError::Validation(format!("Invalid file name '{filename}'")));
    }

    let raw = extract_text(filename, bytes.clone()).await?;
    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(format!(
            "No text could be extracted from {filename}"
        )));
    }

    let doc = Document {
        id: cleaned_id_for(filename),
        text,
        doc_type: DocumentType::Resume,
    };
    let vector = embedder.embed(&doc.text).await?;

    let original_path = originals_dir.join(filename);
    let cleaned_path = resumes_dir.join(&doc.id);
    let paths = [original_path.as_path(), cleaned_path.as_path()];

    let staged_ok = match write_staged(&original_path, &bytes).await {
        Ok(()) => write_staged(&cleaned_path, doc.text.as_bytes()).await,
        Err(e) => Err(e),
    };
    if let Err(e) = staged_ok {
        discard_staged(&paths).await;
        return Err(e);
    }

    let entry = IndexEntry {
        id: doc.id.clone(),
        vector,
        text: doc.text.clone(),
        metadata: doc.metadata(),
    };
    let replaced = match index.replace(entry).await {
        Ok(replaced) => replaced,
        Err(e) => {
            discard_staged(&paths).await;
            return Err(e);
        }
    };
    commit_staged(&paths).await?;

    info!(
        "Ingested {} ({} chars, replaced: {replaced})",
        doc.id,
        doc.text.len()
    );
    Ok(IngestOutcome {
        characters: doc.text.len(),
        id: doc.id,
        replaced,
    })
}
