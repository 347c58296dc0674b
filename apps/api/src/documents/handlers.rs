use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::documents::ingest::{ingest_resume, IngestOutcome};
use crate::documents::originals::{content_type_for, is_plain_file_name};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/resumes/upload
///
/// Multipart body with one file field (PDF, DOCX or UTF-8 text). Answers 201 for a new
/// resume and 200 when an earlier upload with the same name was replaced.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestOutcome>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let outcome = ingest_resume(
            state.search.embedder().as_ref(),
            state.search.index().as_ref(),
            &state.config.resumes_dir,
            &state.config.original_resumes_dir,
            &filename,
            bytes.to_vec(),
        )
        .await?;

        let status = if outcome.replaced {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        };
        return Ok((status, Json(outcome)));
    }

    Err(AppError::Validation("No file field in upload".to_string()))
}

/// GET /resume/:filename
/// Serves an original resume file inline.
pub async fn handle_serve_original(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !is_plain_file_name(&filename) {
        return Err(AppError::Validation(format!("Invalid file name '{filename}'")));
    }

    let path = state.config.original_resumes_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound(format!("Resume {filename} not found")))
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read {}", path.display()))
                .into())
        }
    };

    let disposition = format!("inline; filename=\"{}\"", filename.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
