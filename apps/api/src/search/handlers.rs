use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::documents::originals::{find_original_resume, list_originals};
use crate::errors::AppError;
use crate::matching::normalize::display_name_from_id;
use crate::models::document::DocumentType;
use crate::search::backend::MetadataFilter;
use crate::search::dispatcher::{SearchRequest, SearchResponse};
use crate::search::indexer::{index_if_needed, IndexReport};
use crate::search::rerank::{MatchMode, QueryKind, ScoredCandidate};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct JdSearchRequest {
    pub jd: String,
}

#[derive(Deserialize)]
pub struct SkillsSearchRequest {
    pub skills: String,
    /// Free text ("5+ years") or a bare number.
    #[serde(default)]
    pub years: Value,
}

impl SkillsSearchRequest {
    fn years_text(&self) -> String {
        match &self.years {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Deserialize)]
pub struct EducationSearchRequest {
    pub levels: String,
}

#[derive(Deserialize)]
pub struct GeneralSearchRequest {
    pub q: String,
    #[serde(default)]
    pub include_notes: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Response bodies
// ────────────────────────────────────────────────────────────────────────────

/// One result as shown to recruiters: scores rounded, original file attached.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub similarity: f64,
    pub preview: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub matched_keywords: Vec<String>,
    /// Original PDF/DOCX under `/resume/`, when one can be found.
    pub resume: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub kind: QueryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<usize>,
    pub results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct ResumeSummary {
    pub id: String,
    pub name: String,
    pub filename: String,
    pub resume: Option<String>,
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn to_hit(candidate: ScoredCandidate, originals: &[String]) -> SearchHit {
    let resume = match candidate.doc_type {
        DocumentType::Resume => find_original_resume(&candidate.id, originals),
        DocumentType::Note => None,
    };
    SearchHit {
        score: round4(candidate.score),
        similarity: round4(candidate.similarity),
        resume,
        id: candidate.id,
        name: candidate.name,
        preview: candidate.preview,
        doc_type: candidate.doc_type,
        matched_keywords: candidate.matched_keywords,
    }
}

fn to_results(response: SearchResponse, originals: &[String]) -> SearchResults {
    SearchResults {
        kind: response.kind,
        match_mode: response.match_mode,
        matched_count: response.matched_count,
        results: response
            .results
            .into_iter()
            .map(|c| to_hit(c, originals))
            .collect(),
    }
}

async fn run(state: &AppState, request: SearchRequest) -> Result<Json<SearchResults>, AppError> {
    let response = state.search.dispatch(request).await?;
    let originals = list_originals(&state.config.original_resumes_dir).await;
    Ok(Json(to_results(response, &originals)))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/search/jd
pub async fn handle_search_jd(
    State(state): State<AppState>,
    Json(req): Json<JdSearchRequest>,
) -> Result<Json<SearchResults>, AppError> {
    run(&state, SearchRequest::JobDescription { jd: req.jd }).await
}

/// POST /api/v1/search/skills
pub async fn handle_search_skills(
    State(state): State<AppState>,
    Json(req): Json<SkillsSearchRequest>,
) -> Result<Json<SearchResults>, AppError> {
    let years = req.years_text();
    run(
        &state,
        SearchRequest::Skills {
            skills: req.skills,
            years,
        },
    )
    .await
}

/// POST /api/v1/search/education
pub async fn handle_search_education(
    State(state): State<AppState>,
    Json(req): Json<EducationSearchRequest>,
) -> Result<Json<SearchResults>, AppError> {
    run(&state, SearchRequest::Education { levels: req.levels }).await
}

/// POST /api/v1/search/general
pub async fn handle_search_general(
    State(state): State<AppState>,
    Json(req): Json<GeneralSearchRequest>,
) -> Result<Json<SearchResults>, AppError> {
    run(
        &state,
        SearchRequest::General {
            q: req.q,
            include_notes: req.include_notes,
        },
    )
    .await
}

/// GET /api/v1/resumes
/// Every indexed resume with its display name and original file.
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let docs = state
        .search
        .index()
        .get(Some(MetadataFilter::resumes_only()))
        .await?;
    let originals = list_originals(&state.config.original_resumes_dir).await;

    Ok(Json(
        docs.into_iter()
            .map(|doc| ResumeSummary {
                name: display_name_from_id(&doc.id),
                resume: find_original_resume(&doc.id, &originals),
                filename: doc.metadata.filename,
                id: doc.id,
            })
            .collect(),
    ))
}

/// POST /api/v1/index
/// Runs the bootstrap; a populated index is left alone.
pub async fn handle_index(State(state): State<AppState>) -> Result<Json<IndexReport>, AppError> {
    let report = index_if_needed(
        state.search.embedder().as_ref(),
        state.search.index().as_ref(),
        state.source.as_ref(),
    )
    .await?;
    Ok(Json(report))
}
