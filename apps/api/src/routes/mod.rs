pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::documents::handlers as documents;
use crate::search::handlers as search;
use crate::state::AppState;

/// Uploaded resumes may be larger than axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Search API
        .route("/api/v1/search/jd", post(search::handle_search_jd))
        .route("/api/v1/search/skills", post(search::handle_search_skills))
        .route(
            "/api/v1/search/education",
            post(search::handle_search_education),
        )
        .route("/api/v1/search/general", post(search::handle_search_general))
        // Corpus API
        .route("/api/v1/resumes", get(search::handle_list_resumes))
        .route(
            "/api/v1/resumes/upload",
            post(documents::handle_upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/v1/index", post(search::handle_index))
        // Original files
        .route("/resume/:filename", get(documents::handle_serve_original))
        .with_state(state)
}
