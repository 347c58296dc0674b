use std::sync::Arc;

use crate::config::Config;
use crate::documents::source::DocumentSource;
use crate::search::dispatcher::SearchService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Embedder + vector index behind the four query kinds.
    pub search: SearchService,
    /// Corpus used by the index bootstrap.
    pub source: Arc<dyn DocumentSource>,
    pub config: Config,
}
