mod config;
mod db;
mod documents;
mod embedding_client;
mod errors;
mod matching;
mod models;
mod routes;
mod search;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::documents::source::CorpusSource;
use crate::embedding_client::EmbeddingClient;
use crate::routes::build_router;
use crate::search::dispatcher::SearchService;
use crate::search::indexer::index_if_needed;
use crate::search::pg_index::PgVectorIndex;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireSight API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (pgvector index)
    let db = create_pool(&config.database_url).await?;
    let index = Arc::new(PgVectorIndex::new(db));

    // Initialize embedding client
    let embedder = Arc::new(EmbeddingClient::new(
        &config.embedding_api_url,
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
    )?);
    info!("Embedding client initialized (model: {})", embedder.model());

    let search = SearchService::new(embedder, index);
    let source = Arc::new(CorpusSource::resumes_and_notes(
        &config.resumes_dir,
        &config.notes_dir,
    ));

    // Bootstrap the index from the corpus folders; a failure leaves search on whatever
    // is already indexed.
    match index_if_needed(
        search.embedder().as_ref(),
        search.index().as_ref(),
        source.as_ref(),
    )
    .await
    {
        Ok(report) => info!("Index bootstrap: {report:?}"),
        Err(e) => warn!("Index bootstrap failed: {e}"),
    }

    // Build app state
    let state = AppState {
        search,
        source,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
