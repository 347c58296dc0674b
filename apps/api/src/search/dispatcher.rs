//! Query Dispatcher — parses raw query parameters, fetches a candidate pool from the
//! vector index and hands it to the matching re-ranker.
//!
//! Holds no mutable state: every query is independent and `SearchService` is cheap to
//! clone across handlers.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::matching::education::EducationLevel;
use crate::matching::skills::parse_min_years;
use crate::search::backend::{Candidate, Embedder, MetadataFilter, VectorIndex};
use crate::search::rerank::{
    rank_semantic, rerank_education, rerank_skills, EducationRanking, MatchMode, QueryKind,
    ScoredCandidate, TOP_K,
};

// ────────────────────────────────────────────────────────────────────────────
// Parsed queries
// ────────────────────────────────────────────────────────────────────────────

/// Skills query after parsing the comma-separated skill list and the free-text years.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillsQuery {
    pub skills: Vec<String>,
    pub min_years: u32,
}

impl SkillsQuery {
    /// Never fails: blank skills are dropped and unparsable years become 0.
    pub fn parse(raw_skills: &str, raw_years: &str) -> Self {
        Self {
            skills: split_list(raw_skills),
            min_years: parse_min_years(raw_years),
        }
    }

    /// "rust, go" or "rust, go, 5 years".
    pub fn semantic_query(&self) -> String {
        let mut query = self.skills.join(", ");
        if self.min_years > 0 {
            query.push_str(&format!(", {} years", self.min_years));
        }
        query
    }
}

/// Education query: the raw level names as typed plus the ones that were recognised.
#[derive(Debug, Clone, PartialEq)]
pub struct EducationQuery {
    pub raw_levels: Vec<String>,
    pub levels: Vec<EducationLevel>,
}

impl EducationQuery {
    /// Unrecognised level names stay in the semantic query but cannot match a document.
    pub fn parse(raw_levels: &str) -> Self {
        let raw_levels = split_list(raw_levels);
        let mut levels = Vec::new();
        for raw in &raw_levels {
            match raw.parse::<EducationLevel>() {
                Ok(level) if !levels.contains(&level) => levels.push(level),
                Ok(_) => {}
                Err(e) => debug!("Ignoring education filter: {e}"),
            }
        }
        Self { raw_levels, levels }
    }

    pub fn semantic_query(&self) -> String {
        format!("candidates with {}", self.raw_levels.join(", "))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Tagged request / response
// ────────────────────────────────────────────────────────────────────────────

/// One query of any kind, with raw (unparsed) parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchRequest {
    JobDescription {
        jd: String,
    },
    Skills {
        skills: String,
        #[serde(default)]
        years: String,
    },
    Education {
        levels: String,
    },
    General {
        q: String,
        #[serde(default)]
        include_notes: bool,
    },
}

/// Ranked results of one query. `match_mode` is only set for education queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub kind: QueryKind,
    pub results: Vec<ScoredCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_count: Option<usize>,
}

impl SearchResponse {
    fn ranked(kind: QueryKind, results: Vec<ScoredCandidate>) -> Self {
        Self {
            kind,
            results,
            match_mode: None,
            matched_count: None,
        }
    }
}

impl From<EducationRanking> for SearchResponse {
    fn from(ranking: EducationRanking) -> Self {
        Self {
            kind: QueryKind::Education,
            results: ranking.results,
            match_mode: Some(ranking.match_mode),
            matched_count: Some(ranking.matched_count),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// The four query entry points over injected collaborators.
#[derive(Clone)]
pub struct SearchService {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl SearchService {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Routes a tagged request to its query kind.
    pub async fn dispatch(&self, request: SearchRequest) -> Result<SearchResponse, AppError> {
        match request {
            SearchRequest::JobDescription { jd } => Ok(SearchResponse::ranked(
                QueryKind::JobDescription,
                self.search_by_jd(&jd).await?,
            )),
            SearchRequest::Skills { skills, years } => Ok(SearchResponse::ranked(
                QueryKind::Skills,
                self.search_by_skills(&SkillsQuery::parse(&skills, &years))
                    .await?,
            )),
            SearchRequest::Education { levels } => Ok(self
                .search_by_education(&EducationQuery::parse(&levels))
                .await?
                .into()),
            SearchRequest::General { q, include_notes } => Ok(SearchResponse::ranked(
                QueryKind::General,
                self.search_general(&q, include_notes).await?,
            )),
        }
    }

    /// Free-text job description, resumes only, pure semantic order.
    pub async fn search_by_jd(&self, jd: &str) -> Result<Vec<ScoredCandidate>, AppError> {
        if jd.trim().is_empty() {
            return Ok(Vec::new());
        }
        let pool = self
            .candidate_pool(jd, QueryKind::JobDescription.pool_size(), false)
            .await?;
        info!("JD search: {} candidates", pool.len());
        Ok(rank_semantic(pool, TOP_K))
    }

    /// Skills + minimum experience, re-ranked on skill hits and stated years.
    pub async fn search_by_skills(
        &self,
        query: &SkillsQuery,
    ) -> Result<Vec<ScoredCandidate>, AppError> {
        if query.skills.is_empty() {
            return Ok(Vec::new());
        }
        let pool = self
            .candidate_pool(&query.semantic_query(), QueryKind::Skills.pool_size(), false)
            .await?;
        info!(
            "Skills search: {} skills, min {} years, {} candidates",
            query.skills.len(),
            query.min_years,
            pool.len()
        );
        Ok(rerank_skills(pool, &query.skills, query.min_years, TOP_K))
    }

    /// Education levels, filtered through the dominant-level funnel.
    ///
    /// A query without any level name behaves like an empty pool: no results, tagged as
    /// the semantic fallback.
    pub async fn search_by_education(
        &self,
        query: &EducationQuery,
    ) -> Result<EducationRanking, AppError> {
        if query.raw_levels.is_empty() {
            return Ok(rerank_education(Vec::new(), &[], TOP_K));
        }
        let pool = self
            .candidate_pool(&query.semantic_query(), QueryKind::Education.pool_size(), false)
            .await?;
        let ranking = rerank_education(pool, &query.levels, TOP_K);
        info!(
            "Education search {:?}: {:?}, {} passed the filter",
            query.levels, ranking.match_mode, ranking.matched_count
        );
        Ok(ranking)
    }

    /// General question; interview notes are included only when asked for.
    pub async fn search_general(
        &self,
        question: &str,
        include_notes: bool,
    ) -> Result<Vec<ScoredCandidate>, AppError> {
        if question.trim().is_empty() {
            return Ok(Vec::new());
        }
        let pool = self
            .candidate_pool(question, QueryKind::General.pool_size(), include_notes)
            .await?;
        info!("General search (notes: {include_notes}): {} candidates", pool.len());
        Ok(rank_semantic(pool, TOP_K))
    }

    async fn candidate_pool(
        &self,
        query: &str,
        k: usize,
        include_notes: bool,
    ) -> Result<Vec<Candidate>, AppError> {
        let vector = self.embedder.embed(query).await?;
        let filter = (!include_notes).then(MetadataFilter::resumes_only);
        debug!("Querying index: k={k}, filter={filter:?}");
        self.index.query(&vector, k, filter).await
    }
}
