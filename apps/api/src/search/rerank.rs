//! Result Re-ranker — blends semantic similarity with heuristic scores.
//!
//! composite = (1 − distance) + weight × heuristic
//!
//! Similarity is reported as `1 − distance` without re-clamping. That is only a proper
//! similarity when the index returns cosine distance in [0, 2].

use serde::{Deserialize, Serialize};

use crate::matching::education::{self, EducationLevel};
use crate::matching::normalize::{display_name_from_id, preview};
use crate::matching::skills;
use crate::models::document::DocumentType;
use crate::search::backend::Candidate;

/// Results returned per query, whatever the pool size.
pub const TOP_K: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    JobDescription,
    Skills,
    Education,
    General,
}

impl QueryKind {
    /// Weight of the heuristic score in the composite.
    pub fn heuristic_weight(self) -> f64 {
        match self {
            QueryKind::JobDescription | QueryKind::General => 0.0,
            QueryKind::Skills => 0.3,
            QueryKind::Education => 0.4,
        }
    }

    /// Candidates fetched from the index before re-scoring.
    pub fn pool_size(self) -> usize {
        match self {
            QueryKind::JobDescription | QueryKind::General => 5,
            QueryKind::Skills => 10,
            QueryKind::Education => 30,
        }
    }
}

/// Which education path produced the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Only candidates whose dominant education level was requested.
    KeywordMatch,
    /// No candidate passed the education filter; the whole pool was ranked.
    SemanticFallback,
}

/// Heuristic contribution for one candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Heuristic {
    pub score: f64,
    /// Literal strings that earned the score, for highlighting.
    pub keywords: Vec<String>,
}

/// A ranked, annotated search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub name: String,
    pub score: f64,
    pub similarity: f64,
    pub preview: String,
    pub doc_type: DocumentType,
    pub matched_keywords: Vec<String>,
}

/// Education ranking plus the funnel path taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationRanking {
    pub match_mode: MatchMode,
    /// Candidates that passed the education filter.
    pub matched_count: usize,
    pub results: Vec<ScoredCandidate>,
}

/// Scores every candidate, sorts by composite descending and keeps the top `top_k`.
///
/// The sort is stable: equal composites keep their pool order.
pub fn rerank<F>(
    pool: Vec<Candidate>,
    weight: f64,
    top_k: usize,
    mut heuristic: F,
) -> Vec<ScoredCandidate>
where
    F: FnMut(&Candidate) -> Heuristic,
{
    let mut scored: Vec<ScoredCandidate> = pool
        .into_iter()
        .map(|candidate| {
            let Heuristic { score, keywords } = heuristic(&candidate);
            let similarity = 1.0 - candidate.distance;
            ScoredCandidate {
                name: display_name_from_id(&candidate.id),
                preview: preview(&candidate.text),
                score: similarity + weight * score,
                similarity,
                doc_type: candidate.metadata.doc_type,
                matched_keywords: keywords,
                id: candidate.id,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored
}

/// Pure semantic order: similarity only.
pub fn rank_semantic(pool: Vec<Candidate>, top_k: usize) -> Vec<ScoredCandidate> {
    rerank(pool, 0.0, top_k, |_| Heuristic::default())
}

/// Skills re-rank: literal skill hits plus the stated-experience bonus.
pub fn rerank_skills(
    pool: Vec<Candidate>,
    required_skills: &[String],
    min_years: u32,
    top_k: usize,
) -> Vec<ScoredCandidate> {
    rerank(pool, QueryKind::Skills.heuristic_weight(), top_k, |c| {
        let s = skills::score(&c.text, required_skills, min_years);
        Heuristic {
            score: s.score,
            keywords: s.matched_skills,
        }
    })
}

/// Education re-rank with the two-stage funnel.
///
/// Candidates whose dominant level is one of `levels` are ranked on their own. When none
/// qualifies the full pool is ranked with the same formula and tagged as a fallback, so a
/// non-empty pool never produces an empty ranking.
pub fn rerank_education(
    pool: Vec<Candidate>,
    levels: &[EducationLevel],
    top_k: usize,
) -> EducationRanking {
    let matched: Vec<Candidate> = pool
        .iter()
        .filter(|c| education::matches_any(&c.text, levels))
        .cloned()
        .collect();
    let matched_count = matched.len();

    let (match_mode, ranked_pool) = if matched.is_empty() {
        (MatchMode::SemanticFallback, pool)
    } else {
        (MatchMode::KeywordMatch, matched)
    };

    let results = rerank(
        ranked_pool,
        QueryKind::Education.heuristic_weight(),
        top_k,
        |c| education_heuristic(&c.text, levels),
    );

    EducationRanking {
        match_mode,
        matched_count,
        results,
    }
}

/// Confidence of the dominant level, with its keywords for highlighting.
fn education_heuristic(text: &str, levels: &[EducationLevel]) -> Heuristic {
    education::highest(text, levels)
        .map(|m| Heuristic {
            score: m.confidence,
            keywords: m.keywords_found,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::DocumentMetadata;

    fn candidate(id: &str, text: &str, distance: f64) -> Candidate {
        Candidate {
            id: id.to_string(),
            text: text.to_string(),
            distance,
            metadata: DocumentMetadata {
                doc_type: DocumentType::Resume,
                filename: id.to_string(),
            },
        }
    }

    fn ids(results: &[ScoredCandidate]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_weights_and_pool_sizes_per_kind() {
        assert_eq!(QueryKind::JobDescription.heuristic_weight(), 0.0);
        assert_eq!(QueryKind::General.heuristic_weight(), 0.0);
        assert_eq!(QueryKind::Skills.heuristic_weight(), 0.3);
        assert_eq!(QueryKind::Education.heuristic_weight(), 0.4);
        assert_eq!(QueryKind::JobDescription.pool_size(), 5);
        assert_eq!(QueryKind::Skills.pool_size(), 10);
        assert_eq!(QueryKind::Education.pool_size(), 30);
    }

    #[test]
    fn test_weighted_heuristic_overtakes_similarity() {
        // similarities 0.9 and 0.5; heuristic 0 and 2.0; weight 0.3 → 0.9 and 1.1
        let pool = vec![candidate("a", "", 0.1), candidate("b", "", 0.5)];
        let results = rerank(pool, 0.3, TOP_K, |c| Heuristic {
            score: if c.id == "b" { 2.0 } else { 0.0 },
            keywords: vec![],
        });

        assert_eq!(ids(&results), vec!["b", "a"]);
        assert!((results[0].score - 1.1).abs() < 1e-9, "got {}", results[0].score);
        assert!((results[1].score - 0.9).abs() < 1e-9, "got {}", results[1].score);
        assert!((results[0].similarity - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let pool = vec![
            candidate("first", "", 0.2),
            candidate("second", "", 0.2),
            candidate("third", "", 0.2),
        ];
        let results = rank_semantic(pool, TOP_K);
        assert_eq!(ids(&results), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let pool: Vec<_> = (0..12)
            .map(|i| candidate(&format!("c{i}"), "", f64::from(i) / 20.0))
            .collect();
        let results = rank_semantic(pool, TOP_K);
        assert_eq!(results.len(), 5);
        assert_eq!(ids(&results), vec!["c0", "c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn test_similarity_is_not_clamped() {
        let results = rank_semantic(vec![candidate("far", "", 1.4)], TOP_K);
        assert!((results[0].similarity - (-0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_result_annotations() {
        let text = "Jane Doe Rust engineer with 6 years at Acme";
        let pool = vec![candidate("Jane Doe_Backend_cleaned.txt", text, 0.25)];
        let results = rank_semantic(pool, TOP_K);
        assert_eq!(results[0].name, "Jane Doe");
        assert_eq!(results[0].preview, format!("{text}..."));
        assert_eq!(results[0].doc_type, DocumentType::Resume);
        assert_eq!(results[0].score, results[0].similarity);
    }

    #[test]
    fn test_skills_rerank_reports_matched_skills() {
        let pool = vec![
            candidate("python_dev", "Python and Django, 2 years", 0.1),
            candidate("rust_dev", "Rust, Tokio, Postgres, 7 years", 0.3),
        ];
        let skills = vec!["rust".to_string(), "postgres".to_string()];
        let results = rerank_skills(pool, &skills, 5, TOP_K);

        // rust_dev: 0.7 + 0.3 × 2.5 = 1.45; python_dev: 0.9 + 0.3 × 0 = 0.9
        assert_eq!(ids(&results), vec!["rust_dev", "python_dev"]);
        assert_eq!(results[0].matched_keywords, skills);
        assert!((results[0].score - 1.45).abs() < 1e-9);
        assert!(results[1].matched_keywords.is_empty());
    }

    #[test]
    fn test_education_funnel_ranks_only_matching_candidates() {
        let pool = vec![
            candidate("bachelor_only", "Education\nBTech CSE 2019", 0.05),
            candidate("phd_holder", "Education\nPhD Physics\nBSc Physics", 0.4),
            candidate("self_taught", "Rust engineer", 0.1),
        ];
        let ranking = rerank_education(pool, &[EducationLevel::Phd], TOP_K);

        assert_eq!(ranking.match_mode, MatchMode::KeywordMatch);
        assert_eq!(ranking.matched_count, 1);
        assert_eq!(ids(&ranking.results), vec!["phd_holder"]);
        assert_eq!(ranking.results[0].matched_keywords, vec!["phd".to_string()]);
        // 0.6 + 0.4 × 1.0
        assert!((ranking.results[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_education_funnel_falls_back_to_full_pool() {
        let pool = vec![
            candidate("a", "Rust engineer", 0.3),
            candidate("b", "Go engineer", 0.1),
            candidate("c", "Education\nBTech CSE", 0.2),
        ];
        let ranking = rerank_education(pool, &[EducationLevel::Phd], TOP_K);

        assert_eq!(ranking.match_mode, MatchMode::SemanticFallback);
        assert_eq!(ranking.matched_count, 0);
        assert_eq!(ids(&ranking.results), vec!["b", "c", "a"]);
        assert!(ranking.results.iter().all(|r| r.matched_keywords.is_empty()));
    }

    #[test]
    fn test_education_filter_follows_requested_levels() {
        // Nobody holds a PhD, so [phd] falls back to the semantic order. Adding masters
        // lets the MBA holder through the filter with confidence 1.0.
        let pool = vec![
            candidate("close", "Rust engineer", 0.1),
            candidate("m", "Education\nMBA Wharton", 0.5),
        ];
        let ranking = rerank_education(pool.clone(), &[EducationLevel::Phd], TOP_K);
        assert_eq!(ranking.match_mode, MatchMode::SemanticFallback);
        assert_eq!(ids(&ranking.results), vec!["close", "m"]);

        let ranking = rerank_education(
            pool,
            &[EducationLevel::Phd, EducationLevel::Masters],
            TOP_K,
        );
        assert_eq!(ranking.match_mode, MatchMode::KeywordMatch);
        assert_eq!(ids(&ranking.results), vec!["m"]);
        // 0.5 + 0.4 × 1.0
        assert!((ranking.results[0].score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_education_empty_pool_is_empty_fallback() {
        let ranking = rerank_education(vec![], &[EducationLevel::Masters], TOP_K);
        assert_eq!(ranking.match_mode, MatchMode::SemanticFallback);
        assert!(ranking.results.is_empty());
    }

    #[test]
    fn test_query_kind_serde() {
        assert_eq!(
            serde_json::to_string(&QueryKind::JobDescription).unwrap(),
            "\"job_description\""
        );
        assert_eq!(
            serde_json::to_string(&MatchMode::SemanticFallback).unwrap(),
            "\"semantic_fallback\""
        );
    }
}
