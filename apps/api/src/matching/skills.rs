//! Skill/Experience Scorer: literal skill hits plus a stated-experience bonus.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static YEARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:\+?\s*)?(?:years|yrs|year)\b").unwrap());

static FIRST_INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

const SKILL_HIT: f64 = 1.0;
const EXPERIENCE_BONUS: f64 = 0.5;

/// Heuristic score for one document against a skills query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillScore {
    /// Unbounded: one point per skill hit plus the experience bonus.
    pub score: f64,
    /// Required skills (as given by the caller) found in the text.
    pub matched_skills: Vec<String>,
    /// Largest "N years" figure stated anywhere in the text; 0 when none.
    pub stated_years: u32,
}

/// Scores `text` against `required_skills` and `min_years`.
///
/// Each skill whose lowercase form is a substring of the lowercase text adds 1.0. No
/// stemming or synonyms: "postgres" does not match "PostgreSQL" the other way round.
/// When the largest stated years figure is at least `min_years`, 0.5 is added.
pub fn score(text: &str, required_skills: &[String], min_years: u32) -> SkillScore {
    let text_lower = text.to_lowercase();

    let matched_skills: Vec<String> = required_skills
        .iter()
        .filter(|skill| text_lower.contains(&skill.to_lowercase()))
        .cloned()
        .collect();

    let stated_years = max_stated_years(&text_lower);

    let mut total = SKILL_HIT * matched_skills.len() as f64;
    if stated_years >= min_years {
        total += EXPERIENCE_BONUS;
    }

    SkillScore {
        score: total,
        matched_skills,
        stated_years,
    }
}

/// Largest integer appearing as "N years", "N+ yrs", "N year" etc. Figures that do not
/// fit in a `u32` are ignored.
pub fn max_stated_years(text: &str) -> u32 {
    YEARS_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// First integer in a free-text years field ("5+ years" → 5). Anything unparsable is 0.
pub fn parse_min_years(input: &str) -> u32 {
    FIRST_INT_RE
        .find(input)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(0)
}
