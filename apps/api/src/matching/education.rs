//! Education Matcher — detects degree levels in resume text and resolves conflicts.
//!
//! A resume routinely names several degrees (own degrees, coursework, collaborators,
//! "Institute of Technology" style institution names). Keyword presence alone over-matches,
//! section headers alone under-match. Every level gets a confidence from where its keywords
//! sit relative to the education section, and the hierarchy picks exactly one dominant level.
//!
//! All functions are pure. The pattern table is compiled once and shared read-only.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::matching::section::extract_education_section;

// ────────────────────────────────────────────────────────────────────────────
// Levels
// ────────────────────────────────────────────────────────────────────────────

/// Degree level. Declaration order is the hierarchy: a higher variant wins a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationLevel {
    Bachelors = 1,
    Masters = 2,
    Phd = 3,
}

impl EducationLevel {
    #[cfg(test)]
    pub const ALL: [EducationLevel; 3] = [
        EducationLevel::Phd,
        EducationLevel::Masters,
        EducationLevel::Bachelors,
    ];

    /// Rank in the hierarchy, 1 for bachelors up to 3 for a PhD.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EducationLevel::Bachelors => "bachelors",
            EducationLevel::Masters => "masters",
            EducationLevel::Phd => "phd",
        }
    }
}

impl fmt::Display for EducationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown education level '{}'", self.0)
    }
}

impl FromStr for EducationLevel {
    type Err = UnknownLevel;

    /// Case-insensitive; accepts the singular forms "master" and "bachelor".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "phd" => Ok(EducationLevel::Phd),
            "masters" | "master" => Ok(EducationLevel::Masters),
            "bachelors" | "bachelor" => Ok(EducationLevel::Bachelors),
            _ => Err(UnknownLevel(s.trim().to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pattern table
// ────────────────────────────────────────────────────────────────────────────

// Two-letter abbreviations (m.s., m.e., m.a., b.e., b.a.) need at least the inner dot:
// bare "ms", "me", "ma", "be" and "ba" are ordinary words or product names in resumes.
static PHD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:ph\.?d\.?|doctor of philosophy|doctorate|doctoral|d\.phil|dphil)\b").unwrap()
});

static MASTERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:masters|master's|master of|master degree|m\.s\.?|m\.?tech|m\.?sc|mba|m\.e\.?|mca|m\.?com|m\.a\.?)\b",
    )
    .unwrap()
});

static BACHELORS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:bachelors|bachelor's|bachelor of|bachelor degree|bachelor|b\.e\.?|b\.?tech|b\.?sc|bca|b\.?eng|b\.?com|b\.a\.?)\b",
    )
    .unwrap()
});

fn pattern_for(level: EducationLevel) -> &'static Regex {
    match level {
        EducationLevel::Phd => &PHD_RE,
        EducationLevel::Masters => &MASTERS_RE,
        EducationLevel::Bachelors => &BACHELORS_RE,
    }
}

/// Keywords specific enough to earn the +0.2 confidence bonus.
const STRONG_KEYWORDS: &[&str] = &["phd", "doctorate", "masters", "mba", "btech", "bachelor"];

/// Words in the extracted section that signal it leaked past its boundary.
const LEAKAGE_WORDS: &[&str] = &["experience", "work"];

// Confidence is computed in tenths so the thresholds compare exactly.
const BASE_TENTHS: i32 = 5;
const IN_SECTION_TENTHS: i32 = 3;
const STRONG_KEYWORD_TENTHS: i32 = 2;
const LEAKAGE_PENALTY_TENTHS: i32 = 1;

/// A conflicting level is only chosen over higher ones when its confidence exceeds this.
pub const SELECTION_CUTOFF: f64 = 0.6;

// ────────────────────────────────────────────────────────────────────────────
// Matching
// ────────────────────────────────────────────────────────────────────────────

/// One detected education level for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationMatch {
    pub level: EducationLevel,
    pub confidence: f64,
    /// The extracted education section the confidence was computed against.
    pub context: String,
    /// Matched surface strings (lowercased), in first-occurrence order, without repeats.
    pub keywords_found: Vec<String>,
}

/// Scans `text` for every requested level and returns one match per level whose pattern
/// fired at least once. Order follows `target_levels`; repeated levels are scanned once.
pub fn find_matches(text: &str, target_levels: &[EducationLevel]) -> Vec<EducationMatch> {
    let text_lower = text.to_lowercase();
    let context = extract_education_section(text);
    let section_lower = context.to_lowercase();

    let mut seen = Vec::with_capacity(target_levels.len());
    let mut matches = Vec::new();

    for &level in target_levels {
        if seen.contains(&level) {
            continue;
        }
        seen.push(level);

        let mut keywords_found: Vec<String> = Vec::new();
        for m in pattern_for(level).find_iter(&text_lower) {
            let surface = m.as_str();
            if !keywords_found.iter().any(|k| k == surface) {
                keywords_found.push(surface.to_string());
            }
        }

        if keywords_found.is_empty() {
            continue;
        }

        matches.push(EducationMatch {
            level,
            confidence: confidence(&keywords_found, &section_lower),
            context: context.clone(),
            keywords_found,
        });
    }

    matches
}

/// Confidence that `keywords_found` reflects a real degree, given the lowercased
/// education section.
///
/// 0.5 base, +0.3 if any keyword occurs in the section, +0.2 if any keyword is a strong
/// keyword, −0.1 if the section itself mentions "experience" or "work". Clamped to [0, 1].
pub fn confidence(keywords_found: &[String], education_section: &str) -> f64 {
    let mut tenths = BASE_TENTHS;

    if keywords_found
        .iter()
        .any(|k| education_section.contains(k.as_str()))
    {
        tenths += IN_SECTION_TENTHS;
    }

    if keywords_found
        .iter()
        .any(|k| STRONG_KEYWORDS.contains(&k.as_str()))
    {
        tenths += STRONG_KEYWORD_TENTHS;
    }

    if LEAKAGE_WORDS.iter().any(|w| education_section.contains(w)) {
        tenths -= LEAKAGE_PENALTY_TENTHS;
    }

    f64::from(tenths.clamp(0, 10)) / 10.0
}

/// The single dominant education level in `text`, if any.
///
/// With several candidate levels the highest level whose confidence exceeds
/// [`SELECTION_CUTOFF`] wins; when none does, the highest level wins regardless.
pub fn highest(text: &str, target_levels: &[EducationLevel]) -> Option<EducationMatch> {
    let mut matches = find_matches(text, target_levels);
    if matches.len() <= 1 {
        return matches.pop();
    }

    matches.sort_by_key(|m| Reverse(m.level.ordinal()));
    let chosen = matches
        .iter()
        .position(|m| m.confidence > SELECTION_CUTOFF)
        .unwrap_or(0);

    Some(matches.swap_remove(chosen))
}

/// True when the dominant level of `text` is one of `target_levels`.
pub fn matches_any(text: &str, target_levels: &[EducationLevel]) -> bool {
    highest(text, target_levels)
        .map(|m| target_levels.contains(&m.level))
        .unwrap_or(false)
}
