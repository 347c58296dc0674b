//! Text Normalizer — canonical form for indexed resume and note text.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s.,]").unwrap());

/// Number of words kept in a result preview.
const PREVIEW_WORDS: usize = 50;

/// Drops every character that is not a word character, whitespace, `.` or `,`, then
/// collapses whitespace runs to a single space and trims the result.
pub fn normalize_text(raw: &str) -> String {
    let filtered = DISALLOWED_RE.replace_all(raw, "");
    let collapsed = WHITESPACE_RE.replace_all(&filtered, " ");
    collapsed.trim().to_string()
}

/// First 50 words of a document followed by an ellipsis.
pub fn preview(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().take(PREVIEW_WORDS).collect();
    format!("{}...", words.join(" "))
}

/// Display name derived from a filename-based document id.
///
/// "Mohammed Idris_Data Engineer_cleaned.txt" → "Mohammed Idris"
pub fn display_name_from_id(id: &str) -> String {
    let stem = file_stem(id);
    stem.split('_').next().unwrap_or(stem).trim().to_string()
}

/// Filename without its final extension.
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}
