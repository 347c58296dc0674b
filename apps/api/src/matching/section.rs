//! Section Extractor: isolates the education block of a resume by header keywords.

/// A line containing any of these opens the education section.
const EDUCATION_HEADERS: &[&str] = &[
    "education",
    "qualification",
    "degree",
    "academic",
    "university",
    "college",
    "institute",
    "school",
];

/// The first line after the opening line containing any of these closes the section.
const CLOSING_HEADERS: &[&str] = &[
    "experience",
    "work history",
    "professional experience",
    "skills",
    "projects",
    "certification",
    "achievements",
];

/// Returns the education section of `text`, or an empty string when no header is found.
///
/// The section starts at the first line mentioning an education keyword and runs up to,
/// but not including, the next line mentioning a closing header. Without a closing header
/// it runs to the end of the document. Matching is case-insensitive substring matching.
pub fn extract_education_section(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();

    let Some(start) = lines.iter().position(|line| contains_any(line, EDUCATION_HEADERS)) else {
        return String::new();
    };

    let end = lines[start + 1..]
        .iter()
        .position(|line| contains_any(line, CLOSING_HEADERS))
        .map(|offset| start + 1 + offset)
        .unwrap_or(lines.len());

    lines[start..end].join("\n")
}

fn contains_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}
