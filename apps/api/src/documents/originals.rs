//! Maps cleaned-text document ids back to the resume files they were extracted from.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::matching::normalize::file_stem;

static CLEANED_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)_cleaned$").unwrap());
static HIRESIGHT_CLEANED_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)_hiresight_cleaned$").unwrap());

const ORIGINAL_EXTENSIONS: [&str; 2] = [".pdf", ".docx"];

/// Bases to try, most specific first.
///
/// "Jane Doe_Data Engineer_cleaned.txt" gives "Jane Doe_Data Engineer" and the full stem.
/// Only the `_HireSight_cleaned` tag written by the cleaning tool is special: "X_HireSight_cleaned"
/// gives "X_HireSight", then "X", then the full stem.
fn candidate_bases(cleaned_id: &str) -> Vec<String> {
    let stem = file_stem(cleaned_id);
    let tagged = HIRESIGHT_CLEANED_SUFFIX_RE.replace(stem, "_HireSight");
    let mut bases = Vec::with_capacity(3);
    for base in [
        CLEANED_SUFFIX_RE.replace(&tagged, "").into_owned(),
        HIRESIGHT_CLEANED_SUFFIX_RE.replace(stem, "").into_owned(),
        stem.to_string(),
    ] {
        if !base.is_empty() && !bases.contains(&base) {
            bases.push(base);
        }
    }
    bases
}

fn has_original_extension(name_lower: &str) -> bool {
    ORIGINAL_EXTENSIONS
        .iter()
        .any(|ext| name_lower.ends_with(ext))
}

/// Finds the original `.pdf`/`.docx` for `cleaned_id` among `originals` (file names).
///
/// Exact `base.pdf`/`base.docx` wins, then a case-insensitive match, then the first original
/// whose lowercase stem starts with a base.
pub fn find_original_resume(cleaned_id: &str, originals: &[String]) -> Option<String> {
    let bases = candidate_bases(cleaned_id);
    let lowered: Vec<String> = originals.iter().map(|o| o.to_lowercase()).collect();

    for base in &bases {
        for ext in ORIGINAL_EXTENSIONS {
            let wanted = format!("{base}{ext}");
            if let Some(exact) = originals.iter().find(|o| **o == wanted) {
                return Some(exact.clone());
            }
            let wanted_lower = wanted.to_lowercase();
            if let Some(pos) = lowered.iter().position(|o| *o == wanted_lower) {
                return Some(originals[pos].clone());
            }
        }
    }

    for base in &bases {
        let base_lower = base.to_lowercase();
        for (original, lower) in originals.iter().zip(&lowered) {
            if has_original_extension(lower) && file_stem(lower).starts_with(&base_lower) {
                return Some(original.clone());
            }
        }
    }

    None
}

/// Regular files in the originals folder, sorted by name. A missing folder is empty.
pub async fn list_originals(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Cannot list originals in {}: {e}", dir.display());
            }
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped listing originals in {}: {e}", dir.display());
                break;
            }
        };
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if let (true, Some(name)) = (is_file, entry.file_name().to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    names
}

/// A bare file name, with no directory components.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// `Content-Type` for a served original.
pub fn content_type_for(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".docx") {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    } else if lower.ends_with(".txt") {
        "text/plain; charset=utf-8"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidate_bases() {
        assert_eq!(
            candidate_bases("Jane Doe_Data Engineer_cleaned.txt"),
            vec!["Jane Doe_Data Engineer", "Jane Doe_Data Engineer_cleaned"]
        );
        assert_eq!(
            candidate_bases("Jane Doe_hiresight_cleaned.txt"),
            vec!["Jane Doe_HireSight", "Jane Doe", "Jane Doe_hiresight_cleaned"]
        );
    }

    #[test]
    fn test_exact_match_wins() {
        let originals = names(&["jane doe.pdf", "Jane Doe.pdf", "Jane Doe.docx"]);
        assert_eq!(
            find_original_resume("Jane Doe_cleaned.txt", &originals),
            Some("Jane Doe.pdf".to_string())
        );
    }

    #[test]
    fn test_case_insensitive_match() {
        let originals = names(&["JANE DOE.DOCX"]);
        assert_eq!(
            find_original_resume("Jane Doe_cleaned.txt", &originals),
            Some("JANE DOE.DOCX".to_string())
        );
    }

    #[test]
    fn test_hiresight_tag_is_kept_then_stripped() {
        let originals = names(&["Jane Doe_HireSight.pdf", "Jane Doe.pdf"]);
        assert_eq!(
            find_original_resume("Jane Doe_HireSight_cleaned.txt", &originals),
            Some("Jane Doe_HireSight.pdf".to_string())
        );

        let originals = names(&["Jane Doe.docx"]);
        assert_eq!(
            find_original_resume("Jane Doe_HireSight_cleaned.txt", &originals),
            Some("Jane Doe.docx".to_string())
        );
    }

    #[test]
    fn test_other_tags_are_not_stripped() {
        let originals = names(&["Jane Doe.pdf", "Jane Doe_Data Engineer_v2.pdf"]);
        assert_eq!(
            find_original_resume("Jane Doe_Data Engineer_cleaned.txt", &originals),
            Some("Jane Doe_Data Engineer_v2.pdf".to_string())
        );
    }

    #[test]
    fn test_prefix_fallback_ignores_other_extensions() {
        let originals = names(&["Jane Doe_v2.txt", "Jane Doe_v2.pdf"]);
        assert_eq!(
            find_original_resume("Jane Doe_cleaned.txt", &originals),
            Some("Jane Doe_v2.pdf".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        let originals = names(&["John Smith.pdf"]);
        assert_eq!(find_original_resume("Jane Doe_cleaned.txt", &originals), None);
    }

    #[test]
    fn test_plain_file_names() {
        assert!(is_plain_file_name("Jane Doe.pdf"));
        assert!(!is_plain_file_name("../secrets.pdf"));
        assert!(!is_plain_file_name("a/b.pdf"));
        assert!(!is_plain_file_name(".."));
        assert!(!is_plain_file_name(""));
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.PDF"), "application/pdf");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_list_originals_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.path().join("a.docx"), b"PK").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(list_originals(dir.path()).await, vec!["a.docx", "b.pdf"]);
        assert!(list_originals(&dir.path().join("missing")).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_originals_of_a_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Jane Doe.pdf");
        std::fs::write(&file, b"%PDF").unwrap();

        assert!(list_originals(&file).await.is_empty());
    }
}
