//! Statute section references found in retrieved context

use regex::Regex;
use std::sync::OnceLock;

fn section_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"(?i)\b(?:section|sec\.?)\s*(\d+[A-Z]?)\b")
                .map_err(|e| tracing::error!("Invalid section pattern: {}", e))
                .ok()
        })
        .as_ref()
}

/// Section identifiers ("Section 302", "Section 124A") in first-seen order
///
/// Matches both "Section 302" and the abbreviated "Sec. 124A"; each
/// identifier is reported once, normalized to "Section N".
pub fn section_references(passages: &[&str]) -> Vec<String> {
    let Some(pattern) = section_pattern() else {
        return Vec::new();
    };

    let mut references: Vec<String> = Vec::new();
    for passage in passages {
        for capture in pattern.captures_iter(passage) {
            if let Some(number) = capture.get(1) {
                let reference = format!("Section {}", number.as_str().to_uppercase());
                if !references.contains(&reference) {
                    references.push(reference);
                }
            }
        }
    }
    references
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_and_normalizes() {
        let refs = section_references(&[
            "Section 302: punishment for murder. See also sec. 304.",
            "SECTION 124a deals with sedition; Sec 302 again.",
        ]);
        assert_eq!(refs, vec!["Section 302", "Section 304", "Section 124A"]);
    }

    #[test]
    fn test_no_sections() {
        assert!(section_references(&["Chapter XVI: offences affecting the human body"]).is_empty());
        assert!(section_references(&[]).is_empty());
    }
}
