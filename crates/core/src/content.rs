//! Content comparison and code-segment counting.

use std::sync::LazyLock;

use regex::Regex;

/// Separators between code segments: blank lines, braces, and common
/// declaration keywords.
const SEGMENT_SPLIT_PATTERN: &str =
    r"\n\s*\n|\{|\}|class |function |def |public |private |protected ";

static SEGMENT_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SEGMENT_SPLIT_PATTERN).expect("valid regex"));

/// Segments shorter than this (after trimming) are not counted.
const MIN_SEGMENT_CHARS: usize = 10;

/// Prefixes marking a segment as a comment or an import line.
const IGNORED_SEGMENT_PREFIXES: &[&str] =
    &["//", "/*", "*", "#", "import ", "export ", "from "];

/// Exact content equality: character-identical strings only.
///
/// No normalisation of any kind; a whitespace-only difference is a
/// difference. Returns `false` when either side is absent.
pub fn is_content_exactly_same(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Count code segments in `content`.
///
/// Empty or whitespace-only content has zero segments; anything else has
/// at least one.
pub fn count_code_segments(content: &str) -> u32 {
    if content.trim().is_empty() {
        return 0;
    }

    let valid = SEGMENT_SPLIT_RE
        .split(content)
        .map(str::trim)
        .filter(|segment| segment.chars().count() > MIN_SEGMENT_CHARS)
        .filter(|segment| {
            !IGNORED_SEGMENT_PREFIXES
                .iter()
                .any(|prefix| segment.starts_with(prefix))
        })
        .count();

    valid.max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- is_content_exactly_same --

    #[test]
    fn identical_strings_are_same() {
        assert!(is_content_exactly_same(Some("heal 10"), Some("heal 10")));
        assert!(is_content_exactly_same(Some(""), Some("")));
    }

    #[test]
    fn trailing_whitespace_is_different() {
        assert!(!is_content_exactly_same(Some("heal 10"), Some("heal 10 ")));
        assert!(!is_content_exactly_same(Some("heal 10\n"), Some("heal 10")));
    }

    #[test]
    fn line_ending_difference_is_different() {
        assert!(!is_content_exactly_same(Some("a\r\nb"), Some("a\nb")));
    }

    #[test]
    fn missing_side_is_never_same() {
        assert!(!is_content_exactly_same(None, Some("x")));
        assert!(!is_content_exactly_same(Some("x"), None));
        assert!(!is_content_exactly_same(None, None));
    }

    // -- count_code_segments --

    #[test]
    fn empty_content_has_no_segments() {
        assert_eq!(count_code_segments(""), 0);
        assert_eq!(count_code_segments("   \n\t"), 0);
    }

    #[test]
    fn short_content_counts_as_one() {
        assert_eq!(count_code_segments("x = 1"), 1);
    }

    #[test]
    fn splits_on_functions_and_braces() {
        let code = "function alpha() { let total = compute(1, 2); }\n\n\
                    function beta() { let other = compute(3, 4); }";
        assert_eq!(count_code_segments(code), 2);
    }

    #[test]
    fn comment_and_import_segments_are_ignored() {
        let code = "import something from 'module-name'\n\n// a long comment line here\n\n\
                    let value = computeSomething();";
        assert_eq!(count_code_segments(code), 1);
    }
}
