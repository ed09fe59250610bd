//! Payload isolation: find the structured span inside free-form model output.
//!
//! ## Why scan instead of parse?
//!
//! Generation responses arrive as prose with the JSON payload embedded
//! somewhere in the middle — "Sure! Here is your guide: {...} Hope that
//! helps!", often wrapped in ` ```json ` fences. The payload boundary is a
//! purely *syntactic* question, answered here without a JSON parser: scan for
//! the first balanced span of the expected delimiter kind, skipping
//! delimiters that occur inside string literals.
//!
//! Two tempting shortcuts are deliberately avoided:
//!
//! - **First-open-to-last-close slicing** (`text.find('{')` ..
//!   `text.rfind('}')`): a stray `}` in trailing prose would be swallowed
//!   into the span and poison the parse.
//! - **Regex**: regular expressions cannot match arbitrarily nested
//!   delimiters.
//!
//! Whether the isolated span is *valid* JSON of the right shape is the next
//! stage's problem ([`crate::pipeline::generate`]); this module only answers
//! "where does the payload start and end".

use std::fmt;

use crate::progress::PipelineStage;

/// Which structured payload a generation call is expected to produce.
///
/// Determines both the delimiter pair the scanner looks for and the stage an
/// error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// A study guide: the first balanced `{...}` object span.
    StudyGuide,
    /// A recommendation list: the first balanced `[...]` array span.
    VideoList,
}

impl PayloadKind {
    /// Stable key for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StudyGuide => "study-guide",
            Self::VideoList => "video-list",
        }
    }

    /// The stage during which this payload is produced.
    pub(crate) fn stage(self) -> PipelineStage {
        match self {
            Self::StudyGuide => PipelineStage::GeneratingGuide,
            Self::VideoList => PipelineStage::GeneratingVideos,
        }
    }

    fn delimiters(self) -> (u8, u8) {
        match self {
            Self::StudyGuide => (b'{', b'}'),
            Self::VideoList => (b'[', b']'),
        }
    }
}

// Human-readable phrase for error messages ("No study guide payload found…").
impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phrase = match self {
            Self::StudyGuide => "study guide",
            Self::VideoList => "video list",
        };
        f.write_str(phrase)
    }
}

/// Locate the first balanced span of `kind`'s delimiters in `response`.
///
/// Returns the span including both delimiters, or `None` when no candidate
/// opener ever balances. Each candidate opener gets a fresh scan, so a
/// truncated early candidate (an opener that never closes, e.g. from a
/// cut-off response) does not hide a later complete span.
///
/// Only the target delimiter family is counted: a `]` inside an object span
/// is ordinary content, and vice versa. Delimiters inside string literals are
/// skipped, including after escaped quotes (`\"`).
pub fn extract_balanced_span(response: &str, kind: PayloadKind) -> Option<&str> {
    let (open, close) = kind.delimiters();
    let bytes = response.as_bytes();
    let mut search_from = 0;

    while let Some(rel) = response[search_from..].find(open as char) {
        let start = search_from + rel;
        if let Some(end) = balancing_close(bytes, start, open, close) {
            return Some(&response[start..=end]);
        }
        search_from = start + 1;
    }
    None
}

/// Index of the close byte balancing the opener at `start`, if any.
///
/// All tracked bytes (delimiters, `"`, `\`) are ASCII, so a byte walk is
/// safe on UTF-8 input and every returned index is a char boundary.
fn balancing_close(bytes: &[u8], start: usize, open: u8, close: u8) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        if b == b'"' {
            in_string = true;
        } else if b == open {
            depth += 1;
        } else if b == close {
            // The walk starts on an opener, so depth is ≥ 1 here.
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let span = extract_balanced_span(r#"{"title":"T","sections":[]}"#, PayloadKind::StudyGuide);
        assert_eq!(span, Some(r#"{"title":"T","sections":[]}"#));
    }

    #[test]
    fn test_object_with_surrounding_prose() {
        let response = r#"Here is your study guide: {"title":"T","sections":[]} Let me know!"#;
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(span, Some(r#"{"title":"T","sections":[]}"#));
    }

    #[test]
    fn test_stray_close_in_trailing_prose_is_excluded() {
        // A first-{-to-last-} slice would include the stray brace.
        let response = r#"{"title":"T","sections":[]} ...and that's a wrap }"#;
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(span, Some(r#"{"title":"T","sections":[]}"#));
    }

    #[test]
    fn test_array_inside_json_fence() {
        let response = "Sure! ```json\n[ {\"title\":\"A\",\"description\":\"d\",\"topicOrder\":1} ]\n``` Hope that helps!";
        let span = extract_balanced_span(response, PayloadKind::VideoList).unwrap();
        assert!(span.starts_with('['));
        assert!(span.ends_with(']'));
        assert!(span.contains("\"topicOrder\":1"));
    }

    #[test]
    fn test_nested_structures() {
        let response = r#"{"a":{"b":[1,2,{"c":3}]},"d":"e"} trailing"#;
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(span, Some(r#"{"a":{"b":[1,2,{"c":3}]},"d":"e"}"#));
    }

    #[test]
    fn test_delimiters_inside_strings_are_skipped() {
        let response = r#"{"title":"Use {braces} and ]brackets[ wisely","sections":[]}"#;
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(span, Some(response));
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let response = r#"{"title":"She said \"use {}\" twice","sections":[]} done"#;
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(
            span,
            Some(r#"{"title":"She said \"use {}\" twice","sections":[]}"#)
        );
    }

    #[test]
    fn test_unclosed_candidate_does_not_hide_later_span() {
        // The first '{' never balances; the scanner must fall through to the
        // complete object that follows.
        let response = r#"{ this one never closes... but {"title":"T"} is fine"#;
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(span, Some(r#"{"title":"T"}"#));
    }

    #[test]
    fn test_kind_mismatch_finds_nothing() {
        let response = r#"[1, 2, 3]"#;
        assert_eq!(extract_balanced_span(response, PayloadKind::StudyGuide), None);
    }

    #[test]
    fn test_no_payload_at_all() {
        assert_eq!(
            extract_balanced_span("I cannot help with that.", PayloadKind::VideoList),
            None
        );
        assert_eq!(extract_balanced_span("", PayloadKind::StudyGuide), None);
    }

    #[test]
    fn test_truncated_response() {
        let response = r#"{"title":"T","sections":[{"sectionTitle":"W1""#;
        assert_eq!(extract_balanced_span(response, PayloadKind::StudyGuide), None);
    }

    #[test]
    fn test_array_span_ignores_brace_family() {
        // Braces are content when scanning for an array.
        let response = r#"noise } here [ {"t":1}, {"t":2} ] tail"#;
        let span = extract_balanced_span(response, PayloadKind::VideoList);
        assert_eq!(span, Some(r#"[ {"t":1}, {"t":2} ]"#));
    }

    #[test]
    fn test_multibyte_text_around_payload() {
        let response = "Voilà — votre guide : {\"title\":\"Été\",\"sections\":[]} 🎓";
        let span = extract_balanced_span(response, PayloadKind::StudyGuide);
        assert_eq!(span, Some("{\"title\":\"Été\",\"sections\":[]}"));
    }

    #[test]
    fn test_kind_metadata() {
        assert_eq!(PayloadKind::StudyGuide.as_str(), "study-guide");
        assert_eq!(PayloadKind::VideoList.to_string(), "video list");
        assert_eq!(
            PayloadKind::VideoList.stage(),
            PipelineStage::GeneratingVideos
        );
    }
}
