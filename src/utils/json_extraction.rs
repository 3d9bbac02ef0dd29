//! JSON recovery utilities for parsing LLM responses.
//!
//! Model output frequently arrives wrapped in markdown code fences, or cut
//! short when the model reaches its output-token limit mid-structure. This
//! module turns such text into a string that is as close as possible to a
//! syntactically complete JSON document.
//!
//! # Recovery Steps
//!
//! 1. Extract the first fenced block (```json ... ```), or strip all fences
//! 2. If the text does not end in '}' or ']', treat it as truncated:
//!    drop incomplete trailing elements, then close every open scope
//! 3. Strip leftover leading/trailing backticks
//!
//! Nothing here fails: the best-effort string is always returned and the
//! caller reports the failure when decoding.
//!
//! # Example
//!
//! ```
//! use symptom_intake::utils::json_extraction::recover_json_text;
//!
//! let response = "```json\n{\"questions\": {\"multiple_choice\": [\"Fever";
//! let recovered = recover_json_text(response);
//! assert!(serde_json::from_str::<serde_json::Value>(&recovered).is_ok());
//! ```

use regex::Regex;
use tracing::{debug, warn};

/// Opening fence (optionally tagged `json`), a newline, then the block body.
const FENCED_BLOCK_PATTERN: &str = r"```(?:json)?\s*\n([\s\S]*?)```";

/// Truncation repairs, applied in order to the tail of the text.
const TRUNCATION_REPAIRS: [(&str, &str); 4] = [
    // Trailing incomplete string after a comma: ["a", "b", "inc
    (r#",\s*"[^"]*$"#, ""),
    // Trailing bare comma
    (r",\s*$", ""),
    // Unterminated property value: "key": "partial
    (r#":\s*"[^"]*$"#, r#": """#),
    // Property with no value at all: "key":
    (r":\s*$", r#": """#),
];

/// Analysis result for JSON structure
#[derive(Debug, Clone, PartialEq)]
pub struct JsonStructureAnalysis {
    /// Number of unclosed braces ('{' without matching '}')
    pub unclosed_braces: usize,
    /// Number of unclosed brackets ('[' without matching ']')
    pub unclosed_brackets: usize,
    /// Whether we ended inside a string literal
    pub in_string: bool,
    /// Byte offset of an escape sequence cut off at the end of input
    /// (a lone `\` or an incomplete `\uXXXX`)
    pub dangling_escape: Option<usize>,
    /// Scopes still open at the end of input, outermost first
    pub open_scopes: Vec<char>,
    /// False if a closer ever failed to match the innermost open scope
    pub consistent_nesting: bool,
}

/// Analyzes JSON structure to determine which scopes remain open.
///
/// Delimiters inside string literals are ignored, and escape sequences
/// inside strings are skipped.
///
/// # Arguments
///
/// * `s` - The string to analyze
///
/// # Returns
///
/// A `JsonStructureAnalysis` with details about unclosed braces/brackets
pub fn analyze_json_structure(s: &str) -> JsonStructureAnalysis {
    let mut brace_depth: isize = 0;
    let mut bracket_depth: isize = 0;
    let mut in_string = false;
    let mut escape_start: Option<usize> = None;
    let mut unicode_digits_left = 0u8;
    let mut open_scopes: Vec<char> = Vec::new();
    let mut consistent_nesting = true;

    for (i, c) in s.char_indices() {
        if unicode_digits_left > 0 {
            if c.is_ascii_hexdigit() {
                unicode_digits_left -= 1;
                if unicode_digits_left == 0 {
                    escape_start = None;
                }
                continue;
            }
            // Malformed \u escape: resume normal scanning at this char.
            unicode_digits_left = 0;
            escape_start = None;
        } else if escape_start.is_some() {
            if c == 'u' {
                unicode_digits_left = 4;
            } else {
                escape_start = None;
            }
            continue;
        }

        match c {
            '\\' if in_string => {
                escape_start = Some(i);
            }
            '"' => {
                in_string = !in_string;
            }
            '{' | '[' if !in_string => {
                if c == '{' {
                    brace_depth += 1;
                } else {
                    bracket_depth += 1;
                }
                open_scopes.push(c);
            }
            '}' | ']' if !in_string => {
                if c == '}' {
                    brace_depth -= 1;
                } else {
                    bracket_depth -= 1;
                }
                let opener = if c == '}' { '{' } else { '[' };
                if open_scopes.last() == Some(&opener) {
                    open_scopes.pop();
                } else {
                    consistent_nesting = false;
                }
            }
            _ => {}
        }
    }

    JsonStructureAnalysis {
        unclosed_braces: brace_depth.max(0) as usize,
        unclosed_brackets: bracket_depth.max(0) as usize,
        in_string,
        dangling_escape: escape_start,
        open_scopes,
        consistent_nesting,
    }
}

/// Returns true if the text looks cut off mid-structure.
///
/// Complete responses for both schemas end in '}' (or ']' for a bare array).
pub fn is_likely_truncated(s: &str) -> bool {
    let trimmed = s.trim();
    !trimmed.ends_with('}') && !trimmed.ends_with(']')
}

/// Extract the interior of the first markdown code fence.
///
/// Falls back to removing every fence marker when no complete fenced block
/// is found, which covers responses with a dangling opening or closing fence.
///
/// # Arguments
///
/// * `content` - Trimmed model output
///
/// # Returns
///
/// The unfenced, trimmed text. Content without backtick fences is returned
/// unchanged.
pub fn strip_code_fences(content: &str) -> String {
    if !content.contains("```") {
        return content.to_string();
    }

    if let Ok(re) = Regex::new(FENCED_BLOCK_PATTERN) {
        if let Some(body) = re.captures(content).and_then(|caps| caps.get(1)) {
            if !body.as_str().is_empty() {
                return body.as_str().trim().to_string();
            }
        }
    }

    debug!("No complete fenced block found, removing all fence markers");
    let mut stripped = content.to_string();
    for pattern in [r"```json\s*", r"```\s*"] {
        if let Ok(re) = Regex::new(pattern) {
            stripped = re.replace_all(&stripped, "").into_owned();
        }
    }
    stripped.trim().to_string()
}

/// Computes the characters needed to close every scope left open in `s`.
///
/// When nesting is consistent the open scopes are closed innermost first,
/// after terminating a dangling string literal. Otherwise brackets are
/// balanced by count: all missing ']' first, then all missing '}'.
///
/// A cut-off escape sequence at the end of `s` would swallow the closing
/// quote; [`repair_truncated_json`] removes it before calling this.
pub fn closing_sequence(s: &str) -> String {
    let analysis = analyze_json_structure(s);

    if analysis.consistent_nesting {
        let mut closers = String::with_capacity(analysis.open_scopes.len() + 1);
        if analysis.in_string {
            closers.push('"');
        }
        for scope in analysis.open_scopes.iter().rev() {
            closers.push(if *scope == '{' { '}' } else { ']' });
        }
        return closers;
    }

    let mut closers = "]".repeat(analysis.unclosed_brackets);
    closers.push_str(&"}".repeat(analysis.unclosed_braces));
    closers
}

/// Repairs a truncated JSON document.
///
/// Drops the incomplete trailing element (a partial array string, a
/// dangling comma, a partial or missing property value) and any escape
/// sequence cut off mid-string, then appends the closers for every scope
/// still open.
///
/// # Arguments
///
/// * `s` - Unfenced JSON text that does not end in '}' or ']'
///
/// # Returns
///
/// The repaired text. It is not guaranteed to decode.
pub fn repair_truncated_json(s: &str) -> String {
    let mut repaired = s.to_string();

    for (pattern, replacement) in TRUNCATION_REPAIRS {
        if let Ok(re) = Regex::new(pattern) {
            repaired = re.replace(&repaired, replacement).into_owned();
        }
    }

    if let Some(offset) = analyze_json_structure(&repaired).dangling_escape {
        debug!(offset, "Dropped incomplete escape sequence");
        repaired.truncate(offset);
    }

    let closers = closing_sequence(&repaired);
    if !closers.is_empty() {
        let brackets = closers.chars().filter(|c| *c == ']').count();
        let braces = closers.chars().filter(|c| *c == '}').count();
        debug!(brackets, braces, "Added missing closing delimiters");
        repaired.push_str(&closers);
    }

    repaired
}

/// Produces the best-effort JSON text for a raw model response.
///
/// This is the entry point for fence and truncation recovery. The result is
/// handed to the control-character sanitizer and then decoded.
pub fn recover_json_text(content: &str) -> String {
    let mut json = strip_code_fences(content.trim());

    if is_likely_truncated(&json) {
        warn!(
            len = json.len(),
            "JSON appears to be truncated, attempting repair"
        );
        json = repair_truncated_json(&json);
    }

    json.trim_matches('`').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decodes(s: &str) -> bool {
        serde_json::from_str::<serde_json::Value>(s).is_ok()
    }

    #[test]
    fn test_json_code_block() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_generic_code_block() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_first_fenced_block_wins() {
        let input = "```json\n{\"a\": 1}\n```\ntext\n```json\n{\"b\": 2}\n```";
        assert_eq!(strip_code_fences(input), r#"{"a": 1}"#);
    }

    #[test]
    fn test_fence_without_newline_falls_back_to_stripping() {
        let input = r#"```json {"key": "value"}```"#;
        assert_eq!(strip_code_fences(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_dangling_opening_fence_is_stripped() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_code_fences(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_unfenced_content_unchanged() {
        let input = r#"{"key": "value"}"#;
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_is_likely_truncated() {
        assert!(!is_likely_truncated(r#"{"a": 1}"#));
        assert!(!is_likely_truncated("[1, 2]\n"));
        assert!(is_likely_truncated(r#"{"a": "b"#));
        assert!(is_likely_truncated(r#"{"a": 1,"#));
    }

    #[test]
    fn test_analyze_json_structure() {
        let complete = r#"{"key": "value"}"#;
        let analysis = analyze_json_structure(complete);
        assert_eq!(analysis.unclosed_braces, 0);
        assert_eq!(analysis.unclosed_brackets, 0);
        assert!(!analysis.in_string);
        assert!(analysis.dangling_escape.is_none());
        assert!(analysis.open_scopes.is_empty());

        let mid_string = r#"{"items": [{"key": "val"#;
        let analysis = analyze_json_structure(mid_string);
        assert_eq!(analysis.unclosed_braces, 2);
        assert_eq!(analysis.unclosed_brackets, 1);
        assert!(analysis.in_string);
        assert_eq!(analysis.open_scopes, vec!['{', '[', '{']);
        assert!(analysis.consistent_nesting);
    }

    #[test]
    fn test_analyze_ignores_delimiters_in_strings() {
        let input = r#"{"note": "use [brackets] and {braces}", "x": "a \" ["#;
        let analysis = analyze_json_structure(input);
        assert_eq!(analysis.open_scopes, vec!['{']);
        assert!(analysis.in_string);
    }

    #[test]
    fn test_closing_sequence_innermost_first() {
        let input = r#"{"q": {"mc": [{"options": ["Yes", "No""#;
        assert_eq!(closing_sequence(input), "]}]}}");
    }

    #[test]
    fn test_closing_sequence_count_fallback() {
        // Stray '}' breaks nesting: fall back to brackets then braces.
        let input = r#"{"a": [1, 2}, "b": ["#;
        let analysis = analyze_json_structure(input);
        assert!(!analysis.consistent_nesting);
        assert_eq!(closing_sequence(input), "]]");
    }

    #[test]
    fn test_count_fallback_ignores_delimiters_in_strings() {
        let input = r#"{"a": [1}, "b": ["x]", "#;
        let analysis = analyze_json_structure(input);
        assert!(!analysis.consistent_nesting);
        assert_eq!(analysis.unclosed_brackets, 2);
        assert_eq!(analysis.unclosed_braces, 0);
        assert_eq!(closing_sequence(input), "]]");
    }

    #[test]
    fn test_analyze_dangling_escape() {
        let analysis = analyze_json_structure(r#"["C:\"#);
        assert!(analysis.in_string);
        assert_eq!(analysis.dangling_escape, Some(4));

        let analysis = analyze_json_structure(r#"["caf\u00"#);
        assert_eq!(analysis.dangling_escape, Some(5));

        // Complete escapes leave nothing pending.
        for input in [r#"["a\n"#, r#"["caf\u00e9"#, r#"["say \"hi"#] {
            let analysis = analyze_json_structure(input);
            assert!(analysis.in_string, "{}", input);
            assert!(analysis.dangling_escape.is_none(), "{}", input);
        }
    }

    #[test]
    fn test_repair_drops_cut_off_backslash() {
        let repaired = repair_truncated_json(r#"["C:\"#);
        assert_eq!(repaired, r#"["C:"]"#);
        assert!(decodes(&repaired));
    }

    #[test]
    fn test_repair_drops_partial_unicode_escape() {
        let repaired = repair_truncated_json(r#"["caf\u00"#);
        assert_eq!(repaired, r#"["caf"]"#);
        assert!(decodes(&repaired));
    }

    #[test]
    fn test_repair_keeps_complete_escapes() {
        let repaired = repair_truncated_json(r#"[{"path": "C:\\temp", "k": 1}, ["caf\u00e9"#);
        assert_eq!(repaired, r#"[{"path": "C:\\temp", "k": 1}, ["caf\u00e9"]]"#);
        assert!(decodes(&repaired));
    }

    #[test]
    fn test_repair_trailing_incomplete_array_string() {
        let repaired = repair_truncated_json(r#"{"options": ["Yes", "No", "Mayb"#);
        assert_eq!(repaired, r#"{"options": ["Yes", "No"]}"#);
    }

    #[test]
    fn test_repair_trailing_comma() {
        let repaired = repair_truncated_json(r#"{"a": [1, 2, "#);
        assert_eq!(repaired, r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_repair_incomplete_property_value() {
        let repaired = repair_truncated_json(r#"{"note": "partial va"#);
        assert_eq!(repaired, r#"{"note": ""}"#);
        assert!(decodes(&repaired));
    }

    #[test]
    fn test_repair_missing_property_value() {
        let repaired = repair_truncated_json(r#"{"a": 1, "note":"#);
        assert_eq!(repaired, r#"{"a": 1, "note": ""}"#);
    }

    #[test]
    fn test_repair_nested_question_set() {
        let input = r#"{"questions":{"multiple_choice":[{"id":"Q1","question":"Fever?","options":["Yes","No""#;
        let repaired = repair_truncated_json(input);
        assert!(decodes(&repaired), "not valid JSON: {}", repaired);
    }

    #[test]
    fn test_recover_fenced_and_truncated() {
        let input = "```json\n{\"questions\": {\"text_and_numbers\": [{\"id\": \"TN1\", \"question\": \"How many";
        let recovered = recover_json_text(input);
        assert!(decodes(&recovered), "not valid JSON: {}", recovered);
        assert!(!recovered.contains('`'));
    }

    #[test]
    fn test_recover_leaves_complete_json_untouched() {
        let input = "  {\"a\": [1, 2]}  ";
        assert_eq!(recover_json_text(input), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn test_recover_strips_stray_backticks() {
        assert_eq!(recover_json_text(r#"`{"a": 1}`"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_recover_never_panics_on_garbage() {
        for input in ["", "```", "`", "{", "]", ":", ",", "\"", "no json here"] {
            let _ = recover_json_text(input);
        }
    }
}
