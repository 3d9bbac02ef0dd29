//! Escaping of raw control characters inside JSON string literals.
//!
//! Models often emit literal newlines or tabs inside string values, which
//! the JSON grammar forbids. Structural whitespace between tokens is left
//! alone; only characters inside string literals are rewritten.

use tracing::{debug, warn};

/// Characters that may follow a backslash in a valid JSON escape.
const JSON_ESCAPES: [char; 9] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't', 'u'];

/// Returns the two-character escape for a control character, if it has one.
pub fn control_escape(c: char) -> Option<&'static str> {
    match c {
        '\n' => Some("\\n"),
        '\r' => Some("\\r"),
        '\t' => Some("\\t"),
        '\u{000C}' => Some("\\f"),
        '\u{0008}' => Some("\\b"),
        _ => None,
    }
}

/// Counts the backslashes immediately preceding `index`.
fn preceding_backslashes(chars: &[char], index: usize) -> usize {
    chars[..index]
        .iter()
        .rev()
        .take_while(|c| **c == '\\')
        .count()
}

/// Escapes raw control characters that appear inside string literals.
///
/// Input that already decodes is returned unchanged. Otherwise the text is
/// scanned once, tracking whether the cursor is inside a string literal:
/// - `\n`, `\r`, `\t`, form feed and backspace inside strings are escaped
/// - any other control character inside strings is dropped
/// - existing escape sequences are copied through verbatim
///
/// If the input ends inside a string literal a closing quote is appended.
///
/// # Arguments
///
/// * `json` - Nearly-complete JSON text
///
/// # Returns
///
/// The sanitized text. It is not guaranteed to decode.
pub fn escape_control_characters(json: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(_) => return json.to_string(),
        Err(e) => debug!(error = %e, "Cleaning control characters from JSON"),
    }

    let chars: Vec<char> = json.chars().collect();
    let mut cleaned = String::with_capacity(json.len() + 16);
    let mut in_string = false;
    let mut escaped = 0usize;
    let mut dropped = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && in_string {
            if let Some(&next) = chars.get(i + 1) {
                if JSON_ESCAPES.contains(&next) {
                    cleaned.push(c);
                    cleaned.push(next);
                    i += 2;
                    continue;
                }
            }
        }

        if c == '"' {
            if preceding_backslashes(&chars, i) % 2 == 0 {
                in_string = !in_string;
            }
            cleaned.push(c);
        } else if in_string && (c as u32) < 0x20 {
            match control_escape(c) {
                Some(escape) => {
                    cleaned.push_str(escape);
                    escaped += 1;
                }
                None => dropped += 1,
            }
        } else {
            cleaned.push(c);
        }

        i += 1;
    }

    debug!(escaped, dropped, "Control characters cleaned");

    if in_string {
        warn!("Unterminated string after cleaning, adding closing quote");
        cleaned.push('"');
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_valid_json_unchanged() {
        let input = "{\n  \"a\": \"line\\nbreak\",\n\t\"b\": [1, 2]\n}";
        assert_eq!(escape_control_characters(input), input);
    }

    #[test]
    fn test_raw_newline_in_string_escaped() {
        let input = "{\"symptoms\": \"fever\nheadache\"}";
        let cleaned = escape_control_characters(input);
        assert_eq!(cleaned, r#"{"symptoms": "fever\nheadache"}"#);

        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["symptoms"], "fever\nheadache");
    }

    #[test]
    fn test_structural_whitespace_preserved() {
        let input = "{\n\t\"a\": \"x\ty\",\r\n  \"b\": \"z\"\n}";
        let cleaned = escape_control_characters(input);
        assert_eq!(cleaned, "{\n\t\"a\": \"x\\ty\",\r\n  \"b\": \"z\"\n}");
    }

    #[test]
    fn test_all_named_escapes() {
        let input = "{\"a\": \"1\r2\u{000C}3\u{0008}4\"}";
        let cleaned = escape_control_characters(input);
        assert_eq!(cleaned, r#"{"a": "1\r2\f3\b4"}"#);
    }

    #[test]
    fn test_other_control_characters_dropped() {
        let input = "{\"a\": \"bell\u{0007}null\u{0000}end\"}";
        let cleaned = escape_control_characters(input);
        assert_eq!(cleaned, r#"{"a": "bellnullend"}"#);
    }

    #[test]
    fn test_existing_escapes_not_doubled() {
        let input = "{\"a\": \"say \\\"hi\\\"\nthen \\\\ done\\u00e9\"}";
        let cleaned = escape_control_characters(input);
        assert_eq!(cleaned, r#"{"a": "say \"hi\"\nthen \\ done\u00e9"}"#);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["a"], "say \"hi\"\nthen \\ doneé");
    }

    #[test]
    fn test_escaped_backslash_before_quote_closes_string() {
        let input = "{\"path\": \"C:\\\\\", \"b\": \"x\ny\"}";
        let cleaned = escape_control_characters(input);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["path"], "C:\\");
        assert_eq!(value["b"], "x\ny");
    }

    #[test]
    fn test_unterminated_string_closed() {
        let input = "{\"a\": \"open\nvalue";
        let cleaned = escape_control_characters(input);
        assert_eq!(cleaned, "{\"a\": \"open\\nvalue\"");
    }

    #[test]
    fn test_non_ascii_preserved() {
        let input = "{\"a\": \"douleur thoracique\n胸痛\"}";
        let cleaned = escape_control_characters(input);
        let value: Value = serde_json::from_str(&cleaned).unwrap();
        assert_eq!(value["a"], "douleur thoracique\n胸痛");
    }

    #[test]
    fn test_control_escape_mapping() {
        assert_eq!(control_escape('\n'), Some("\\n"));
        assert_eq!(control_escape('\t'), Some("\\t"));
        assert_eq!(control_escape('\u{0001}'), None);
        assert_eq!(control_escape('a'), None);
    }
}
