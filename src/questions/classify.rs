//! Keyword heuristics used to pick widgets for generated questions.
//!
//! All matching is case-insensitive substring matching on the question text.

use serde::{Deserialize, Serialize};

use super::types::InputType;

const DATE_KEYWORDS: &[&str] = &["date", "when did"];
const TIME_KEYWORDS: &[&str] = &["time", "what time"];
const NUMBER_KEYWORDS: &[&str] = &["how many", "number of", "frequency", "age", "count", "rate"];
const TEXTAREA_KEYWORDS: &[&str] = &["describe", "explain"];
const MULTI_SELECT_KEYWORDS: &[&str] = &["select all", "all that apply", "multiple"];

/// Length and option-count limits for the classifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Longest question (in characters) still shown as a one-line input.
    /// Anything longer gets a textarea.
    pub textarea_length_limit: usize,
    /// Most options a question may have and still be single-select.
    pub single_select_max_options: usize,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            textarea_length_limit: 80,
            single_select_max_options: 6,
        }
    }
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| haystack.contains(keyword))
}

/// Picks the input widget for a free-text question. First match wins:
/// date, time, number, textarea, then plain text.
pub fn classify_input_type(question: &str) -> InputType {
    classify_input_type_with(question, &ClassifierThresholds::default())
}

/// Like [`classify_input_type`] with explicit thresholds.
pub fn classify_input_type_with(question: &str, thresholds: &ClassifierThresholds) -> InputType {
    let lower = question.to_lowercase();

    if contains_any(&lower, DATE_KEYWORDS) {
        InputType::Date
    } else if contains_any(&lower, TIME_KEYWORDS) {
        InputType::Time
    } else if contains_any(&lower, NUMBER_KEYWORDS) {
        InputType::Number
    } else if question.chars().count() > thresholds.textarea_length_limit
        || contains_any(&lower, TEXTAREA_KEYWORDS)
    {
        InputType::Textarea
    } else {
        InputType::Text
    }
}

/// Returns true if a multiple-choice question should accept several answers.
pub fn is_multi_select<S: AsRef<str>>(question: &str, options: &[S]) -> bool {
    is_multi_select_with(question, options, &ClassifierThresholds::default())
}

/// Like [`is_multi_select`] with explicit thresholds.
pub fn is_multi_select_with<S: AsRef<str>>(
    question: &str,
    options: &[S],
    thresholds: &ClassifierThresholds,
) -> bool {
    contains_any(&question.to_lowercase(), MULTI_SELECT_KEYWORDS)
        || options.len() > thresholds.single_select_max_options
}

/// Returns true for an "Other" option that asks for free text.
pub fn is_other_option(option: &str) -> bool {
    let lower = option.trim().to_lowercase();
    lower == "other" || lower.starts_with("other:")
}
