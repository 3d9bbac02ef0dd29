//! Reshaping of decoded model output into a canonical [`QuestionSet`].
//!
//! The model's JSON is loosely typed: fields go missing, ids repeat, and
//! booleans arrive as strings. Normalization fills defaults, resolves id
//! collisions within each category and classifies free-text inputs. It
//! fails only when there is no `questions` object or no question at all.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use super::classify::classify_input_type_with;
use super::types::{
    DocumentQuestion, MultipleChoiceQuestion, QuestionCategories, QuestionSet, TextNumberQuestion,
};
use crate::config::ParserConfig;
use crate::error::StructureError;

/// Id prefix for synthesized multiple-choice ids.
pub const MULTIPLE_CHOICE_PREFIX: &str = "MC";
/// Id prefix for synthesized text/number ids.
pub const TEXT_NUMBER_PREFIX: &str = "TN";
/// Id prefix for synthesized document ids.
pub const DOCUMENT_PREFIX: &str = "DOC";

/// Ids already handed out within one category of one normalization call.
#[derive(Debug, Default)]
pub struct IdRegistry {
    seen: HashSet<String>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `base`, or `base_1`, `base_2`, ... if it is already taken,
    /// and records the result.
    pub fn claim(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut suffix = 1;
        while self.seen.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.seen.insert(candidate.clone());
        candidate
    }
}

/// JSON truthiness: null, false, 0 and "" are false.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn text_or(value: &Value, key: &str, default: &str) -> String {
    non_empty_str(value, key).unwrap_or(default).to_string()
}

/// The entry's own id, or `{prefix}{position}` when it has none.
fn base_id(entry: &Value, prefix: &str, index: usize) -> String {
    match entry.get("id").filter(|id| is_truthy(id)) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("{}{}", prefix, index + 1),
    }
}

fn required(entry: &Value) -> bool {
    entry.get("required").is_some_and(is_truthy)
}

fn note(entry: &Value) -> Option<String> {
    non_empty_str(entry, "note").map(str::to_string)
}

/// Scalar options are kept as text; nested values and nulls are dropped.
fn options(entry: &Value) -> Vec<String> {
    let Some(Value::Array(items)) = entry.get("options") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .collect()
}

fn category<'a>(questions: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    match questions.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

fn normalize_multiple_choice(entries: &[Value], config: &ParserConfig) -> Vec<MultipleChoiceQuestion> {
    let mut ids = IdRegistry::new();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| MultipleChoiceQuestion {
            id: ids.claim(&base_id(entry, MULTIPLE_CHOICE_PREFIX, index)),
            question: text_or(entry, "question", &config.untitled_question),
            options: options(entry),
            required: required(entry),
            note: note(entry),
        })
        .collect()
}

fn normalize_text_and_numbers(entries: &[Value], config: &ParserConfig) -> Vec<TextNumberQuestion> {
    let mut ids = IdRegistry::new();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let question = text_or(entry, "question", &config.untitled_question);
            TextNumberQuestion {
                id: ids.claim(&base_id(entry, TEXT_NUMBER_PREFIX, index)),
                input_type: classify_input_type_with(&question, &config.thresholds),
                question,
                required: required(entry),
                note: note(entry),
            }
        })
        .collect()
}

fn normalize_documents(entries: &[Value], config: &ParserConfig) -> Vec<DocumentQuestion> {
    let mut ids = IdRegistry::new();
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| DocumentQuestion {
            id: ids.claim(&base_id(entry, DOCUMENT_PREFIX, index)),
            question: text_or(entry, "question", &config.untitled_document),
            required: required(entry),
            note: note(entry),
        })
        .collect()
}

/// Validates a decoded value and reshapes it into a [`QuestionSet`].
///
/// # Errors
///
/// - [`StructureError::InvalidData`] if `data` is not an object
/// - [`StructureError::MissingQuestions`] if `questions` is absent or not an object
/// - [`StructureError::NoQuestions`] if all three categories end up empty
pub fn normalize_questions(data: &Value, config: &ParserConfig) -> Result<QuestionSet, StructureError> {
    if !data.is_object() {
        return Err(StructureError::InvalidData);
    }

    let questions = data
        .get("questions")
        .and_then(Value::as_object)
        .ok_or(StructureError::MissingQuestions)?;

    let categories = QuestionCategories {
        multiple_choice: normalize_multiple_choice(category(questions, "multiple_choice"), config),
        text_and_numbers: normalize_text_and_numbers(category(questions, "text_and_numbers"), config),
        documents_and_scans: normalize_documents(category(questions, "documents_and_scans"), config),
    };

    if categories.is_empty() {
        return Err(StructureError::NoQuestions);
    }

    debug!(
        multiple_choice = categories.multiple_choice.len(),
        text_and_numbers = categories.text_and_numbers.len(),
        documents_and_scans = categories.documents_and_scans.len(),
        "Normalized question set"
    );

    Ok(QuestionSet {
        interview_phase: text_or(data, "interview_phase", &config.default_interview_phase),
        instructions_for_user: text_or(data, "instructions_for_user", &config.default_instructions),
        questions: categories,
        next_steps: text_or(data, "next_steps", &config.default_next_steps),
    })
}
