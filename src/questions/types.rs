//! Canonical question-set shapes rendered by the interview UI.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Input widget for a free-text or numeric question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Date,
    Time,
    Number,
    Textarea,
    Text,
}

impl InputType {
    /// Wire name of this input type.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Date => "date",
            InputType::Time => "time",
            InputType::Number => "number",
            InputType::Textarea => "textarea",
            InputType::Text => "text",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question answered by picking one or more options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub required: bool,
    pub note: Option<String>,
}

/// A question answered with a date, time, number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNumberQuestion {
    pub id: String,
    pub question: String,
    pub required: bool,
    pub note: Option<String>,
    #[serde(rename = "inputType")]
    pub input_type: InputType,
}

/// A request for an uploaded document or scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuestion {
    pub id: String,
    pub question: String,
    pub required: bool,
    pub note: Option<String>,
}

/// The three question categories, each in model order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionCategories {
    pub multiple_choice: Vec<MultipleChoiceQuestion>,
    pub text_and_numbers: Vec<TextNumberQuestion>,
    pub documents_and_scans: Vec<DocumentQuestion>,
}

impl QuestionCategories {
    /// Total number of questions across all categories.
    pub fn len(&self) -> usize {
        self.multiple_choice.len() + self.text_and_numbers.len() + self.documents_and_scans.len()
    }

    /// Returns true if every category is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All question ids, category by category.
    pub fn all_ids(&self) -> Vec<&str> {
        self.multiple_choice
            .iter()
            .map(|q| q.id.as_str())
            .chain(self.text_and_numbers.iter().map(|q| q.id.as_str()))
            .chain(self.documents_and_scans.iter().map(|q| q.id.as_str()))
            .collect()
    }
}

/// One interview phase's follow-up questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub interview_phase: String,
    pub instructions_for_user: String,
    pub questions: QuestionCategories,
    pub next_steps: String,
}

impl QuestionSet {
    /// Total number of questions in this set.
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
