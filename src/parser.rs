//! Entry point turning a raw model response into a renderable structure.
//!
//! ```text
//! RawResponse::Text ──> recover_json_text ──> escape_control_characters ──> decode ─┐
//! RawResponse::Structured ──────────────────────────────────────────────────────────┤
//!                                                                                   v
//!                                      MedicalAnalysis (passthrough) | normalize_questions
//! ```
//!
//! Each call is independent: the parser holds only immutable configuration
//! and keeps nothing from previous inputs.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::analysis::MedicalAnalysis;
use crate::completion::ChatCompletion;
use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::questions::{normalize_questions, QuestionSet};
use crate::utils::{escape_control_characters, recover_json_text};

/// Characters of input shown at the start of a failure preview.
const PREVIEW_HEAD_CHARS: usize = 200;
/// Characters of input shown at the end of a failure preview.
const PREVIEW_TAIL_CHARS: usize = 100;

/// A model response as handed over by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Message text that should contain one JSON object.
    Text(String),
    /// Content the provider already delivered as JSON.
    Structured(Value),
}

impl From<&str> for RawResponse {
    fn from(text: &str) -> Self {
        RawResponse::Text(text.to_string())
    }
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        RawResponse::Text(text)
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => RawResponse::Text(text),
            other => RawResponse::Structured(other),
        }
    }
}

/// A successfully parsed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedResponse {
    Analysis(MedicalAnalysis),
    Questions(QuestionSet),
}

impl ParsedResponse {
    pub fn as_questions(&self) -> Option<&QuestionSet> {
        match self {
            ParsedResponse::Questions(set) => Some(set),
            ParsedResponse::Analysis(_) => None,
        }
    }

    pub fn as_analysis(&self) -> Option<&MedicalAnalysis> {
        match self {
            ParsedResponse::Analysis(analysis) => Some(analysis),
            ParsedResponse::Questions(_) => None,
        }
    }

    /// Serializes to the canonical JSON shape.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Stateless parser for medical-interview model responses.
#[derive(Debug, Clone, Default)]
pub struct ResponseParser {
    config: ParserConfig,
}

impl ResponseParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a raw response into a question set or medical analysis.
    ///
    /// # Errors
    ///
    /// [`ParseError::Syntax`] when the repaired text still does not decode,
    /// [`ParseError::Structure`] when the decoded value matches neither schema.
    pub fn parse(&self, raw: impl Into<RawResponse>) -> Result<ParsedResponse, ParseError> {
        let value = match raw.into() {
            RawResponse::Structured(value) => value,
            RawResponse::Text(text) => decode_text(&text)?,
        };
        self.classify_value(value)
    }

    /// Parses message text.
    pub fn parse_str(&self, text: &str) -> Result<ParsedResponse, ParseError> {
        self.parse(RawResponse::Text(text.to_string()))
    }

    /// Like [`parse`](Self::parse), returning `None` on failure so the caller
    /// can fall back to showing the raw text.
    pub fn try_parse(&self, raw: impl Into<RawResponse>) -> Option<ParsedResponse> {
        let raw = raw.into();
        match self.parse(raw.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(error = %e, syntax = e.is_syntax(), "Failed to parse model response");
                if let RawResponse::Text(text) = &raw {
                    debug!(
                        head = %preview_head(text, PREVIEW_HEAD_CHARS),
                        tail = %preview_tail(text, PREVIEW_TAIL_CHARS),
                        "Unparseable response preview"
                    );
                }
                None
            }
        }
    }

    /// Decodes a chat-completion body and parses its first message.
    ///
    /// # Errors
    ///
    /// [`ParseError::Envelope`] when the body is not a completion with
    /// message content, otherwise as [`parse`](Self::parse).
    pub fn parse_completion(&self, body: &str) -> Result<ParsedResponse, ParseError> {
        let completion = ChatCompletion::from_json(body)?;

        if completion.was_truncated() {
            warn!(
                model = %completion.model,
                completion_tokens = completion.usage.as_ref().map(|u| u.completion_tokens),
                "Response truncated at the output-token limit"
            );
        }

        let content = completion.first_content().ok_or_else(|| {
            ParseError::Envelope("Invalid response format from model provider".to_string())
        })?;
        self.parse(content)
    }

    fn classify_value(&self, value: Value) -> Result<ParsedResponse, ParseError> {
        let value = match MedicalAnalysis::from_value(value) {
            Ok(analysis) => {
                info!(
                    medical_analysis = ?MedicalAnalysis::section_keys(analysis.medical_analysis()),
                    treatment_recommendations =
                        ?MedicalAnalysis::section_keys(analysis.treatment_recommendations()),
                    probable_conditions = analysis.probable_conditions().len(),
                    "Detected medical analysis structure"
                );
                return Ok(ParsedResponse::Analysis(analysis));
            }
            Err(value) => value,
        };

        debug!("Detected questions structure, normalizing");
        let set = normalize_questions(&value, &self.config)?;
        Ok(ParsedResponse::Questions(set))
    }
}

/// Runs text recovery and sanitizing, then decodes.
fn decode_text(text: &str) -> Result<Value, ParseError> {
    let recovered = recover_json_text(text);
    let sanitized = escape_control_characters(&recovered);

    if sanitized.contains("```") {
        warn!("Code fences still present after cleanup");
        debug!(head = %preview_head(&sanitized, PREVIEW_TAIL_CHARS), "Cleaned response preview");
    }

    let value: Value = serde_json::from_str(&sanitized)?;
    debug!(
        keys = ?value.as_object().map(|map| map.keys().collect::<Vec<_>>()),
        "Successfully parsed JSON"
    );
    Ok(value)
}

fn preview_head(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn preview_tail(text: &str, max_chars: usize) -> String {
    let skip = text.chars().count().saturating_sub(max_chars);
    text.chars().skip(skip).collect()
}

/// Parses a raw response with the default configuration.
pub fn parse(raw: impl Into<RawResponse>) -> Result<ParsedResponse, ParseError> {
    ResponseParser::default().parse(raw)
}

/// Parses a raw response with the default configuration, returning `None`
/// on failure.
pub fn try_parse(raw: impl Into<RawResponse>) -> Option<ParsedResponse> {
    ResponseParser::default().try_parse(raw)
}
