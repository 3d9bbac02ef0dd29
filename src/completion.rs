//! Chat-completion response bodies returned by the model provider.
//!
//! Only decoding lives here; sending requests is the caller's business. The
//! shape follows the OpenAI-compatible chat-completion format used by
//! OpenRouter and similar gateways.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;
use crate::parser::RawResponse;

/// Finish reason reported when the output-token limit cut the response.
pub const FINISH_REASON_LENGTH: &str = "length";

/// A message in a completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "assistant").
    #[serde(default)]
    pub role: String,
    /// Message text, or JSON when the provider returns structured output.
    #[serde(default)]
    pub content: Value,
}

/// A single generated choice from the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Index of this choice in the response.
    #[serde(default)]
    pub index: u32,
    /// Generated message.
    pub message: Message,
    /// Reason the generation stopped (e.g., "stop", "length").
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage statistics for a completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Number of tokens generated.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens used.
    #[serde(default)]
    pub total_tokens: u32,
}

/// Response body of a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Unique identifier for this response.
    #[serde(default)]
    pub id: String,
    /// Model that generated this response.
    #[serde(default)]
    pub model: String,
    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage statistics, when reported.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletion {
    /// Decode a completion body.
    pub fn from_json(body: &str) -> Result<Self, ParseError> {
        serde_json::from_str(body).map_err(|e| ParseError::Envelope(e.to_string()))
    }

    /// The first choice's content, if it carries any.
    ///
    /// Empty strings and nulls count as missing content.
    pub fn first_content(&self) -> Option<RawResponse> {
        let content = &self.choices.first()?.message.content;
        match content {
            Value::Null => None,
            Value::String(text) if text.trim().is_empty() => None,
            other => Some(RawResponse::from(other.clone())),
        }
    }

    /// The first choice's finish reason.
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first()?.finish_reason.as_deref()
    }

    /// Returns true if the model stopped at its output-token limit.
    pub fn was_truncated(&self) -> bool {
        self.finish_reason() == Some(FINISH_REASON_LENGTH)
    }
}
