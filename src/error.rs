//! Error types for symptom-intake operations.
//!
//! The recovery and sanitizing stages never fail; every failure surfaces at
//! the final decode or validation step:
//! - JSON decoding of the repaired text
//! - Structural validation of the decoded value
//! - Chat-completion envelope decoding
//! - Configuration loading

use thiserror::Error;

/// Decoding succeeded but the value matches neither canonical schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StructureError {
    #[error("Invalid data structure")]
    InvalidData,

    #[error("Missing or invalid questions structure")]
    MissingQuestions,

    #[error("No structured questions found")]
    NoQuestions,
}

/// Errors returned by the response parser.
///
/// Callers treat every variant the same way: fall back to showing the raw
/// model text.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON after repair: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Unexpected response structure: {0}")]
    Structure(#[from] StructureError),

    #[error("Invalid completion envelope: {0}")]
    Envelope(String),
}

impl ParseError {
    /// Returns true if the repaired text still was not valid JSON.
    pub fn is_syntax(&self) -> bool {
        matches!(self, ParseError::Syntax(_))
    }

    /// Returns true if decoding succeeded but validation rejected the value.
    pub fn is_structure(&self) -> bool {
        matches!(self, ParseError::Structure(_))
    }
}

/// Errors that can occur while loading parser configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
