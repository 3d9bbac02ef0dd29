//! Parser configuration: default texts and classifier thresholds.
//!
//! Every field has a default, so an empty YAML document (or no file at all)
//! yields the stock behavior.
//!
//! ```yaml
//! default_interview_phase: assessment
//! default_instructions: Please answer the following questions.
//! thresholds:
//!   textarea_length_limit: 80
//!   single_select_max_options: 6
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::questions::ClassifierThresholds;

/// Environment variable naming a YAML configuration file.
pub const CONFIG_ENV_VAR: &str = "SYMPTOM_INTAKE_CONFIG";

/// Defaults applied while normalizing question sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Used when the model omits `interview_phase`.
    pub default_interview_phase: String,
    /// Used when the model omits `instructions_for_user`.
    pub default_instructions: String,
    /// Used when the model omits `next_steps`.
    pub default_next_steps: String,
    /// Text for multiple-choice and text questions without a question.
    pub untitled_question: String,
    /// Text for document requests without a question.
    pub untitled_document: String,
    /// Limits for the input-type and multi-select classifiers.
    pub thresholds: ClassifierThresholds,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            default_interview_phase: "assessment".to_string(),
            default_instructions: "Please answer the following questions.".to_string(),
            default_next_steps: "Submit your answers to continue.".to_string(),
            untitled_question: "Untitled question".to_string(),
            untitled_document: "Upload document".to_string(),
            thresholds: ClassifierThresholds::default(),
        }
    }
}

impl ParserConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default interview phase.
    pub fn with_interview_phase(mut self, phase: impl Into<String>) -> Self {
        self.default_interview_phase = phase.into();
        self
    }

    /// Set the default instructions shown to the user.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.default_instructions = instructions.into();
        self
    }

    /// Set the default next-steps text.
    pub fn with_next_steps(mut self, next_steps: impl Into<String>) -> Self {
        self.default_next_steps = next_steps.into();
        self
    }

    /// Set the classifier thresholds.
    pub fn with_thresholds(mut self, thresholds: ClassifierThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty map.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Checks that the thresholds can classify anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.textarea_length_limit == 0 {
            return Err(ConfigError::Invalid(
                "thresholds.textarea_length_limit must be greater than 0".to_string(),
            ));
        }
        if self.thresholds.single_select_max_options == 0 {
            return Err(ConfigError::Invalid(
                "thresholds.single_select_max_options must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.default_interview_phase, "assessment");
        assert_eq!(config.untitled_document, "Upload document");
        assert_eq!(config.thresholds.textarea_length_limit, 80);
        assert_eq!(config.thresholds.single_select_max_options, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ParserConfig::new()
            .with_interview_phase("triage")
            .with_instructions("Answer below.")
            .with_next_steps("Send")
            .with_thresholds(ClassifierThresholds {
                textarea_length_limit: 120,
                single_select_max_options: 4,
            });
        assert_eq!(config.default_interview_phase, "triage");
        assert_eq!(config.default_instructions, "Answer below.");
        assert_eq!(config.default_next_steps, "Send");
        assert_eq!(config.thresholds.single_select_max_options, 4);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "default_interview_phase: follow_up\nthresholds:\n  textarea_length_limit: 100\n";
        let config = ParserConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.default_interview_phase, "follow_up");
        assert_eq!(config.default_next_steps, "Submit your answers to continue.");
        assert_eq!(config.thresholds.textarea_length_limit, 100);
        assert_eq!(config.thresholds.single_select_max_options, 6);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ParserConfig::from_yaml_str("").unwrap(), ParserConfig::default());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let yaml = "thresholds:\n  single_select_max_options: 0\n";
        let err = ParserConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "untitled_question: Question pending").unwrap();
        let config = ParserConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.untitled_question, "Question pending");
    }

    #[test]
    fn test_missing_file() {
        let err = ParserConfig::from_yaml_file("/nonexistent/symptom-intake.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
