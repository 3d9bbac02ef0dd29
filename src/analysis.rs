//! Completed diagnostic responses.
//!
//! A medical analysis is passed through as decoded. Its nested shape varies
//! between responses and the renderer tolerates missing fields, so nothing
//! here reshapes or validates it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level keys that mark a decoded value as a medical analysis.
pub const ANALYSIS_KEYS: [&str; 2] = ["medical_analysis", "treatment_recommendations"];

/// A decoded medical-analysis payload, kept exactly as the model sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicalAnalysis(Value);

impl MedicalAnalysis {
    /// Returns true if `value` carries a non-empty analysis or recommendation
    /// section.
    pub fn detect(value: &Value) -> bool {
        ANALYSIS_KEYS.iter().any(|key| match value.get(key) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(_) => true,
        })
    }

    /// Wraps `value` if it is a medical analysis, otherwise hands it back.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        if Self::detect(&value) {
            Ok(Self(value))
        } else {
            Err(value)
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `medical_analysis` section, if present.
    pub fn medical_analysis(&self) -> Option<&Value> {
        self.0.get("medical_analysis")
    }

    /// The `treatment_recommendations` section, if present.
    pub fn treatment_recommendations(&self) -> Option<&Value> {
        self.0.get("treatment_recommendations")
    }

    /// Candidate diagnoses listed under `medical_analysis.probable_conditions`.
    pub fn probable_conditions(&self) -> &[Value] {
        self.medical_analysis()
            .and_then(|section| section.get("probable_conditions"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Keys of an object-valued section, for diagnostics.
    pub fn section_keys(section: Option<&Value>) -> Vec<&str> {
        section
            .and_then(Value::as_object)
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect() {
        assert!(MedicalAnalysis::detect(&json!({"medical_analysis": {}})));
        assert!(MedicalAnalysis::detect(&json!({"treatment_recommendations": ["rest"]})));
        assert!(!MedicalAnalysis::detect(&json!({"medical_analysis": null})));
        assert!(!MedicalAnalysis::detect(&json!({"medical_analysis": ""})));
        assert!(!MedicalAnalysis::detect(&json!({"questions": {}})));
        assert!(!MedicalAnalysis::detect(&json!("medical_analysis")));
    }

    #[test]
    fn test_passthrough_unchanged() {
        let value = json!({
            "medical_analysis": {"summary": "Likely viral", "extra": [1, 2]},
            "unexpected": true
        });
        let analysis = MedicalAnalysis::from_value(value.clone()).unwrap();
        assert_eq!(analysis.as_value(), &value);
        assert_eq!(serde_json::to_value(&analysis).unwrap(), value);
        assert_eq!(analysis.into_value(), value);
    }

    #[test]
    fn test_accessors() {
        let analysis = MedicalAnalysis::from_value(json!({
            "medical_analysis": {
                "probable_conditions": [{"name": "Influenza"}, {"name": "Common cold"}]
            },
            "treatment_recommendations": {"self_care": ["rest"], "urgency": "low"}
        }))
        .unwrap();

        assert_eq!(analysis.probable_conditions().len(), 2);
        assert_eq!(analysis.probable_conditions()[0]["name"], "Influenza");
        let mut keys = MedicalAnalysis::section_keys(analysis.treatment_recommendations());
        keys.sort_unstable();
        assert_eq!(keys, vec!["self_care", "urgency"]);
    }

    #[test]
    fn test_missing_sections_tolerated() {
        let analysis = MedicalAnalysis::from_value(json!({"treatment_recommendations": "rest"})).unwrap();
        assert!(analysis.medical_analysis().is_none());
        assert!(analysis.probable_conditions().is_empty());
        assert!(MedicalAnalysis::section_keys(analysis.treatment_recommendations()).is_empty());
    }

    #[test]
    fn test_from_value_returns_rejected_value() {
        let questions = json!({"questions": {"multiple_choice": [{"id": "Q1"}]}});
        let rejected = MedicalAnalysis::from_value(questions.clone()).unwrap_err();
        assert_eq!(rejected, questions);
    }
}
