//! Text-level repair utilities for model output.
//!
//! These functions never fail: they always return their best attempt and
//! leave error reporting to the decode step.

pub mod control_chars;
pub mod json_extraction;

pub use control_chars::{control_escape, escape_control_characters};
pub use json_extraction::{
    analyze_json_structure, closing_sequence, is_likely_truncated, recover_json_text,
    repair_truncated_json, strip_code_fences, JsonStructureAnalysis,
};
