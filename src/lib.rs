//! symptom-intake: tolerant parsing of medical-interview LLM responses.
//!
//! Model output arrives fenced, truncated, or with raw control characters
//! inside strings. This library recovers a decodable JSON document from such
//! text and validates it into one of two shapes the interview UI renders:
//! a [`QuestionSet`] of follow-up questions or a [`MedicalAnalysis`].
//!
//! ```
//! use symptom_intake::{parse, InputType};
//!
//! let response = "```json\n{\"questions\": {\"text_and_numbers\": [{\"question\": \"What is your age?\"}]}}\n```";
//! let parsed = parse(response).unwrap();
//! let set = parsed.as_questions().unwrap();
//! assert_eq!(set.questions.text_and_numbers[0].id, "TN1");
//! assert_eq!(set.questions.text_and_numbers[0].input_type, InputType::Number);
//! ```

pub mod analysis;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod parser;
pub mod questions;
pub mod utils;

pub use analysis::MedicalAnalysis;
pub use completion::ChatCompletion;
pub use config::ParserConfig;
pub use error::{ConfigError, ParseError, StructureError};
pub use parser::{parse, try_parse, ParsedResponse, RawResponse, ResponseParser};
pub use questions::{
    classify_input_type, is_multi_select, is_other_option, InputType, QuestionSet,
};
