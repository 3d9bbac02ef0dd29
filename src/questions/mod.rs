//! Question-set data model, widget classifiers and the structural normalizer.

pub mod classify;
pub mod normalize;
pub mod types;

pub use classify::{
    classify_input_type, classify_input_type_with, is_multi_select, is_multi_select_with,
    is_other_option, ClassifierThresholds,
};
pub use normalize::{normalize_questions, IdRegistry};
pub use types::{
    DocumentQuestion, InputType, MultipleChoiceQuestion, QuestionCategories, QuestionSet,
    TextNumberQuestion,
};
