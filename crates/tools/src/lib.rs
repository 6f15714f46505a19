//! The survey-design tools the assistant can call.
//!
//! - `find_related_words`: synonyms and related words via Datamuse
//! - `search_survey_questions`: semantic search over the survey index
//! - `analyze_question`: rule-based critique of a draft question
//! - `compare_across_surveys`: how one variable is asked across surveys

pub mod analyze_question;
pub mod catalog;
pub mod compare_surveys;
pub mod related_words;
pub mod search_questions;

pub use analyze_question::AnalyzeQuestionTool;
pub use catalog::ToolCatalog;
pub use compare_surveys::CompareAcrossSurveysTool;
pub use related_words::{DatamuseClient, FindRelatedWordsTool, MAX_WORD_RESULTS};
pub use search_questions::{MAX_SEARCH_RESULTS, SearchSurveyQuestionsTool};
