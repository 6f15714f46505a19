//! Rule-based quality checks for draft survey questions.
//!
//! Six independent checks run in a fixed order over the literal question
//! text (case-folded, matched on word boundaries):
//!
//! 1. double-barreled wording
//! 2. excessive length
//! 3. leading language
//! 4. vague frequency terms
//! 5. missing reference period
//! 6. double negatives
//!
//! # Example
//!
//! ```
//! use surveyor_analyzer::{Category, analyze};
//!
//! let report = analyze("Don't you think the new schedule is better?");
//! assert!(report.has(Category::Leading));
//! ```

mod engine;
mod model;
pub mod rules;

pub use engine::{QuestionAnalyzer, analyze};
pub use model::{CLEAN_MESSAGE, Category, Finding, Report};
pub use rules::Rule;
