//! Rule evaluation engine.
//!
//! The engine runs every rule against the question in a fixed order and
//! collects the findings into a [`Report`]. Rules never short-circuit each
//! other and no state survives between calls.

use std::sync::LazyLock;

use tracing::debug;

use crate::model::Report;
use crate::rules::{Prepared, Rule, default_rules};

static DEFAULT_ANALYZER: LazyLock<QuestionAnalyzer> = LazyLock::new(QuestionAnalyzer::new);

/// Runs an ordered rule list over question text.
pub struct QuestionAnalyzer {
    rules: Vec<Box<dyn Rule>>,
}

impl QuestionAnalyzer {
    /// An analyzer with the six built-in rules.
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// An analyzer with a custom rule list, evaluated in the given order.
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn analyze(&self, text: &str) -> Report {
        let prepared = Prepared::new(text);
        let findings: Vec<_> = self
            .rules
            .iter()
            .filter_map(|rule| rule.check(&prepared))
            .collect();

        debug!(
            words = prepared.word_count,
            findings = findings.len(),
            "Question analyzed"
        );

        Report {
            question: text.to_string(),
            findings,
        }
    }
}

impl Default for QuestionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Analyze `text` with the built-in rules.
pub fn analyze(text: &str) -> Report {
    DEFAULT_ANALYZER.analyze(text)
}
