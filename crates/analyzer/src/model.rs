//! Diagnostic data model: categories, findings and the rendered report.

use serde::{Deserialize, Serialize};

/// Reply used when no rule fires.
pub const CLEAN_MESSAGE: &str = "This looks clean. No double-barreling, no leading language, \
reasonable length. You should still pilot it with a few respondents before fielding.";

/// The kind of problem a rule detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DoubleBarreled,
    TooLong,
    Leading,
    VagueFrequency,
    NoReferencePeriod,
    DoubleNegative,
}

impl Category {
    /// Evaluation order.
    pub const ALL: [Category; 6] = [
        Category::DoubleBarreled,
        Category::TooLong,
        Category::Leading,
        Category::VagueFrequency,
        Category::NoReferencePeriod,
        Category::DoubleNegative,
    ];

    /// Upper-case label shown in front of the message.
    pub fn label(&self) -> &'static str {
        match self {
            Category::DoubleBarreled => "DOUBLE-BARRELED",
            Category::TooLong => "TOO LONG",
            Category::Leading => "LEADING",
            Category::VagueFrequency => "VAGUE FREQUENCY",
            Category::NoReferencePeriod => "NO REFERENCE PERIOD",
            Category::DoubleNegative => "DOUBLE NEGATIVE",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One issue detected in a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub category: Category,
    /// Advice text, without the category label.
    pub message: String,
}

impl Finding {
    pub fn new(category: Category, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category.label(), self.message)
    }
}

/// The findings for one question, in rule order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// The text exactly as it was analyzed.
    pub question: String,
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    /// Whether a finding of `category` is present.
    pub fn has(&self, category: Category) -> bool {
        self.findings.iter().any(|f| f.category == category)
    }

    pub fn categories(&self) -> Vec<Category> {
        self.findings.iter().map(|f| f.category).collect()
    }

    /// Human-readable rendering handed back to the model.
    pub fn render(&self) -> String {
        if self.is_clean() {
            return CLEAN_MESSAGE.to_string();
        }

        let items: Vec<String> = self
            .findings
            .iter()
            .enumerate()
            .map(|(i, finding)| format!("{}. {finding}", i + 1))
            .collect();

        format!(
            "Analysis of: \"{}\"\n\nIssues found ({}):\n\n{}",
            self.question,
            self.findings.len(),
            items.join("\n\n")
        )
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
