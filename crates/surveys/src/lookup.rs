//! Cross-survey variable lookup.
//!
//! An exact (case-insensitive) variable-name match returns every matching row
//! in full. Failing that, a substring match returns a short list of distinct
//! variable names so the caller can pick the right one.

use std::sync::Arc;

use tracing::debug;

use crate::store::{SurveyRecord, SurveyStore};

/// Reply when the survey table could not be loaded.
pub const MISSING_DATA_MESSAGE: &str = "Survey data file not found.";

/// Default number of variable-name suggestions on a partial match.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// What a lookup found.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome<'a> {
    /// Full rows for an exact variable-name match, in table order.
    Matches(Vec<&'a SurveyRecord>),
    /// Distinct variable names containing the query, first-seen order.
    Suggestions(Vec<String>),
    NotFound,
}

impl LookupOutcome<'_> {
    pub fn render(&self, varname: &str) -> String {
        match self {
            LookupOutcome::Matches(rows) => {
                let mut lines = vec![format!(
                    "Variable '{varname}' across {} survey instances:\n",
                    rows.len()
                )];
                for row in rows {
                    lines.push(format!("Survey: {}", row.surveyid));
                    lines.push(format!("  Description: {}", row.description));
                    if !row.question.is_empty() {
                        lines.push(format!("  Question: {}", row.question));
                    }
                    if !row.responses.is_empty() {
                        lines.push(format!("  Responses: {}", row.responses));
                    }
                    lines.push(String::new());
                }
                lines.join("\n")
            }
            LookupOutcome::Suggestions(names) => format!(
                "No exact match for '{varname}'. Similar variable names: {}",
                names.join(", ")
            ),
            LookupOutcome::NotFound => format!(
                "No variables found matching '{varname}'. \
                 Try a different name or search the database by topic instead."
            ),
        }
    }
}

/// Two-tier lookup over an optional survey table.
#[derive(Debug, Clone)]
pub struct CrossSurveyLookup {
    store: Option<Arc<SurveyStore>>,
    suggestion_limit: usize,
}

impl CrossSurveyLookup {
    pub fn new(store: Arc<SurveyStore>) -> Self {
        Self {
            store: Some(store),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    /// A lookup with no table behind it; every query reports missing data.
    pub fn unavailable() -> Self {
        Self {
            store: None,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    /// Cap on suggested names (at least 1).
    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit.max(1);
        self
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Run the lookup. `None` when no table is loaded.
    pub fn lookup(&self, varname: &str) -> Option<LookupOutcome<'_>> {
        let store = self.store.as_deref()?;

        let exact = store.exact(varname);
        if !exact.is_empty() {
            return Some(LookupOutcome::Matches(exact));
        }

        let mut names: Vec<String> = Vec::new();
        for record in store.containing(varname) {
            if names.len() == self.suggestion_limit {
                break;
            }
            if !names.contains(&record.varname) {
                names.push(record.varname.clone());
            }
        }

        Some(if names.is_empty() {
            LookupOutcome::NotFound
        } else {
            LookupOutcome::Suggestions(names)
        })
    }

    /// Lookup and render as text.
    pub fn compare(&self, varname: &str) -> String {
        match self.lookup(varname) {
            Some(outcome) => {
                debug!(varname, outcome = outcome_kind(&outcome), "Cross-survey lookup");
                outcome.render(varname)
            }
            None => MISSING_DATA_MESSAGE.to_string(),
        }
    }
}

fn outcome_kind(outcome: &LookupOutcome<'_>) -> &'static str {
    match outcome {
        LookupOutcome::Matches(_) => "matches",
        LookupOutcome::Suggestions(_) => "suggestions",
        LookupOutcome::NotFound => "not_found",
    }
}
