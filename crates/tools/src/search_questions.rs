//! Semantic search over the survey question index.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use surveyor_core::error::ToolError;
use surveyor_core::search::SurveySearch;
use surveyor_core::tool::{Tool, ToolName};

/// Hard upper bound on results per search, whatever the configuration says.
pub const MAX_SEARCH_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SearchSurveyQuestionsArgs {
    pub query: String,
    /// Accepts a number or a numeric string; anything else falls back to the default.
    #[serde(default)]
    pub n_results: Option<serde_json::Value>,
}

/// `search_survey_questions(query, n_results)`
pub struct SearchSurveyQuestionsTool {
    index: Option<Arc<dyn SurveySearch>>,
    default_results: usize,
    max_results: usize,
}

impl SearchSurveyQuestionsTool {
    pub fn new(index: Option<Arc<dyn SurveySearch>>) -> Self {
        Self {
            index,
            default_results: 5,
            max_results: MAX_SEARCH_RESULTS,
        }
    }

    pub fn with_limits(mut self, default_results: usize, max_results: usize) -> Self {
        self.max_results = max_results.clamp(1, MAX_SEARCH_RESULTS);
        self.default_results = default_results.clamp(1, self.max_results);
        self
    }

    /// Clamp the requested count into `1..=max_results`.
    pub fn result_count(&self, requested: Option<&serde_json::Value>) -> usize {
        let requested = requested.and_then(|v| match v {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64)),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        });

        match requested {
            Some(n) => n.clamp(1, self.max_results as i64) as usize,
            None => self.default_results,
        }
    }
}

#[async_trait]
impl Tool for SearchSurveyQuestionsTool {
    const NAME: ToolName = ToolName::SearchSurveyQuestions;
    type Args = SearchSurveyQuestionsArgs;

    fn description(&self) -> &'static str {
        "Search the survey question database by meaning. Returns real questions from \
         longitudinal workplace studies that match the query topic."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What to search for (e.g. \"job autonomy\", \"workplace respect\", \"financial strain\")"
                },
                "n_results": {
                    "type": "integer",
                    "description": format!("Number of results to return (default {}, max {})", self.default_results, self.max_results),
                    "default": self.default_results
                }
            },
            "required": ["query"]
        })
    }

    async fn run(&self, args: SearchSurveyQuestionsArgs) -> Result<String, ToolError> {
        let Some(index) = &self.index else {
            return Ok("The survey question index is unavailable. Build it before searching.".into());
        };

        let n = self.result_count(args.n_results.as_ref());
        let query = args.query;

        let hits = index
            .query(&query, n)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: Self::NAME.to_string(),
                reason: e.to_string(),
            })?;

        if hits.is_empty() {
            return Ok(format!("No survey questions found matching '{query}'."));
        }

        let mut lines = vec![format!("Survey questions matching '{query}':\n")];
        for (i, hit) in hits.iter().enumerate() {
            lines.push(format!("--- Result {} ---", i + 1));
            lines.push(format!("Variable: {}", hit.meta("varname")));
            lines.push(format!("Survey: {}", hit.meta("surveyid")));
            lines.push(format!("Classification: {}", hit.meta("classification")));
            lines.push(format!("Content: {}", hit.document));
            lines.push(String::new());
        }
        Ok(lines.join("\n"))
    }
}
