//! Tool abstractions for the fixed set of capabilities the model may invoke.
//!
//! The catalog is closed: every tool is a [`ToolName`] variant, so dispatch
//! is an exhaustive `match` instead of a runtime name lookup. Each tool
//! declares a typed argument struct that is deserialized from the model's
//! raw JSON before the handler runs.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// The four tools exposed to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    FindRelatedWords,
    SearchSurveyQuestions,
    AnalyzeQuestion,
    CompareAcrossSurveys,
}

impl ToolName {
    /// Catalog order.
    pub const ALL: [ToolName; 4] = [
        ToolName::FindRelatedWords,
        ToolName::SearchSurveyQuestions,
        ToolName::AnalyzeQuestion,
        ToolName::CompareAcrossSurveys,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::FindRelatedWords => "find_related_words",
            ToolName::SearchSurveyQuestions => "search_survey_questions",
            ToolName::AnalyzeQuestion => "analyze_question",
            ToolName::CompareAcrossSurveys => "compare_across_surveys",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::NotFound(s.to_string()))
    }
}

/// A tool description sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// The result of a tool execution, ready to be appended as a tool-result turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output text (an error description when `success` is false)
    pub output: String,
}

/// A statically-typed tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Which catalog entry this tool implements.
    const NAME: ToolName;

    /// Validated argument type.
    type Args: DeserializeOwned + Send;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &'static str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool. Lookup misses are `Ok` with a "no results" text.
    async fn run(&self, args: Self::Args) -> Result<String, ToolError>;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: Self::NAME.as_str().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }

    /// Deserialize raw model arguments. An empty string is treated as `{}`.
    fn parse_arguments(raw: &str) -> Result<Self::Args, ToolError>
    where
        Self: Sized,
    {
        let raw = if raw.trim().is_empty() { "{}" } else { raw };
        serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
            tool_name: Self::NAME.as_str().to_string(),
            reason: e.to_string(),
        })
    }
}
