//! The tool catalog: the fixed set of tools exposed to the model.
//!
//! Dispatch is an exhaustive `match` on [`ToolName`]. Each arm deserializes
//! the model's raw JSON into the tool's typed arguments before running it.

use std::sync::Arc;

use surveyor_config::AppConfig;
use surveyor_core::error::ToolError;
use surveyor_core::message::ToolCall;
use surveyor_core::provider::Provider;
use surveyor_core::search::SurveySearch;
use surveyor_core::tool::{Tool, ToolName, ToolResult, ToolSpec};
use surveyor_core::words::WordRelations;
use surveyor_surveys::{CrossSurveyLookup, EmbeddedIndex, SurveyStore};
use tracing::{debug, info, warn};

use crate::analyze_question::AnalyzeQuestionTool;
use crate::compare_surveys::CompareAcrossSurveysTool;
use crate::related_words::{DatamuseClient, FindRelatedWordsTool};
use crate::search_questions::SearchSurveyQuestionsTool;

/// Read-only after construction; share it behind an `Arc`.
pub struct ToolCatalog {
    related_words: FindRelatedWordsTool,
    search: SearchSurveyQuestionsTool,
    analyze: AnalyzeQuestionTool,
    compare: CompareAcrossSurveysTool,
    specs: Vec<ToolSpec>,
}

async fn dispatch<T: Tool>(tool: &T, raw_arguments: &str) -> Result<String, ToolError> {
    let args = T::parse_arguments(raw_arguments)?;
    tool.run(args).await
}

impl ToolCatalog {
    pub fn new(
        related_words: FindRelatedWordsTool,
        search: SearchSurveyQuestionsTool,
        analyze: AnalyzeQuestionTool,
        compare: CompareAcrossSurveysTool,
    ) -> Self {
        let specs = vec![
            related_words.spec(),
            search.spec(),
            analyze.spec(),
            compare.spec(),
        ];
        Self {
            related_words,
            search,
            analyze,
            compare,
            specs,
        }
    }

    /// Build the catalog from its collaborators with default limits.
    pub fn with_collaborators(
        words: Arc<dyn WordRelations>,
        index: Option<Arc<dyn SurveySearch>>,
        lookup: CrossSurveyLookup,
    ) -> Self {
        Self::new(
            FindRelatedWordsTool::new(words),
            SearchSurveyQuestionsTool::new(index),
            AnalyzeQuestionTool::new(),
            CompareAcrossSurveysTool::new(lookup),
        )
    }

    /// Build the catalog from configuration.
    ///
    /// A missing survey table or index is not fatal: the affected tool
    /// answers with an explanatory message instead.
    pub fn from_config(config: &AppConfig, embedder: Arc<dyn Provider>) -> Self {
        let words: Arc<dyn WordRelations> = Arc::new(DatamuseClient::from_config(&config.tools));

        let lookup = match SurveyStore::from_path(&config.data.survey_csv) {
            Ok(store) => {
                info!(rows = store.len(), "Survey table ready");
                CrossSurveyLookup::new(Arc::new(store))
            }
            Err(e) => {
                warn!(error = %e, "Survey table unavailable");
                CrossSurveyLookup::unavailable()
            }
        }
        .with_suggestion_limit(config.tools.suggestion_limit);

        let index: Option<Arc<dyn SurveySearch>> = match EmbeddedIndex::load(
            &config.data.index_path,
            embedder,
            &config.data.embedding_model,
        ) {
            Ok(index) => {
                info!(documents = index.len(), "Survey index ready");
                Some(Arc::new(index))
            }
            Err(e) => {
                warn!(error = %e, "Survey index unavailable");
                None
            }
        };

        Self::new(
            FindRelatedWordsTool::new(words),
            SearchSurveyQuestionsTool::new(index).with_limits(
                config.tools.search_default_results,
                config.tools.search_max_results,
            ),
            AnalyzeQuestionTool::new(),
            CompareAcrossSurveysTool::new(lookup),
        )
    }

    /// The tool specs sent to the model, in catalog order.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Run one tool by name with raw JSON arguments.
    pub async fn resolve(&self, name: ToolName, raw_arguments: &str) -> Result<String, ToolError> {
        match name {
            ToolName::FindRelatedWords => dispatch(&self.related_words, raw_arguments).await,
            ToolName::SearchSurveyQuestions => dispatch(&self.search, raw_arguments).await,
            ToolName::AnalyzeQuestion => dispatch(&self.analyze, raw_arguments).await,
            ToolName::CompareAcrossSurveys => dispatch(&self.compare, raw_arguments).await,
        }
    }

    /// Execute a model tool call. Never fails: errors become the result text.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let outcome = match call.name.parse::<ToolName>() {
            Ok(name) => self.resolve(name, &call.arguments).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(output) => {
                debug!(tool = %call.name, call_id = %call.id, bytes = output.len(), "Tool succeeded");
                ToolResult {
                    call_id: call.id.clone(),
                    success: true,
                    output,
                }
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool failed");
                ToolResult {
                    call_id: call.id.clone(),
                    success: false,
                    output: format!("Error: {e}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use surveyor_core::words::RelationKind;

    struct FixedWords;

    #[async_trait]
    impl WordRelations for FixedWords {
        async fn lookup(&self, _word: &str, _kind: RelationKind) -> Result<Vec<String>, ToolError> {
            Ok(vec!["wage".into(), "salary".into()])
        }
    }

    fn catalog() -> ToolCatalog {
        ToolCatalog::with_collaborators(Arc::new(FixedWords), None, CrossSurveyLookup::unavailable())
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[test]
    fn specs_cover_all_tools_in_order() {
        let catalog = catalog();
        let names: Vec<&str> = catalog.specs().iter().map(|s| s.name.as_str()).collect();
        let expected: Vec<&str> = ToolName::ALL.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, expected);
        for spec in catalog.specs() {
            assert_eq!(spec.parameters["type"], "object");
            assert!(!spec.description.is_empty());
        }
    }

    #[tokio::test]
    async fn resolve_dispatches_by_name() {
        let out = catalog()
            .resolve(ToolName::FindRelatedWords, r#"{"word":"pay"}"#)
            .await
            .unwrap();
        assert_eq!(out, "Related for 'pay': wage, salary");
    }

    #[tokio::test]
    async fn execute_success() {
        let result = catalog()
            .execute(&call("analyze_question", r#"{"question_text":"Are you employed?"}"#))
            .await;
        assert!(result.success);
        assert_eq!(result.call_id, "call_1");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_text() {
        let result = catalog().execute(&call("delete_everything", "{}")).await;
        assert!(!result.success);
        assert_eq!(result.output, "Error: Tool not found: delete_everything");
    }

    #[tokio::test]
    async fn malformed_arguments_become_error_text() {
        let result = catalog().execute(&call("compare_across_surveys", "{oops")).await;
        assert!(!result.success);
        assert!(result.output.starts_with("Error: Invalid arguments for compare_across_surveys"));
    }

    #[tokio::test]
    async fn missing_collaborators_answer_with_text() {
        let c = catalog();
        let search = c.execute(&call("search_survey_questions", r#"{"query":"pay"}"#)).await;
        assert!(search.success);
        assert!(search.output.contains("unavailable"));

        let compare = c.execute(&call("compare_across_surveys", r#"{"varname":"pay"}"#)).await;
        assert_eq!(compare.output, "Survey data file not found.");
    }
}
