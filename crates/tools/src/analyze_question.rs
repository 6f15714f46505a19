//! Rule-based critique of a draft survey question.

use async_trait::async_trait;
use serde::Deserialize;
use surveyor_analyzer::QuestionAnalyzer;
use surveyor_core::error::ToolError;
use surveyor_core::tool::{Tool, ToolName};

#[derive(Debug, Deserialize)]
pub struct AnalyzeQuestionArgs {
    pub question_text: String,
}

/// `analyze_question(question_text)`
#[derive(Default)]
pub struct AnalyzeQuestionTool {
    analyzer: QuestionAnalyzer,
}

impl AnalyzeQuestionTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tool for AnalyzeQuestionTool {
    const NAME: ToolName = ToolName::AnalyzeQuestion;
    type Args = AnalyzeQuestionArgs;

    fn description(&self) -> &'static str {
        "Analyze a draft survey question for common methodological problems: double-barreled \
         wording, leading language, vague frequency terms, excessive length, missing reference \
         periods and double negatives."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "question_text": {
                    "type": "string",
                    "description": "The survey question text to analyze"
                }
            },
            "required": ["question_text"]
        })
    }

    async fn run(&self, args: AnalyzeQuestionArgs) -> Result<String, ToolError> {
        Ok(self.analyzer.analyze(&args.question_text).render())
    }
}
