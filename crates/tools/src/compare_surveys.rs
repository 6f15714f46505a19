//! Compare one variable across every survey that measures it.

use async_trait::async_trait;
use serde::Deserialize;
use surveyor_core::error::ToolError;
use surveyor_core::tool::{Tool, ToolName};
use surveyor_surveys::CrossSurveyLookup;

#[derive(Debug, Deserialize)]
pub struct CompareAcrossSurveysArgs {
    pub varname: String,
}

/// `compare_across_surveys(varname)`
pub struct CompareAcrossSurveysTool {
    lookup: CrossSurveyLookup,
}

impl CompareAcrossSurveysTool {
    pub fn new(lookup: CrossSurveyLookup) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Tool for CompareAcrossSurveysTool {
    const NAME: ToolName = ToolName::CompareAcrossSurveys;
    type Args = CompareAcrossSurveysArgs;

    fn description(&self) -> &'static str {
        "Show how the same variable (by varname) is measured across different surveys: \
         question text, response options and survey source for each instance."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "varname": {
                    "type": "string",
                    "description": "The variable name to look up (e.g. 'b25_respect', 'jobsat')"
                }
            },
            "required": ["varname"]
        })
    }

    async fn run(&self, args: CompareAcrossSurveysArgs) -> Result<String, ToolError> {
        Ok(self.lookup.compare(&args.varname))
    }
}
