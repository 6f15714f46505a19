//! `surveyor compare` looks a variable up in the survey table.

use std::sync::Arc;

use surveyor_surveys::{CrossSurveyLookup, SurveyStore};
use tracing::warn;

use super::{CliResult, load_config};

pub fn run(varname: &str) -> CliResult {
    let config = load_config()?;

    let lookup = match SurveyStore::from_path(&config.data.survey_csv) {
        Ok(store) => CrossSurveyLookup::new(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "Survey table unavailable");
            CrossSurveyLookup::unavailable()
        }
    }
    .with_suggestion_limit(config.tools.suggestion_limit);

    println!("{}", lookup.compare(varname));
    Ok(())
}
