//! `surveyor analyze` runs the wording checks without a model.

use super::CliResult;

pub fn run(question: &str) -> CliResult {
    let report = surveyor_analyzer::analyze(question);
    println!("{report}");
    Ok(())
}
