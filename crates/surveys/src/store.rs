//! CSV-backed survey question table.
//!
//! The table is read once at startup and never mutated. Columns:
//! `surveyid, varname, description, question, classification, responses, variable`.
//! Missing columns and empty cells read as empty strings.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One row of the survey table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyRecord {
    pub surveyid: String,
    pub varname: String,
    pub description: String,
    pub question: String,
    pub classification: String,
    pub responses: String,
    pub variable: String,
}

impl SurveyRecord {
    pub fn new(surveyid: impl Into<String>, varname: impl Into<String>) -> Self {
        Self {
            surveyid: surveyid.into(),
            varname: varname.into(),
            ..Self::default()
        }
    }
}

/// Errors from loading the survey table.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Survey data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read survey data at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Malformed survey row {row}: {reason}")]
    Row { row: usize, reason: String },
}

/// The in-memory survey table, in file order.
#[derive(Debug, Clone, Default)]
pub struct SurveyStore {
    records: Vec<SurveyRecord>,
}

impl SurveyStore {
    /// Load the table from a CSV file with a header row.
    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let file = std::fs::File::open(path).map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let store = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = store.len(), "Survey table loaded");
        Ok(store)
    }

    /// Load the table from any CSV source with a header row.
    pub fn from_reader<R: Read>(source: R) -> Result<Self, StoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(source);

        let mut records = Vec::new();
        for (i, row) in reader.deserialize::<SurveyRecord>().enumerate() {
            let record = row.map_err(|e| StoreError::Row {
                row: i + 1,
                reason: e.to_string(),
            })?;
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn from_records(records: Vec<SurveyRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[SurveyRecord] {
        &self.records
    }

    /// Rows whose variable name equals `varname`, ignoring case.
    pub fn exact(&self, varname: &str) -> Vec<&SurveyRecord> {
        let needle = varname.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.varname.to_lowercase() == needle)
            .collect()
    }

    /// Rows whose variable name contains `fragment`, ignoring case.
    pub fn containing(&self, fragment: &str) -> Vec<&SurveyRecord> {
        let needle = fragment.to_lowercase();
        self.records
            .iter()
            .filter(|r| r.varname.to_lowercase().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "surveyid,varname,description,question,classification,responses,variable\n\
        ESS9,jobsat,Job satisfaction,How satisfied are you with your job?,Work,0-10,Q12\n\
        WVS7,JOBSAT,Job satisfaction,All things considered how satisfied?,Work,,Q49\n\
        GSS,satfin,Financial satisfaction,,Finance,,\n";

    #[test]
    fn reads_rows_in_file_order() {
        let store = SurveyStore::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.records()[0].surveyid, "ESS9");
        assert_eq!(store.records()[2].question, "");
        assert_eq!(store.records()[1].variable, "Q49");
    }

    #[test]
    fn missing_columns_default_to_empty() {
        let store = SurveyStore::from_reader("varname,surveyid\nage,ESS9\n".as_bytes()).unwrap();
        assert_eq!(store.records()[0], SurveyRecord::new("ESS9", "age"));
    }

    #[test]
    fn exact_is_case_insensitive() {
        let store = SurveyStore::from_reader(CSV.as_bytes()).unwrap();
        let rows = store.exact("JobSat");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].surveyid, "WVS7");
    }

    #[test]
    fn containing_matches_substrings() {
        let store = SurveyStore::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(store.containing("SAT").len(), 3);
        assert!(store.containing("zzz").is_empty());
    }

    #[test]
    fn from_path_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SurveyStore::from_path(&dir.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn from_path_loads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey_questions.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let store = SurveyStore::from_path(&path).unwrap();
        assert_eq!(store.exact("satfin").len(), 1);
    }
}
