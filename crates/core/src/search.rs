//! Vector-similarity search over survey documents.
//!
//! Given free text, a `SurveySearch` implementation returns the most
//! semantically similar stored survey documents with their metadata.
//! The index itself is built offline; implementations only read it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SearchError;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The stored document text
    pub document: String,

    /// Metadata attached at index time (`varname`, `surveyid`, `classification`, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,

    /// Similarity score (higher is closer)
    #[serde(default)]
    pub score: f32,
}

impl SearchHit {
    /// A metadata value, or `N/A` when absent.
    pub fn meta(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("N/A")
    }
}

/// The semantic search collaborator.
///
/// Implementations must be read-only and shareable across conversations.
#[async_trait]
pub trait SurveySearch: Send + Sync {
    /// A human-readable name for this backend.
    fn name(&self) -> &str;

    /// Return at most `limit` hits, most similar first.
    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Number of indexed documents.
    async fn count(&self) -> Result<usize, SearchError>;
}
