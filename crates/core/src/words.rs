//! External lexical lookup for related words.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Which kind of relation to look up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Words with similar meaning
    Synonyms,
    /// Words in the same general space
    #[default]
    Related,
    /// Words that tend to appear alongside the input
    Associated,
}

impl RelationKind {
    /// Parse leniently: unknown or missing kinds fall back to `Related`.
    pub fn parse_lenient(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("synonyms") => RelationKind::Synonyms,
            Some("associated") => RelationKind::Associated,
            _ => RelationKind::Related,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Synonyms => "synonyms",
            RelationKind::Related => "related",
            RelationKind::Associated => "associated",
        }
    }
}

/// The word-relation collaborator.
#[async_trait]
pub trait WordRelations: Send + Sync {
    /// Return up to the backend's result cap of words related to `word`.
    async fn lookup(&self, word: &str, kind: RelationKind) -> Result<Vec<String>, ToolError>;
}
