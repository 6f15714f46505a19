//! Embedded semantic index over survey documents.
//!
//! The index file is produced offline: one JSON object per line with the
//! document text, its metadata and a precomputed embedding. At query time the
//! query text is embedded through the configured [`Provider`] and documents
//! are ranked by cosine similarity.
//!
//! Storage location: `~/.surveyor/data/survey_index.jsonl`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use surveyor_core::error::SearchError;
use surveyor_core::provider::{EmbeddingRequest, Provider};
use surveyor_core::search::{SearchHit, SurveySearch};
use tracing::{debug, warn};

/// One line of the index file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(default)]
    pub id: String,

    pub document: String,

    /// Values are stored as written; non-string values are rendered as JSON.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,

    pub embedding: Vec<f32>,
}

impl IndexEntry {
    fn to_hit(&self, score: f32) -> SearchHit {
        let metadata = self
            .metadata
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect();

        SearchHit {
            document: self.document.clone(),
            metadata,
            score,
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 when lengths differ, either vector is empty, or either has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// An in-memory vector index backed by a JSON-lines file.
pub struct EmbeddedIndex {
    entries: Vec<IndexEntry>,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
}

impl EmbeddedIndex {
    /// Load the index file. Corrupted lines are skipped.
    pub fn load(
        path: &Path,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Unavailable(format!("cannot read index at {}: {e}", path.display()))
        })?;

        let entries: Vec<IndexEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<IndexEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted index entry");
                    None
                }
            })
            .collect();

        debug!(path = %path.display(), count = entries.len(), "Survey index loaded");
        Ok(Self::from_entries(entries, embedder, embedding_model))
    }

    pub fn from_entries(
        entries: Vec<IndexEntry>,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            entries,
            embedder,
            embedding_model: embedding_model.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| SearchError::EmbeddingFailed(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::EmbeddingFailed("provider returned no embedding".into()))
    }

    /// Rank entries against an already-embedded query. Ties keep file order.
    pub fn rank(&self, query_embedding: &[f32], limit: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(&entry.embedding, query_embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
            .into_iter()
            .map(|(score, entry)| entry.to_hit(score))
            .collect()
    }
}

#[async_trait]
impl SurveySearch for EmbeddedIndex {
    fn name(&self) -> &str {
        "embedded"
    }

    async fn query(&self, text: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if limit == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let query_embedding = self.embed_query(text).await?;
        let hits = self.rank(&query_embedding, limit);
        debug!(limit, hits = hits.len(), "Semantic search");
        Ok(hits)
    }

    async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use surveyor_core::error::ProviderError;
    use surveyor_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    /// Embeds text on two axes: "job" and "health".
    struct KeywordEmbedder;

    #[async_trait]
    impl Provider for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("embedding only".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            let embeddings = request
                .inputs
                .iter()
                .map(|t| {
                    let t = t.to_lowercase();
                    vec![
                        if t.contains("job") { 1.0 } else { 0.0 },
                        if t.contains("health") { 1.0 } else { 0.0 },
                    ]
                })
                .collect();
            Ok(EmbeddingResponse {
                embeddings,
                model: request.model,
                usage: None,
            })
        }
    }

    fn entry(id: &str, varname: &str, embedding: Vec<f32>) -> IndexEntry {
        let mut metadata = BTreeMap::new();
        metadata.insert("varname".to_string(), serde_json::json!(varname));
        metadata.insert("surveyid".to_string(), serde_json::json!("ESS9"));
        IndexEntry {
            id: id.into(),
            document: format!("Question about {varname}"),
            metadata,
            embedding,
        }
    }

    fn index() -> EmbeddedIndex {
        EmbeddedIndex::from_entries(
            vec![
                entry("1", "health", vec![0.0, 1.0]),
                entry("2", "jobsat", vec![1.0, 0.0]),
                entry("3", "jobsec", vec![1.0, 0.0]),
                entry("4", "mixed", vec![0.7, 0.7]),
            ],
            Arc::new(KeywordEmbedder),
            "text-embedding-3-small",
        )
    }

    #[test]
    fn cosine_identical_vectors() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_and_mismatched() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn query_ranks_by_similarity_and_keeps_file_order_on_ties() {
        let hits = index().query("job satisfaction", 3).await.unwrap();
        let names: Vec<&str> = hits.iter().map(|h| h.meta("varname")).collect();
        assert_eq!(names, vec!["jobsat", "jobsec", "mixed"]);
        assert!(hits[0].score > hits[2].score);
    }

    #[tokio::test]
    async fn zero_limit_returns_nothing() {
        assert!(index().query("job", 0).await.unwrap().is_empty());
        assert_eq!(index().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn embedding_failure_is_reported() {
        struct NoEmbeddings;

        #[async_trait]
        impl Provider for NoEmbeddings {
            fn name(&self) -> &str {
                "none"
            }

            async fn complete(&self, _r: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
                Err(ProviderError::NotConfigured("none".into()))
            }
        }

        let idx = EmbeddedIndex::from_entries(
            vec![entry("1", "jobsat", vec![1.0, 0.0])],
            Arc::new(NoEmbeddings),
            "m",
        );
        let err = idx.query("job", 5).await.unwrap_err();
        assert!(matches!(err, SearchError::EmbeddingFailed(_)));
    }

    #[test]
    fn load_skips_corrupted_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("survey_index.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"{{"id":"a","document":"Q","metadata":{{"varname":"jobsat","year":2018}},"embedding":[1.0,0.0]}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file).unwrap();

        let idx = EmbeddedIndex::load(&path, Arc::new(KeywordEmbedder), "m").unwrap();
        assert_eq!(idx.len(), 1);
        let hit = &idx.rank(&[1.0, 0.0], 1)[0];
        assert_eq!(hit.meta("year"), "2018");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = EmbeddedIndex::load(&dir.path().join("nope.jsonl"), Arc::new(KeywordEmbedder), "m");
        assert!(matches!(result, Err(SearchError::Unavailable(_))));
    }
}
