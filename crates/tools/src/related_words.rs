//! Word-relation lookup backed by the Datamuse API.
//!
//! Useful when refining the wording of a survey question: synonyms, words in
//! the same general space, or words that tend to appear alongside the input.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use surveyor_core::error::ToolError;
use surveyor_core::tool::{Tool, ToolName};
use surveyor_core::words::{RelationKind, WordRelations};
use tracing::{debug, warn};

/// Hard upper bound on words requested per lookup.
pub const MAX_WORD_RESULTS: usize = 15;

/// HTTP client for `https://api.datamuse.com/words`.
pub struct DatamuseClient {
    base_url: String,
    max_results: usize,
    timeout: Duration,
    client: reqwest::Client,
}

impl DatamuseClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_results: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.into(),
            max_results: max_results.clamp(1, MAX_WORD_RESULTS),
            timeout,
            client,
        }
    }

    pub fn from_config(config: &surveyor_config::ToolsConfig) -> Self {
        Self::new(
            &config.word_service_url,
            Duration::from_secs(config.word_timeout_secs),
            config.word_max_results,
        )
    }

    /// Datamuse query parameter for a relation kind.
    pub fn relation_code(kind: RelationKind) -> &'static str {
        match kind {
            RelationKind::Synonyms => "rel_syn",
            RelationKind::Related => "ml",
            RelationKind::Associated => "rel_trg",
        }
    }

    fn request_error(&self, e: reqwest::Error) -> ToolError {
        if e.is_timeout() {
            ToolError::Timeout {
                tool_name: ToolName::FindRelatedWords.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            ToolError::ExecutionFailed {
                tool_name: ToolName::FindRelatedWords.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DatamuseWord {
    word: String,
}

#[async_trait]
impl WordRelations for DatamuseClient {
    async fn lookup(&self, word: &str, kind: RelationKind) -> Result<Vec<String>, ToolError> {
        let code = Self::relation_code(kind);
        debug!(code, word, "Querying Datamuse");

        let max = self.max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[(code, word), ("max", max.as_str())])
            .send()
            .await
            .map_err(|e| self.request_error(e))?
            .error_for_status()
            .map_err(|e| self.request_error(e))?;

        let words: Vec<DatamuseWord> = response.json().await.map_err(|e| self.request_error(e))?;
        Ok(words.into_iter().map(|w| w.word).collect())
    }
}

#[derive(Debug, Deserialize)]
pub struct FindRelatedWordsArgs {
    pub word: String,
    #[serde(default)]
    pub relation_type: Option<String>,
}

/// `find_related_words(word, relation_type)`
pub struct FindRelatedWordsTool {
    relations: Arc<dyn WordRelations>,
}

impl FindRelatedWordsTool {
    pub fn new(relations: Arc<dyn WordRelations>) -> Self {
        Self { relations }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Tool for FindRelatedWordsTool {
    const NAME: ToolName = ToolName::FindRelatedWords;
    type Args = FindRelatedWordsArgs;

    fn description(&self) -> &'static str {
        "Find words related to the input word. Useful when refining survey question wording. \
         relation_type is one of \"synonyms\" (similar meaning), \"related\" (same general \
         space) or \"associated\" (tend to appear alongside the input)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "word": {
                    "type": "string",
                    "description": "The word to find relations for"
                },
                "relation_type": {
                    "type": "string",
                    "enum": ["synonyms", "related", "associated"],
                    "description": "Kind of relation (default: related)",
                    "default": "related"
                }
            },
            "required": ["word"]
        })
    }

    async fn run(&self, args: FindRelatedWordsArgs) -> Result<String, ToolError> {
        let kind = RelationKind::parse_lenient(args.relation_type.as_deref());
        let word = args.word;

        let words = match self.relations.lookup(&word, kind).await {
            Ok(words) => words,
            Err(e) => {
                warn!(error = %e, "Word-relation lookup failed");
                return Ok(format!("Could not reach the word-finding service. Error: {e}"));
            }
        };

        if words.is_empty() {
            return Ok(format!("No {} words found for '{word}'.", kind.as_str()));
        }

        Ok(format!(
            "{} for '{word}': {}",
            capitalize(kind.as_str()),
            words.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct StubRelations {
        result: Result<Vec<String>, ToolError>,
        seen: Mutex<Vec<(String, RelationKind)>>,
    }

    impl StubRelations {
        fn new(result: Result<Vec<String>, ToolError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl WordRelations for StubRelations {
        async fn lookup(&self, word: &str, kind: RelationKind) -> Result<Vec<String>, ToolError> {
            self.seen.lock().unwrap().push((word.to_string(), kind));
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn formats_word_list() {
        let stub = StubRelations::new(Ok(vec!["glad".into(), "content".into()]));
        let tool = FindRelatedWordsTool::new(stub.clone());
        let args = FindRelatedWordsTool::parse_arguments(
            r#"{"word":"happy","relation_type":"synonyms"}"#,
        )
        .unwrap();
        let out = tool.run(args).await.unwrap();
        assert_eq!(out, "Synonyms for 'happy': glad, content");
        assert_eq!(
            stub.seen.lock().unwrap()[0],
            ("happy".to_string(), RelationKind::Synonyms)
        );
    }

    #[tokio::test]
    async fn unknown_relation_defaults_to_related() {
        let stub = StubRelations::new(Ok(vec![]));
        let tool = FindRelatedWordsTool::new(stub.clone());
        let args =
            FindRelatedWordsTool::parse_arguments(r#"{"word":"wage","relation_type":"antonyms"}"#)
                .unwrap();
        assert_eq!(
            tool.run(args).await.unwrap(),
            "No related words found for 'wage'."
        );
        assert_eq!(stub.seen.lock().unwrap()[0].1, RelationKind::Related);
    }

    #[tokio::test]
    async fn collaborator_failure_becomes_text() {
        let stub = StubRelations::new(Err(ToolError::Timeout {
            tool_name: "find_related_words".into(),
            timeout_secs: 10,
        }));
        let tool = FindRelatedWordsTool::new(stub);
        let args = FindRelatedWordsTool::parse_arguments(r#"{"word":"pay"}"#).unwrap();
        let out = tool.run(args).await.unwrap();
        assert!(out.starts_with("Could not reach the word-finding service. Error:"));
        assert!(out.contains("10s"));
    }

    #[test]
    fn missing_word_is_rejected() {
        assert!(FindRelatedWordsTool::parse_arguments(r#"{"relation_type":"related"}"#).is_err());
    }

    #[test]
    fn relation_codes() {
        assert_eq!(DatamuseClient::relation_code(RelationKind::Synonyms), "rel_syn");
        assert_eq!(DatamuseClient::relation_code(RelationKind::Related), "ml");
        assert_eq!(DatamuseClient::relation_code(RelationKind::Associated), "rel_trg");
    }

    #[tokio::test]
    async fn client_sends_relation_and_cap() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let body = r#"[{"word":"glad","score":100},{"word":"joyful","score":90}]"#;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            request
        });

        let client = DatamuseClient::new(
            format!("http://{addr}/words"),
            Duration::from_secs(5),
            15,
        );
        let words = client.lookup("happy", RelationKind::Synonyms).await.unwrap();
        assert_eq!(words, vec!["glad", "joyful"]);

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /words?rel_syn=happy&max=15 "));
    }

    #[test]
    fn configured_word_cap_is_clamped() {
        let client = DatamuseClient::new("http://localhost/words", Duration::from_secs(1), 500);
        assert_eq!(client.max_results, MAX_WORD_RESULTS);
        let client = DatamuseClient::new("http://localhost/words", Duration::from_secs(1), 0);
        assert_eq!(client.max_results, 1);
    }

    #[tokio::test]
    async fn client_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = DatamuseClient::new(
            format!("http://{addr}/words"),
            Duration::from_millis(200),
            15,
        );
        let err = client.lookup("pay", RelationKind::Related).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }
}
