//! The turn-taking loop.
//!
//! One user message drives a small state machine:
//!
//! ```text
//! AwaitingModel ──final answer──▶ Finished
//!      │  ▲
//!  tools│  │results appended
//!      ▼  │
//! ExecutingTools
//! ```
//!
//! Every tool call requested by the model is answered by exactly one
//! tool-result turn, in request order, before the model is called again.
//! Tool failures become result text. The loop is bounded by a configurable
//! number of model calls.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use surveyor_config::AppConfig;
use surveyor_core::event::{DomainEvent, EventBus};
use surveyor_core::message::{Conversation, HistoryRecord, ToolCall, Turn};
use surveyor_core::provider::{Provider, ProviderRequest};
use surveyor_core::tool::{ToolResult, ToolSpec};
use surveyor_core::Error;
use surveyor_tools::ToolCatalog;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::persona::{DEFAULT_PERSONA, system_instruction};

/// Reply when the model keeps requesting tools past the cap.
pub const ITERATION_CAP_REPLY: &str = "I was unable to complete this request within the allowed \
number of steps. Please narrow the question or try again.";

/// Result text for calls skipped because the turn was cancelled.
pub const CANCELLED_RESULT: &str = "Cancelled before execution.";

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// The model produced a final answer
    Answered,
    /// The model-call cap was hit
    IterationCapReached,
    /// The language model could not be reached
    ModelUnavailable,
}

/// The result of one orchestrated turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub status: TurnStatus,
    /// Model calls made during this turn
    pub model_calls: u32,
    /// Tool calls resolved during this turn
    pub tool_calls: usize,
}

enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCall>),
    Finished(String, TurnStatus),
}

/// Drives the model and the tool catalog until a final answer is produced.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    catalog: Arc<ToolCatalog>,
    system_instruction: String,
    max_iterations: u32,
    parallel_tools: bool,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        catalog: Arc<ToolCatalog>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            catalog,
            system_instruction: DEFAULT_PERSONA.to_string(),
            max_iterations: 10,
            parallel_tools: false,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Build an orchestrator with every setting taken from configuration.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn Provider>,
        catalog: Arc<ToolCatalog>,
    ) -> Self {
        Self::new(provider, &config.default_model, catalog)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_system_instruction(system_instruction(&config.identity))
            .with_max_iterations(config.agent.max_iterations)
            .with_parallel_tools(config.agent.parallel_tools)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Set the maximum number of model calls per user message (at least 1).
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Resolve the calls of one batch concurrently.
    pub fn with_parallel_tools(mut self, enabled: bool) -> Self {
        self.parallel_tools = enabled;
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        self.event_bus.clone()
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Answer one message given role-tagged prior history.
    ///
    /// This is the entry point a chat front end uses. Fails only when a
    /// history record carries an unrecognized role.
    pub async fn respond(&self, history: &[HistoryRecord], message: &str) -> Result<String, Error> {
        let mut conversation = Conversation::from_history(history)?;
        debug!(
            prior_model_calls = conversation.assistant_turns(),
            "Rebuilt conversation from history"
        );
        let outcome = self
            .run(&mut conversation, message, &CancellationToken::new())
            .await?;
        Ok(outcome.reply)
    }

    /// Run one user turn to completion.
    ///
    /// Appends the user turn and everything the loop produces to
    /// `conversation`. Returns `Err(Error::Cancelled)` if `cancel` fires;
    /// cancellation is observed between model calls and between tool calls,
    /// never in the middle of one, and leaves the conversation well-formed.
    pub async fn run(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, Error> {
        if cancel.is_cancelled() {
            self.publish_cancelled(conversation);
            return Err(Error::Cancelled);
        }

        conversation.push(Turn::user(user_text));
        info!(
            conversation_id = %conversation.id,
            turns = conversation.len(),
            "Processing user message"
        );

        let tools = self.catalog.specs().to_vec();
        let mut model_calls: u32 = 0;
        let mut tool_calls: usize = 0;
        let mut state = LoopState::AwaitingModel;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if model_calls >= self.max_iterations {
                        warn!(
                            conversation_id = %conversation.id,
                            iterations = model_calls,
                            "Model-call cap reached, abandoning turn"
                        );
                        self.event_bus.publish(DomainEvent::IterationCapReached {
                            conversation_id: conversation.id.to_string(),
                            iterations: model_calls,
                            timestamp: Utc::now(),
                        });
                        LoopState::Finished(
                            ITERATION_CAP_REPLY.to_string(),
                            TurnStatus::IterationCapReached,
                        )
                    } else if cancel.is_cancelled() {
                        self.publish_cancelled(conversation);
                        return Err(Error::Cancelled);
                    } else {
                        model_calls += 1;
                        self.call_model(conversation, &tools, model_calls).await
                    }
                }

                LoopState::ExecutingTools(calls) => {
                    tool_calls += calls.len();
                    self.execute_batch(conversation, &calls, cancel).await?;
                    LoopState::AwaitingModel
                }

                LoopState::Finished(reply, status) => {
                    conversation.push(Turn::assistant(&reply));
                    info!(
                        conversation_id = %conversation.id,
                        status = ?status,
                        model_calls,
                        tool_calls,
                        "Turn finished"
                    );
                    return Ok(TurnOutcome {
                        reply,
                        status,
                        model_calls,
                        tool_calls,
                    });
                }
            };
        }
    }

    async fn call_model(
        &self,
        conversation: &mut Conversation,
        tools: &[ToolSpec],
        iteration: u32,
    ) -> LoopState {
        debug!(conversation_id = %conversation.id, iteration, "Calling model");

        let request = ProviderRequest {
            model: self.model.clone(),
            turns: conversation.with_system(&self.system_instruction),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: tools.to_vec(),
        };

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(conversation_id = %conversation.id, error = %e, "Model call failed");
                return LoopState::Finished(
                    format!(
                        "I could not reach the language model to answer this ({e}). \
                         Please try again in a moment."
                    ),
                    TurnStatus::ModelUnavailable,
                );
            }
        };

        self.event_bus.publish(DomainEvent::ModelResponded {
            conversation_id: conversation.id.to_string(),
            model: response.model.clone(),
            tokens_used: response.usage.as_ref().map_or(0, |u| u.total_tokens),
            requested_tools: response.tool_calls.len(),
            timestamp: Utc::now(),
        });

        if response.is_final() {
            return LoopState::Finished(response.content, TurnStatus::Answered);
        }

        debug!(
            tool_count = response.tool_calls.len(),
            "Model requested tools"
        );
        conversation.push(Turn::tool_request("", response.tool_calls.clone()));
        LoopState::ExecutingTools(response.tool_calls)
    }

    /// Resolve one batch and append its results in request order.
    async fn execute_batch(
        &self,
        conversation: &mut Conversation,
        calls: &[ToolCall],
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        if self.parallel_tools {
            if cancel.is_cancelled() {
                return Err(self.cancel_remaining(conversation, calls));
            }
            let results =
                futures::future::join_all(calls.iter().map(|call| self.execute_one(call))).await;
            for result in results {
                conversation.push(Turn::tool_result(result.call_id, result.output));
            }
            return Ok(());
        }

        for (i, call) in calls.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(self.cancel_remaining(conversation, &calls[i..]));
            }
            let result = self.execute_one(call).await;
            conversation.push(Turn::tool_result(result.call_id, result.output));
        }
        Ok(())
    }

    async fn execute_one(&self, call: &ToolCall) -> ToolResult {
        let start = Instant::now();
        let result = self.catalog.execute(call).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            tool = %call.name,
            success = result.success,
            duration_ms,
            "Tool executed"
        );
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: result.success,
            duration_ms,
            timestamp: Utc::now(),
        });
        result
    }

    /// Answer skipped calls so every request still has a result.
    fn cancel_remaining(&self, conversation: &mut Conversation, skipped: &[ToolCall]) -> Error {
        for call in skipped {
            conversation.push(Turn::tool_result(&call.id, CANCELLED_RESULT));
        }
        self.publish_cancelled(conversation);
        Error::Cancelled
    }

    fn publish_cancelled(&self, conversation: &Conversation) {
        info!(conversation_id = %conversation.id, "Turn cancelled");
        self.event_bus.publish(DomainEvent::TurnCancelled {
            conversation_id: conversation.id.to_string(),
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use surveyor_core::error::{ProviderError, SearchError, ToolError};
    use surveyor_core::search::{SearchHit, SurveySearch};
    use surveyor_core::words::{RelationKind, WordRelations};
    use surveyor_surveys::CrossSurveyLookup;

    /// Search stub: "timeout" fails, "slow" sleeps before answering.
    struct StubSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SurveySearch for StubSearch {
        fn name(&self) -> &str {
            "stub"
        }

        async fn query(&self, text: &str, _limit: usize) -> Result<Vec<SearchHit>, SearchError> {
            self.queries.lock().unwrap().push(text.to_string());
            if text == "timeout" {
                return Err(SearchError::Timeout(30));
            }
            if text == "slow" {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            let mut metadata = BTreeMap::new();
            metadata.insert("varname".to_string(), format!("{text}_var"));
            Ok(vec![SearchHit {
                document: format!("Question about {text}"),
                metadata,
                score: 1.0,
            }])
        }

        async fn count(&self) -> Result<usize, SearchError> {
            Ok(1)
        }
    }

    /// Word stub that cancels the turn when invoked.
    struct CancellingWords {
        token: CancellationToken,
    }

    #[async_trait]
    impl WordRelations for CancellingWords {
        async fn lookup(&self, _word: &str, _kind: RelationKind) -> Result<Vec<String>, ToolError> {
            self.token.cancel();
            Ok(vec!["wage".into()])
        }
    }

    fn catalog_with(words: Arc<dyn WordRelations>, search: Arc<StubSearch>) -> Arc<ToolCatalog> {
        let search: Arc<dyn SurveySearch> = search;
        Arc::new(ToolCatalog::with_collaborators(
            words,
            Some(search),
            CrossSurveyLookup::unavailable(),
        ))
    }

    fn stub_search() -> Arc<StubSearch> {
        Arc::new(StubSearch {
            queries: Mutex::new(Vec::new()),
        })
    }

    fn catalog() -> Arc<ToolCatalog> {
        catalog_with(
            Arc::new(CancellingWords {
                token: CancellationToken::new(),
            }),
            stub_search(),
        )
    }

    #[tokio::test]
    async fn search_then_answer_scenario() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_response(vec![tool_call(
                "call_1",
                "search_survey_questions",
                serde_json::json!({"query": "job satisfaction"}),
            )]),
            text_response("Here is what I found."),
        ]));
        let search = stub_search();
        let orchestrator = Orchestrator::new(
            provider.clone(),
            "mock-model",
            catalog_with(
                Arc::new(CancellingWords {
                    token: CancellationToken::new(),
                }),
                search.clone(),
            ),
        );

        let mut conversation = Conversation::new();
        let outcome = orchestrator
            .run(&mut conversation, "What is job satisfaction?", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.reply, "Here is what I found.");
        assert_eq!(outcome.status, TurnStatus::Answered);
        assert_eq!(outcome.model_calls, 2);
        assert_eq!(outcome.tool_calls, 1);

        let roles: Vec<&str> = conversation.turns.iter().map(|t| t.role()).collect();
        assert_eq!(roles, vec!["user", "assistant", "tool", "assistant"]);
        assert_eq!(conversation.turns[1].tool_calls()[0].name, "search_survey_questions");
        assert!(conversation.turns[2].content().contains("job satisfaction_var"));
        assert_eq!(conversation.turns[3], Turn::assistant("Here is what I found."));
        assert!(conversation.validate().is_ok());
        assert_eq!(*search.queries.lock().unwrap(), vec!["job satisfaction"]);

        // Each request carries exactly one leading system instruction and the catalog.
        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert!(matches!(requests[0].turns[0], Turn::System { .. }));
        assert_eq!(requests[0].turns.len(), 2);
        assert_eq!(requests[1].turns.len(), 4);
        assert_eq!(requests[0].tools.len(), 4);
    }

    #[tokio::test]
    async fn tool_timeout_becomes_result_text() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_response(vec![tool_call(
                "call_1",
                "search_survey_questions",
                serde_json::json!({"query": "timeout"}),
            )]),
            text_response("The search service is slow right now."),
        ]));
        let orchestrator = Orchestrator::new(provider, "mock-model", catalog());

        let mut conversation = Conversation::new();
        let outcome = orchestrator
            .run(&mut conversation, "Find pay questions", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::Answered);
        let result = conversation.turns[2].content();
        assert!(result.starts_with("Error:"));
        assert!(result.contains("timed out"));
    }

    #[tokio::test]
    async fn model_call_cap_terminates_loop() {
        let provider = Arc::new(ScriptedProvider::repeating(tool_call_response(vec![
            tool_call(
                "call_loop",
                "analyze_question",
                serde_json::json!({"question_text": "Are you employed?"}),
            ),
        ])));
        let events = Arc::new(EventBus::default());
        let mut rx = events.subscribe();
        let orchestrator = Orchestrator::new(provider.clone(), "mock-model", catalog())
            .with_max_iterations(3)
            .with_event_bus(events);

        let mut conversation = Conversation::new();
        let outcome = orchestrator
            .run(&mut conversation, "Loop forever", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::IterationCapReached);
        assert_eq!(outcome.reply, ITERATION_CAP_REPLY);
        assert_eq!(outcome.model_calls, 3);
        assert_eq!(provider.call_count(), 3);
        assert!(conversation.validate().is_ok());
        assert_eq!(conversation.last(), Some(&Turn::assistant(ITERATION_CAP_REPLY)));

        let mut saw_cap = false;
        while let Ok(event) = rx.try_recv() {
            if let DomainEvent::IterationCapReached { iterations, .. } = event.as_ref() {
                assert_eq!(*iterations, 3);
                saw_cap = true;
            }
        }
        assert!(saw_cap);
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments_keep_looping() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_response(vec![
                ToolCall {
                    id: "a".into(),
                    name: "launch_rockets".into(),
                    arguments: "{}".into(),
                },
                ToolCall {
                    id: "b".into(),
                    name: "analyze_question".into(),
                    arguments: "{not json".into(),
                },
            ]),
            text_response("Sorry, let me try differently."),
        ]));
        let orchestrator = Orchestrator::new(provider, "mock-model", catalog());

        let mut conversation = Conversation::new();
        let outcome = orchestrator
            .run(&mut conversation, "Help", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::Answered);
        assert_eq!(conversation.turns[2].content(), "Error: Tool not found: launch_rockets");
        assert!(conversation.turns[3].content().starts_with("Error: Invalid arguments for analyze_question"));
        assert!(conversation.validate().is_ok());
    }

    #[tokio::test]
    async fn provider_failure_ends_turn_with_reply() {
        let provider = Arc::new(ScriptedProvider::from_results(vec![Err(
            ProviderError::AuthenticationFailed("bad key".into()),
        )]));
        let orchestrator = Orchestrator::new(provider, "mock-model", catalog());

        let mut conversation = Conversation::new();
        let outcome = orchestrator
            .run(&mut conversation, "Hello", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, TurnStatus::ModelUnavailable);
        assert!(outcome.reply.contains("bad key"));
        assert_eq!(conversation.len(), 2);
    }

    #[tokio::test]
    async fn cancellation_between_tool_calls_fills_remaining_results() {
        let token = CancellationToken::new();
        let provider = Arc::new(ScriptedProvider::new(vec![tool_call_response(vec![
            tool_call("w", "find_related_words", serde_json::json!({"word": "pay"})),
            tool_call("a", "analyze_question", serde_json::json!({"question_text": "Q?"})),
            tool_call("c", "compare_across_surveys", serde_json::json!({"varname": "jobsat"})),
        ])]));
        let orchestrator = Orchestrator::new(
            provider.clone(),
            "mock-model",
            catalog_with(
                Arc::new(CancellingWords {
                    token: token.clone(),
                }),
                stub_search(),
            ),
        );

        let mut conversation = Conversation::new();
        let err = orchestrator
            .run(&mut conversation, "Synonyms for pay?", &token)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(provider.call_count(), 1);
        assert_eq!(conversation.turns[2].content(), "Related for 'pay': wage");
        assert_eq!(conversation.turns[3], Turn::tool_result("a", CANCELLED_RESULT));
        assert_eq!(conversation.turns[4], Turn::tool_result("c", CANCELLED_RESULT));
        assert!(conversation.validate().is_ok());
    }

    #[tokio::test]
    async fn cancelled_before_start_leaves_conversation_untouched() {
        let token = CancellationToken::new();
        token.cancel();
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let orchestrator = Orchestrator::new(provider.clone(), "mock-model", catalog());

        let mut conversation = Conversation::new();
        let err = orchestrator.run(&mut conversation, "Hi", &token).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(conversation.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn parallel_batch_keeps_request_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_response(vec![
                tool_call("slow", "search_survey_questions", serde_json::json!({"query": "slow"})),
                tool_call("fast", "search_survey_questions", serde_json::json!({"query": "fast"})),
            ]),
            text_response("Done."),
        ]));
        let orchestrator =
            Orchestrator::new(provider, "mock-model", catalog()).with_parallel_tools(true);

        let mut conversation = Conversation::new();
        orchestrator
            .run(&mut conversation, "Compare", &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(&conversation.turns[2], Turn::ToolResult { call_id, .. } if call_id == "slow"));
        assert!(matches!(&conversation.turns[3], Turn::ToolResult { call_id, .. } if call_id == "fast"));
        assert!(conversation.turns[2].content().contains("slow_var"));
        assert!(conversation.validate().is_ok());
    }

    #[tokio::test]
    async fn respond_maps_history() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_response("Use a 7-day window.")]));
        let orchestrator = Orchestrator::new(provider.clone(), "mock-model", catalog());

        let history = vec![
            HistoryRecord::new("user", "How do I ask about overtime?"),
            HistoryRecord::new("assistant", "Start with a reference period."),
        ];
        let reply = orchestrator
            .respond(&history, "Which period?")
            .await
            .unwrap();
        assert_eq!(reply, "Use a 7-day window.");

        let requests = provider.requests();
        let sent = &requests[0].turns;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[1], Turn::user("How do I ask about overtime?"));
        assert_eq!(sent[3], Turn::user("Which period?"));
    }

    #[tokio::test]
    async fn respond_rejects_unknown_role() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let orchestrator = Orchestrator::new(provider, "mock-model", catalog());
        let err = orchestrator
            .respond(&[HistoryRecord::new("moderator", "hi")], "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::History(_)));
    }

    #[test]
    fn from_config_applies_settings() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 4;
        config.identity.system_prompt_override = Some("Be brief.".into());
        let orchestrator = Orchestrator::from_config(
            &config,
            Arc::new(ScriptedProvider::new(vec![])),
            catalog(),
        );
        assert_eq!(orchestrator.max_iterations(), 4);
        assert_eq!(orchestrator.system_instruction, "Be brief.");
        assert_eq!(orchestrator.model, "gpt-4o-mini");
    }
}
