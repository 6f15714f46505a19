//! Turn and Conversation domain types.
//!
//! These are the value objects that flow through one orchestrated exchange:
//! the caller's history becomes turns, the model appends assistant turns,
//! and every requested tool call is answered by exactly one tool-result turn.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HistoryError;

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A structured request from the model to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to invoke, exactly as the model spelled it
    pub name: String,

    /// Arguments as a raw JSON string
    pub arguments: String,
}

/// One message unit in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    /// System instruction (persona, rules)
    System { content: String },

    /// The end user
    User { content: String },

    /// The model. `tool_calls` is empty for a final answer.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },

    /// The output of one tool call
    ToolResult { call_id: String, content: String },
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Turn::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Turn::User {
            content: content.into(),
        }
    }

    /// A final natural-language answer.
    pub fn assistant(content: impl Into<String>) -> Self {
        Turn::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// An assistant turn that requests tool calls.
    pub fn tool_request(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Turn::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Turn::ToolResult {
            call_id: call_id.into(),
            content: content.into(),
        }
    }

    /// The text content of this turn.
    pub fn content(&self) -> &str {
        match self {
            Turn::System { content }
            | Turn::User { content }
            | Turn::Assistant { content, .. }
            | Turn::ToolResult { content, .. } => content,
        }
    }

    /// Role tag used on the wire and in logs.
    pub fn role(&self) -> &'static str {
        match self {
            Turn::System { .. } => "system",
            Turn::User { .. } => "user",
            Turn::Assistant { .. } => "assistant",
            Turn::ToolResult { .. } => "tool",
        }
    }

    /// Tool calls requested by this turn (empty for anything but a tool-requesting assistant turn).
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Turn::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// A role-tagged record as supplied by a chat front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub role: String,
    pub content: String,
}

impl HistoryRecord {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Map this record to a turn. Only `user` and `assistant` are accepted.
    pub fn to_turn(&self, index: usize) -> Result<Turn, HistoryError> {
        match self.role.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Turn::user(&self.content)),
            "assistant" => Ok(Turn::assistant(&self.content)),
            _ => Err(HistoryError::UnknownRole {
                index,
                role: self.role.clone(),
            }),
        }
    }
}

/// An ordered sequence of turns owned by one orchestrator invocation.
///
/// The system instruction is not stored here; it is prepended to every
/// model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered turns
    pub turns: Vec<Turn>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a conversation from caller-supplied role-tagged records.
    ///
    /// Fails on the first record whose role is not `user` or `assistant`.
    pub fn from_history(records: &[HistoryRecord]) -> Result<Self, HistoryError> {
        let mut conv = Self::new();
        for (index, record) in records.iter().enumerate() {
            conv.turns.push(record.to_turn(index)?);
        }
        Ok(conv)
    }

    /// Add a turn to the conversation.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of assistant turns already present.
    pub fn assistant_turns(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::Assistant { .. }))
            .count()
    }

    /// The turns to send to the model: the system instruction followed by the history.
    pub fn with_system(&self, system_instruction: &str) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(self.turns.len() + 1);
        turns.push(Turn::system(system_instruction));
        turns.extend(self.turns.iter().cloned());
        turns
    }

    /// Check the structural invariant: a system turn may only lead, and every
    /// tool-requesting assistant turn is followed by exactly one result per
    /// call, in request order.
    pub fn validate(&self) -> Result<(), String> {
        let mut pending: std::collections::VecDeque<&str> = std::collections::VecDeque::new();

        for (i, turn) in self.turns.iter().enumerate() {
            match turn {
                Turn::ToolResult { call_id, .. } => match pending.pop_front() {
                    Some(expected) if expected == call_id => {}
                    Some(expected) => {
                        return Err(format!(
                            "turn {i}: result for '{call_id}' but '{expected}' was expected"
                        ));
                    }
                    None => return Err(format!("turn {i}: tool result without a pending call")),
                },
                other => {
                    if let Some(expected) = pending.front() {
                        return Err(format!(
                            "turn {i}: {} turn before result for '{expected}'",
                            other.role()
                        ));
                    }
                    if matches!(other, Turn::System { .. }) && i != 0 {
                        return Err(format!("turn {i}: system turn must come first"));
                    }
                    pending.extend(other.tool_calls().iter().map(|c| c.id.as_str()));
                }
            }
        }

        match pending.front() {
            Some(expected) => Err(format!("missing result for '{expected}'")),
            None => Ok(()),
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
