//! # Surveyor Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! Surveyor survey-design assistant. Every external collaborator (the
//! language model, the semantic index, the word-relation service) is a
//! trait here; implementations live in their own crates so tests can
//! substitute scripted stand-ins.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod search;
pub mod tool;
pub mod words;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, HistoryRecord, ToolCall, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use search::{SearchHit, SurveySearch};
pub use tool::{Tool, ToolName, ToolResult, ToolSpec};
pub use words::{RelationKind, WordRelations};
