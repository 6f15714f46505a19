//! The Surveyor agent: a tool-using conversation loop over a language model.
//!
//! For each user message the [`Orchestrator`] sends the conversation and the
//! tool catalog to the model, runs whatever tools the model asks for, feeds
//! the results back, and repeats until the model answers in plain text or
//! the model-call cap is reached.

pub mod orchestrator;
pub mod persona;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{
    CANCELLED_RESULT, ITERATION_CAP_REPLY, Orchestrator, TurnOutcome, TurnStatus,
};
pub use persona::{DEFAULT_PERSONA, system_instruction};
