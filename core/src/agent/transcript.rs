//! Ordered conversation transcript

use crate::error::{AgentError, Result};
use crate::llm::{LlmMessage, MessageRole};
use std::collections::HashSet;

/// Append-only list of messages sent to the model.
///
/// A tool message is only accepted when its `tool_call_id` names a tool call
/// of an earlier assistant message. The one non-append operation is
/// [`Transcript::rollback_to`], used to undo a failed query.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<LlmMessage>,
    call_ids: HashSet<String>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript seeded with a single system message
    pub fn with_system<S: Into<String>>(prompt: S) -> Self {
        let mut transcript = Self::new();
        transcript.messages.push(LlmMessage::system(prompt));
        transcript
    }

    /// Append a message
    pub fn push(&mut self, message: LlmMessage) -> Result<()> {
        if message.role == MessageRole::Tool {
            let answered = message
                .tool_call_id
                .as_ref()
                .is_some_and(|id| self.call_ids.contains(id));
            if !answered {
                return Err(AgentError::OrphanToolResult {
                    tool_call_id: message.tool_call_id.clone().unwrap_or_default(),
                }
                .into());
            }
        }

        for call in message.tool_calls() {
            self.call_ids.insert(call.id.clone());
        }
        self.messages.push(message);
        Ok(())
    }

    /// Drop every message after the first `len`
    pub fn rollback_to(&mut self, len: usize) {
        if len >= self.messages.len() {
            return;
        }
        self.messages.truncate(len);
        self.call_ids = self
            .messages
            .iter()
            .flat_map(|message| message.tool_calls().iter().map(|call| call.id.clone()))
            .collect();
    }

    pub fn messages(&self) -> &[LlmMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&LlmMessage> {
        self.messages.last()
    }
}
