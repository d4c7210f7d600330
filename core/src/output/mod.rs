//! Output abstraction layer for the agent loop
//!
//! The agent reports progress through [`AgentOutput`] so that the console,
//! tests and any other front end can render it their own way.

use crate::llm::Usage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Error type returned by output handlers
pub type OutputResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Null output handler that discards all events
pub struct NullOutput;

#[async_trait]
impl AgentOutput for NullOutput {
    async fn emit_event(&self, _event: AgentEvent) -> OutputResult {
        Ok(())
    }
}

/// Status of tool execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolExecutionStatus {
    /// Tool is currently executing
    Executing,
    /// Tool completed successfully
    Success,
    /// Tool failed with an error
    Error,
}

/// Tool execution information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecutionInfo {
    /// Id of the tool call, as chosen by the model
    pub call_id: String,
    /// Tool name
    pub tool_name: String,
    /// Parsed arguments
    pub arguments: serde_json::Value,
    /// Current execution status
    pub status: ToolExecutionStatus,
    /// JSON text written to the transcript, once completed
    pub result: Option<String>,
    /// Timestamp of status change
    pub timestamp: DateTime<Utc>,
}

impl ToolExecutionInfo {
    pub fn started(call_id: &str, tool_name: &str, arguments: &serde_json::Value) -> Self {
        Self {
            call_id: call_id.to_string(),
            tool_name: tool_name.to_string(),
            arguments: arguments.clone(),
            status: ToolExecutionStatus::Executing,
            result: None,
            timestamp: Utc::now(),
        }
    }

    pub fn finished(mut self, status: ToolExecutionStatus, result: Option<String>) -> Self {
        self.status = status;
        self.result = result;
        self.timestamp = Utc::now();
        self
    }
}

/// Events that can be emitted while a query is processed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AgentEvent {
    /// A query was accepted and appended to the transcript
    QueryStarted { query_id: String, query: String },
    /// The model asked for one or more tools
    ToolCallsRequested { query_id: String, count: usize },
    /// Tool execution started
    ToolExecutionStarted { tool_info: ToolExecutionInfo },
    /// Tool execution completed
    ToolExecutionCompleted { tool_info: ToolExecutionInfo },
    /// Token usage updated (emitted after each LLM call)
    TokenUsageUpdated { usage: Usage },
    /// The model produced its final answer
    FinalAnswer { query_id: String, answer: String },
    /// The query failed and the transcript was rolled back
    QueryFailed { query_id: String, error: String },
}

/// Abstract output interface for agent execution
#[async_trait]
pub trait AgentOutput: Send + Sync {
    /// Emit an agent event
    async fn emit_event(&self, event: AgentEvent) -> OutputResult;

    /// Flush any buffered output
    async fn flush(&self) -> OutputResult {
        Ok(())
    }
}
