//! Terminal rendering of agent events

use async_trait::async_trait;
use console::style;
use docs_agent_core::output::{
    AgentEvent, AgentOutput, OutputResult, ToolExecutionInfo, ToolExecutionStatus,
};
use std::io::Write;
use tracing::debug;

/// Longest tool result preview shown in verbose mode
const RESULT_PREVIEW_CHARS: usize = 200;

/// Output handler that prints tool activity to stdout
pub struct ConsoleOutput {
    verbose: bool,
}

impl ConsoleOutput {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// `-> Calling tool name with {...}`
pub fn format_tool_call(tool_info: &ToolExecutionInfo) -> String {
    format!(
        "{} {} with {}",
        style("-> Calling tool").cyan(),
        style(&tool_info.tool_name).bold(),
        tool_info.arguments
    )
}

/// One-line outcome of a finished tool call
pub fn format_tool_result(tool_info: &ToolExecutionInfo) -> String {
    let text = tool_info.result.as_deref().unwrap_or("");
    match tool_info.status {
        ToolExecutionStatus::Error => format!(
            "   {} {}",
            style(format!("{} failed:", tool_info.tool_name)).red(),
            text
        ),
        _ => format!(
            "   {} {}",
            style(format!("{} returned", tool_info.tool_name)).dim(),
            preview(text, RESULT_PREVIEW_CHARS)
        ),
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

#[async_trait]
impl AgentOutput for ConsoleOutput {
    async fn emit_event(&self, event: AgentEvent) -> OutputResult {
        match event {
            AgentEvent::QueryStarted { query_id, query } => {
                debug!("Query {} started: {}", query_id, query);
            }

            AgentEvent::ToolCallsRequested { count, .. } => {
                debug!("Model requested {} tool call(s)", count);
            }

            AgentEvent::ToolExecutionStarted { tool_info } => {
                println!("{}", format_tool_call(&tool_info));
            }

            AgentEvent::ToolExecutionCompleted { tool_info } => {
                if self.verbose || tool_info.status == ToolExecutionStatus::Error {
                    println!("{}", format_tool_result(&tool_info));
                }
            }

            AgentEvent::TokenUsageUpdated { usage } => {
                debug!(
                    "Tokens: {} input + {} output = {} total",
                    usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
                );
            }

            // The session prints answers and errors itself
            AgentEvent::FinalAnswer { .. } | AgentEvent::QueryFailed { .. } => {}
        }

        Ok(())
    }

    async fn flush(&self) -> OutputResult {
        std::io::stdout().flush().map_err(|e| e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_call_line() {
        let info = ToolExecutionInfo::started("c1", "search_docs", &json!({"query": "nginx"}));
        let line = console::strip_ansi_codes(&format_tool_call(&info)).to_string();
        assert_eq!(line, r#"-> Calling tool search_docs with {"query":"nginx"}"#);
    }

    #[test]
    fn test_result_preview_is_truncated() {
        let long = "x".repeat(RESULT_PREVIEW_CHARS + 10);
        let info = ToolExecutionInfo::started("c1", "search_docs", &json!({}))
            .finished(ToolExecutionStatus::Success, Some(long));
        let line = console::strip_ansi_codes(&format_tool_result(&info)).to_string();
        assert!(line.ends_with("..."));
        assert!(line.starts_with("   search_docs returned "));

        assert_eq!(preview("short", 10), "short");
    }

    #[test]
    fn test_failed_result_is_not_truncated() {
        let info = ToolExecutionInfo::started("c1", "broken", &json!({}))
            .finished(ToolExecutionStatus::Error, Some("boom".to_string()));
        let line = console::strip_ansi_codes(&format_tool_result(&info)).to_string();
        assert_eq!(line, "   broken failed: boom");
    }

    #[tokio::test]
    async fn test_every_event_is_handled() {
        let output = ConsoleOutput::new(false);
        let info = ToolExecutionInfo::started("c1", "search_docs", &json!({}));
        let events = vec![
            AgentEvent::QueryStarted {
                query_id: "q1".to_string(),
                query: "hello".to_string(),
            },
            AgentEvent::ToolCallsRequested {
                query_id: "q1".to_string(),
                count: 1,
            },
            AgentEvent::ToolExecutionStarted {
                tool_info: info.clone(),
            },
            AgentEvent::ToolExecutionCompleted {
                tool_info: info.finished(ToolExecutionStatus::Success, Some("{}".to_string())),
            },
            AgentEvent::TokenUsageUpdated {
                usage: Default::default(),
            },
            AgentEvent::FinalAnswer {
                query_id: "q1".to_string(),
                answer: "done".to_string(),
            },
            AgentEvent::QueryFailed {
                query_id: "q2".to_string(),
                error: "boom".to_string(),
            },
        ];
        for event in events {
            assert!(output.emit_event(event).await.is_ok());
        }
        assert!(output.flush().await.is_ok());
    }
}
