//! Line-oriented interactive session
//!
//! Reads one query per line, runs it through the agent and prints the answer.
//! The session is generic over its input and output streams so it can be
//! driven by stdin/stdout or by in-memory buffers.

use anyhow::Result;
use console::style;
use docs_agent_core::{Agent, Error};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Prompt cue printed before every read
pub const PROMPT: &str = "[YOU] > ";

/// Lifecycle of an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Processing,
    ShuttingDown,
}

/// Classified operator input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Exit,
    Blank,
    Query(String),
}

/// Classify one line of operator input
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        Input::Blank
    } else if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        Input::Exit
    } else {
        Input::Query(trimmed.to_string())
    }
}

/// Counters reported when the session ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub answered: usize,
    pub failed: usize,
}

pub struct InteractiveSession<R, W> {
    input: R,
    output: W,
    state: SessionState,
}

impl<R, W> InteractiveSession<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Drive the read/answer loop until `exit`, `quit` or end of input.
    /// The agent is shut down on every path out of the loop.
    pub async fn run(&mut self, agent: &mut Agent) -> Result<SessionSummary> {
        let result = self.read_loop(agent).await;

        self.transition(SessionState::ShuttingDown);
        if let Err(e) = agent.shutdown().await {
            tracing::warn!("Failed to shut down tool provider: {}", e);
        }

        result
    }

    /// Report a startup failure and end the session without reading input
    pub async fn abort(&mut self, error: &anyhow::Error) -> Result<()> {
        self.transition(SessionState::ShuttingDown);
        let text = format!("{}\n", format_startup_error(error));
        self.write(&text).await
    }

    async fn read_loop(&mut self, agent: &mut Agent) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();

        let banner = format!(
            "Connected to {} with {} tool(s) using {}. Type 'exit' or 'quit' to leave.\n\n",
            style(agent.provider_name()).bold(),
            agent.catalog().len(),
            agent.model_name()
        );
        self.write(&banner).await?;
        self.transition(SessionState::AwaitingInput);

        loop {
            self.write(PROMPT).await?;

            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                // End of input
                self.write("\n").await?;
                return Ok(summary);
            }

            let query = match parse_input(&line) {
                Input::Exit => return Ok(summary),
                Input::Blank => continue,
                Input::Query(query) => query,
            };

            self.transition(SessionState::Processing);
            match agent.process_query(&query).await {
                Ok(outcome) => {
                    summary.answered += 1;
                    let text = format!("\n{}\n{}\n\n", style("[AGENT]").green().bold(), outcome.answer);
                    self.write(&text).await?;
                }
                Err(e) => {
                    summary.failed += 1;
                    let text = format!("{}\n", format_error(&e));
                    self.write(&text).await?;
                }
            }
            self.transition(SessionState::AwaitingInput);
        }
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;
        Ok(())
    }
}

/// `[ERROR] Kind: message`
pub fn format_error(error: &Error) -> String {
    format!(
        "{} {}: {}",
        style("[ERROR]").red().bold(),
        error.kind(),
        error
    )
}

/// Same as [`format_error`] for errors that crossed the CLI boundary
pub fn format_startup_error(error: &anyhow::Error) -> String {
    let kind = error
        .downcast_ref::<Error>()
        .map(|e| e.kind().label())
        .unwrap_or("Error");
    format!("{} {}: {:#}", style("[ERROR]").red().bold(), kind, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docs_agent_core::error::LlmError;
    use docs_agent_core::llm::{
        ChatOptions, LlmClient, LlmMessage, LlmResponse, MessageRole, ToolDefinition,
    };
    use docs_agent_core::{AgentBuilder, ToolProvider, ToolSpec};
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex};

    /// Echoes the last user message; fails when it contains "fail"
    struct EchoLlm;

    #[async_trait]
    impl LlmClient for EchoLlm {
        async fn chat_completion(
            &self,
            messages: &[LlmMessage],
            _tools: &[ToolDefinition],
            _options: Option<ChatOptions>,
        ) -> docs_agent_core::Result<LlmResponse> {
            let last = messages
                .iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| m.content.clone())
                .unwrap_or_default();
            if last.contains("fail") {
                return Err(LlmError::ApiError {
                    message: "upstream unavailable".to_string(),
                }
                .into());
            }
            Ok(LlmResponse {
                message: LlmMessage::assistant(format!("echo: {}", last)),
                usage: None,
                model: "echo".to_string(),
                finish_reason: None,
            })
        }

        fn model_name(&self) -> &str {
            "echo"
        }

        fn provider_name(&self) -> &str {
            "test"
        }
    }

    struct StubProvider {
        shutdowns: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl ToolProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn list_tools(&mut self) -> docs_agent_core::Result<Vec<ToolSpec>> {
            Ok(vec![ToolSpec::new(
                "search_docs",
                "Search documentation",
                json!({"type": "object"}),
            )])
        }

        async fn call_tool(
            &mut self,
            _name: &str,
            _arguments: Map<String, Value>,
        ) -> docs_agent_core::Result<Value> {
            Ok(json!({"result": "doc text"}))
        }

        async fn shutdown(&mut self) -> docs_agent_core::Result<()> {
            *self.shutdowns.lock().unwrap() += 1;
            Ok(())
        }
    }

    async fn agent() -> (Agent, Arc<Mutex<usize>>) {
        let shutdowns = Arc::new(Mutex::new(0));
        let agent = AgentBuilder::new(Arc::new(EchoLlm))
            .build(Box::new(StubProvider {
                shutdowns: shutdowns.clone(),
            }))
            .await
            .unwrap();
        (agent, shutdowns)
    }

    async fn drive(script: &str) -> (String, SessionSummary, SessionState, usize, usize) {
        let (mut agent, shutdowns) = agent().await;
        let mut output = Vec::new();
        let (summary, state) = {
            let mut session = InteractiveSession::new(script.as_bytes(), &mut output);
            assert_eq!(session.state(), SessionState::Idle);
            let summary = session.run(&mut agent).await.unwrap();
            (summary, session.state())
        };
        let text = console::strip_ansi_codes(&String::from_utf8(output).unwrap()).to_string();
        let shutdown_count = *shutdowns.lock().unwrap();
        (text, summary, state, agent.transcript().len(), shutdown_count)
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("exit"), Input::Exit);
        assert_eq!(parse_input("  QUIT \n"), Input::Exit);
        assert_eq!(parse_input("Exit"), Input::Exit);
        assert_eq!(parse_input("   \n"), Input::Blank);
        assert_eq!(parse_input(""), Input::Blank);
        assert_eq!(
            parse_input("  how do I exit vim?\n"),
            Input::Query("how do I exit vim?".to_string())
        );
    }

    #[tokio::test]
    async fn test_queries_until_exit() {
        let (text, summary, state, transcript_len, shutdowns) =
            drive("hello\n\n   \nexit\nnever read\n").await;

        assert_eq!(summary, SessionSummary { answered: 1, failed: 0 });
        assert_eq!(state, SessionState::ShuttingDown);
        assert!(text.starts_with("Connected to stub with 1 tool(s) using echo."));
        assert!(text.contains("[AGENT]\necho: hello"));
        assert!(!text.contains("never read"));
        // prompt shown for: hello, blank, blank, exit
        assert_eq!(text.matches(PROMPT).count(), 4);
        assert_eq!(transcript_len, 3);
        assert_eq!(shutdowns, 1);
    }

    #[tokio::test]
    async fn test_abort_reports_and_shuts_down() {
        let mut output = Vec::new();
        let mut session = InteractiveSession::new("hello\n".as_bytes(), &mut output);
        session
            .abort(&anyhow::anyhow!("server did not start"))
            .await
            .unwrap();
        assert_eq!(session.state(), SessionState::ShuttingDown);

        let text = console::strip_ansi_codes(&String::from_utf8(output).unwrap()).to_string();
        assert_eq!(text, "[ERROR] Error: server did not start\n");
    }

    #[tokio::test]
    async fn test_eof_ends_session() {
        let (text, summary, state, _, shutdowns) = drive("first\nsecond").await;

        assert_eq!(summary.answered, 2);
        assert_eq!(state, SessionState::ShuttingDown);
        assert!(text.contains("echo: first"));
        assert!(text.contains("echo: second"));
        assert_eq!(shutdowns, 1);
    }

    #[tokio::test]
    async fn test_failed_query_keeps_session_alive() {
        let (text, summary, _, transcript_len, _) =
            drive("please fail\nstill here\nquit\n").await;

        assert_eq!(summary, SessionSummary { answered: 1, failed: 1 });
        assert!(text.contains("[ERROR] LLMRequestError:"));
        assert!(text.contains("upstream unavailable"));
        assert!(text.contains("echo: still here"));
        // system + one successful exchange; the failed one was rolled back
        assert_eq!(transcript_len, 3);
    }
}
