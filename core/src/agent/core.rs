//! Core agent loop

use crate::agent::config::AgentConfig;
use crate::agent::execution::QueryOutcome;
use crate::agent::prompt::resolve_system_prompt;
use crate::agent::transcript::Transcript;
use crate::error::{AgentError, Result, ToolError};
use crate::llm::{ChatOptions, LlmClient, LlmMessage, ToolCallRequest, Usage};
use crate::output::{AgentEvent, AgentOutput, ToolExecutionInfo, ToolExecutionStatus};
use crate::tools::{unwrap_envelope, ToolCatalog, ToolProvider};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A conversational session bound to one LLM client and one tool provider.
///
/// The catalog is fetched once by [`Agent::initialize`] and never refreshed.
/// Queries run strictly one at a time through `&mut self`.
pub struct Agent {
    config: AgentConfig,
    llm_client: Arc<dyn LlmClient>,
    provider: Box<dyn ToolProvider>,
    catalog: ToolCatalog,
    transcript: Transcript,
    chat_options: ChatOptions,
    output: Box<dyn AgentOutput>,
    session_usage: Usage,
}

impl Agent {
    /// Fetch the tool catalog and seed the transcript with the system prompt.
    ///
    /// On failure the provider is shut down before the error is returned.
    pub async fn initialize(
        config: AgentConfig,
        llm_client: Arc<dyn LlmClient>,
        mut provider: Box<dyn ToolProvider>,
        chat_options: ChatOptions,
        output: Box<dyn AgentOutput>,
    ) -> Result<Self> {
        if config.max_steps == 0 {
            let _ = provider.shutdown().await;
            return Err(AgentError::InvalidQuery {
                message: "max_steps must be at least 1".to_string(),
            }
            .into());
        }

        let catalog = match ToolCatalog::fetch(provider.as_mut()).await {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("Failed to list tools from '{}': {}", provider.name(), e);
                if let Err(shutdown_err) = provider.shutdown().await {
                    tracing::warn!("Provider shutdown failed: {}", shutdown_err);
                }
                return Err(e);
            }
        };

        let system_prompt = resolve_system_prompt(config.system_prompt.as_deref()).to_string();

        tracing::debug!(
            "Agent ready: model={} provider={} tools={}",
            llm_client.model_name(),
            llm_client.provider_name(),
            catalog.len()
        );

        Ok(Self {
            config,
            llm_client,
            provider,
            catalog,
            transcript: Transcript::with_system(system_prompt),
            chat_options,
            output,
            session_usage: Usage::default(),
        })
    }

    /// Answer one user query, calling tools as the model requests them.
    ///
    /// On success the transcript holds the query, every intermediate message
    /// and the final answer. On failure it is restored to its prior length.
    pub async fn process_query(&mut self, query: &str) -> Result<QueryOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidQuery {
                message: "query is empty".to_string(),
            }
            .into());
        }

        let checkpoint = self.transcript.len();
        let query_id = Uuid::new_v4().to_string();

        self.emit(AgentEvent::QueryStarted {
            query_id: query_id.clone(),
            query: query.to_string(),
        })
        .await;

        let result = match self.transcript.push(LlmMessage::user(query)) {
            Ok(()) => self.run_loop(&query_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(outcome) => {
                self.session_usage.accumulate(&outcome.usage);
                self.emit(AgentEvent::FinalAnswer {
                    query_id,
                    answer: outcome.answer.clone(),
                })
                .await;
                Ok(outcome)
            }
            Err(e) => {
                self.transcript.rollback_to(checkpoint);
                tracing::error!("Query {} failed: {}", query_id, e);
                self.emit(AgentEvent::QueryFailed {
                    query_id,
                    error: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    async fn run_loop(&mut self, query_id: &str) -> Result<QueryOutcome> {
        let started = Instant::now();
        let deadline = self.config.max_duration();
        let mut usage = Usage::default();
        let mut tool_calls = 0;

        for step in 1..=self.config.max_steps {
            if let Some(limit) = deadline {
                if started.elapsed() >= limit {
                    return Err(AgentError::DeadlineExceeded {
                        seconds: limit.as_secs(),
                    }
                    .into());
                }
            }

            tracing::debug!("Query {} step {}", query_id, step);

            let response = self
                .llm_client
                .chat_completion(
                    self.transcript.messages(),
                    self.catalog.definitions(),
                    Some(self.chat_options.clone()),
                )
                .await?;

            if let Some(step_usage) = &response.usage {
                usage.accumulate(step_usage);
                self.emit(AgentEvent::TokenUsageUpdated { usage }).await;
            }

            if !response.message.has_tool_calls() {
                let answer = response.message.content;
                self.transcript.push(LlmMessage::assistant(answer.clone()))?;

                return Ok(QueryOutcome {
                    answer,
                    steps: step,
                    tool_calls,
                    duration_ms: started.elapsed().as_millis() as u64,
                    usage,
                });
            }

            let requests = response.message.tool_calls().to_vec();
            self.emit(AgentEvent::ToolCallsRequested {
                query_id: query_id.to_string(),
                count: requests.len(),
            })
            .await;

            self.transcript.push(response.message)?;

            // Each result is in the transcript before the next call starts
            for request in &requests {
                self.execute_tool_call(request).await?;
                tool_calls += 1;
            }
        }

        Err(AgentError::MaxStepsExceeded {
            max_steps: self.config.max_steps,
        }
        .into())
    }

    async fn execute_tool_call(&mut self, request: &ToolCallRequest) -> Result<()> {
        let arguments = request
            .parse_arguments()
            .map_err(|e| ToolError::InvalidArguments {
                name: request.name.clone(),
                message: e.to_string(),
            })?;

        let info = ToolExecutionInfo::started(&request.id, &request.name, &arguments);
        let arguments = self.catalog.validate_arguments(&request.name, arguments)?;

        tracing::info!("Calling tool '{}' ({})", request.name, request.id);
        self.emit(AgentEvent::ToolExecutionStarted {
            tool_info: info.clone(),
        })
        .await;

        let raw = match self.provider.call_tool(&request.name, arguments).await {
            Ok(raw) => raw,
            Err(e) => {
                self.emit(AgentEvent::ToolExecutionCompleted {
                    tool_info: info.finished(ToolExecutionStatus::Error, Some(e.to_string())),
                })
                .await;
                return Err(e);
            }
        };

        let content = serde_json::to_string(&unwrap_envelope(raw))?;
        self.transcript
            .push(LlmMessage::tool(request.id.clone(), content.clone()))?;

        self.emit(AgentEvent::ToolExecutionCompleted {
            tool_info: info.finished(ToolExecutionStatus::Success, Some(content)),
        })
        .await;

        Ok(())
    }

    async fn emit(&self, event: AgentEvent) {
        if let Err(e) = self.output.emit_event(event).await {
            tracing::debug!("Failed to emit agent event: {}", e);
        }
    }

    /// Release the tool provider
    pub async fn shutdown(&mut self) -> Result<()> {
        let _ = self.output.flush().await;
        self.provider.shutdown().await
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Tokens consumed by every successful query so far
    pub fn session_usage(&self) -> Usage {
        self.session_usage
    }

    pub fn model_name(&self) -> &str {
        self.llm_client.model_name()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
