//! Agent configuration and builder

use crate::agent::Agent;
use crate::config::ResolvedLlmConfig;
use crate::error::Result;
use crate::llm::{ChatOptions, LlmClient, OpenAiClient};
use crate::output::{AgentOutput, NullOutput};
use crate::tools::ToolProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default bound on LLM round trips per query
pub const DEFAULT_MAX_STEPS: usize = 25;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of LLM round trips for a single query
    pub max_steps: usize,

    /// Optional wall-clock budget for a single query, checked between round trips
    #[serde(default)]
    pub max_duration_secs: Option<u64>,

    /// Custom system prompt for the agent (optional)
    /// If not provided, the default system prompt will be used
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl AgentConfig {
    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration_secs.map(Duration::from_secs)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_duration_secs: None,
            system_prompt: None,
        }
    }
}

/// Builder for creating agents
pub struct AgentBuilder {
    llm_client: Arc<dyn LlmClient>,
    agent_config: AgentConfig,
    chat_options: ChatOptions,
    output: Box<dyn AgentOutput>,
}

impl AgentBuilder {
    /// Create a new agent builder around an LLM client
    pub fn new(llm_client: Arc<dyn LlmClient>) -> Self {
        Self {
            llm_client,
            agent_config: AgentConfig::default(),
            chat_options: ChatOptions::default(),
            output: Box::new(NullOutput),
        }
    }

    /// Create a builder backed by the OpenAI-compatible client
    pub fn from_llm_config(llm_config: &ResolvedLlmConfig) -> Result<Self> {
        let client = OpenAiClient::new(llm_config)?;
        Ok(Self::new(Arc::new(client)).with_chat_options(ChatOptions::from(&llm_config.params)))
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.agent_config.max_steps = max_steps;
        self
    }

    /// Set system prompt
    pub fn with_system_prompt(mut self, system_prompt: Option<String>) -> Self {
        self.agent_config.system_prompt = system_prompt;
        self
    }

    /// Set sampling options sent with every request
    pub fn with_chat_options(mut self, chat_options: ChatOptions) -> Self {
        self.chat_options = chat_options;
        self
    }

    /// Set the output handler
    pub fn with_output(mut self, output: Box<dyn AgentOutput>) -> Self {
        self.output = output;
        self
    }

    /// Fetch the tool catalog from `provider` and seed the transcript.
    /// The provider is shut down if initialization fails.
    pub async fn build(self, provider: Box<dyn ToolProvider>) -> Result<Agent> {
        Agent::initialize(
            self.agent_config,
            self.llm_client,
            provider,
            self.chat_options,
            self.output,
        )
        .await
    }
}
