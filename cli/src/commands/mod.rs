//! CLI command implementations

pub mod ask;
pub mod interactive;
pub mod tools;

pub use ask::ask_command;
pub use interactive::interactive_command;
pub use tools::tools_command;

use crate::config::AppConfig;
use anyhow::{Context, Result};
use docs_agent_core::output::AgentOutput;
use docs_agent_core::{Agent, AgentBuilder, McpClient};
use tracing::info;

/// Start the tool provider and build an agent around it
pub async fn connect_agent(config: &AppConfig, output: Box<dyn AgentOutput>) -> Result<Agent> {
    // Build the LLM side first so a bad key never spawns the server
    let builder = AgentBuilder::from_llm_config(&config.llm)?
        .with_agent_config(config.agent.clone())
        .with_output(output);

    info!("Using model: {}", config.llm.model);
    let client = McpClient::connect(config.server.clone())
        .await
        .with_context(|| format!("Failed to start tool provider '{}'", config.server.name))?;

    let agent = builder
        .build(Box::new(client))
        .await
        .context("Failed to fetch the tool catalog")?;
    Ok(agent)
}
