//! # docs-agent Core
//!
//! Core library for docs-agent, a conversational agent that answers questions
//! about integration documentation by calling tools exposed by an MCP server.
//!
//! The pieces are an OpenAI-compatible LLM client, a stdio MCP client acting
//! as the [`tools::ToolProvider`], and the [`Agent`] loop that ties them
//! together.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod output;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, QueryOutcome};
pub use config::{McpServerConfig, ModelParams, ResolvedLlmConfig};
pub use error::{Error, ErrorKind, Result};
pub use mcp::McpClient;
pub use tools::{ToolCatalog, ToolProvider, ToolSpec};

/// Current version of the docs-agent-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing with a specific debug mode.
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing_with_debug(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}
