//! Error types and handling for docs-agent core

use thiserror::Error;

/// Result type alias for docs-agent operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for docs-agent core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Tool provider (MCP server) errors
    #[error("MCP error: {0}")]
    Mcp(#[from] McpError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Coarse classification used when reporting a failed query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The tool provider could not be started or reached
    Connection,
    /// The model produced tool arguments that are not valid JSON
    ArgumentParse,
    /// The tool provider rejected or failed a tool invocation
    ToolExecution,
    /// The chat completion request failed
    LlmRequest,
    /// The agent loop gave up (iteration bound, deadline, bad input)
    Agent,
    /// Anything else
    Other,
}

impl ErrorKind {
    /// Name shown to the operator
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Connection => "ConnectionError",
            ErrorKind::ArgumentParse => "ArgumentParseError",
            ErrorKind::ToolExecution => "ToolExecutionError",
            ErrorKind::LlmRequest => "LLMRequestError",
            ErrorKind::Agent => "AgentError",
            ErrorKind::Other => "Error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Mcp(McpError::Rpc { .. }) | Error::Mcp(McpError::RequestTimeout { .. }) => {
                ErrorKind::ToolExecution
            }
            Error::Mcp(_) => ErrorKind::Connection,
            Error::Tool(ToolError::InvalidArguments { .. }) => ErrorKind::ArgumentParse,
            Error::Tool(_) => ErrorKind::ToolExecution,
            Error::Llm(_) => ErrorKind::LlmRequest,
            Error::Agent(_) => ErrorKind::Agent,
            _ => ErrorKind::Other,
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {message}")]
    ApiError { message: String },

    #[error("Empty response: {message}")]
    EmptyResponse { message: String },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Invalid arguments for tool '{name}': {message}")]
    InvalidArguments { name: String, message: String },

    #[error("Arguments for tool '{name}' do not match its schema: {message}")]
    SchemaViolation { name: String, message: String },

    #[error("Tool execution failed: {name} - {message}")]
    ExecutionFailed { name: String, message: String },
}

/// Errors raised by the tool provider channel
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Failed to spawn MCP server '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP server '{server}' did not complete the handshake within {seconds}s")]
    StartupTimeout { server: String, seconds: u64 },

    #[error("MCP server '{server}' did not answer '{method}' within {seconds}s")]
    RequestTimeout {
        server: String,
        method: String,
        seconds: u64,
    },

    #[error("Connection to MCP server '{server}' failed: {message}")]
    Connection { server: String, message: String },

    #[error("MCP server '{server}' closed the connection")]
    Closed { server: String },

    #[error("MCP server returned error {code}: {message}")]
    Rpc { code: i64, message: String },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Could not complete the query within {max_steps} steps")]
    MaxStepsExceeded { max_steps: usize },

    #[error("Could not complete the query within {seconds}s")]
    DeadlineExceeded { seconds: u64 },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Tool result '{tool_call_id}' does not answer any earlier tool call")]
    OrphanToolResult { tool_call_id: String },
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_follow_taxonomy() {
        let parse: Error = ToolError::InvalidArguments {
            name: "search_docs".to_string(),
            message: "EOF while parsing".to_string(),
        }
        .into();
        assert_eq!(parse.kind(), ErrorKind::ArgumentParse);

        let timeout: Error = McpError::StartupTimeout {
            server: "docs".to_string(),
            seconds: 30,
        }
        .into();
        assert_eq!(timeout.kind(), ErrorKind::Connection);

        let rpc: Error = McpError::Rpc {
            code: -32601,
            message: "Method not found".to_string(),
        }
        .into();
        assert_eq!(rpc.kind(), ErrorKind::ToolExecution);

        let llm: Error = LlmError::ApiError {
            message: "rate limited".to_string(),
        }
        .into();
        assert_eq!(llm.kind(), ErrorKind::LlmRequest);
        assert_eq!(llm.kind().to_string(), "LLMRequestError");
    }
}
