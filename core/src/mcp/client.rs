//! MCP (Model Context Protocol) client over a child process' stdio

use crate::config::McpServerConfig;
use crate::error::{Error, McpError, Result, ToolError};
use crate::mcp::protocol::{
    Implementation, InitializeParams, InitializeResult, JsonRpcMessage, JsonRpcRequest,
    ListToolsResult, PROTOCOL_VERSION,
};
use crate::tools::{ToolProvider, ToolSpec};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// How long a server gets to exit on its own after stdin is closed
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// A connected MCP server
pub struct McpClient {
    config: McpServerConfig,
    process: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr_task: Option<JoinHandle<()>>,
    request_id: u64,
    server_info: Option<Implementation>,
}

impl McpClient {
    /// Start the server process and complete the initialize handshake
    /// within the configured startup timeout.
    pub async fn connect(config: McpServerConfig) -> Result<Self> {
        config.validate()?;

        let mut cmd = Command::new(&config.command[0]);
        cmd.args(&config.command[1..]);
        cmd.args(&config.args);

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            "Starting MCP server '{}': {:?}",
            config.name, config.command
        );

        let mut process = cmd.spawn().map_err(|source| McpError::Spawn {
            server: config.name.clone(),
            source,
        })?;

        let missing_pipe = |pipe: &str| McpError::Connection {
            server: config.name.clone(),
            message: format!("no {} pipe on child process", pipe),
        };
        let stdin = process.stdin.take().ok_or_else(|| missing_pipe("stdin"))?;
        let stdout = process.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr_task = process.stderr.take().map(|stderr| {
            let server = config.name.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "docs_agent_core::mcp::server", "[{}] {}", server, line);
                }
            })
        });

        let mut client = Self {
            config,
            process: Some(process),
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            stderr_task,
            request_id: 0,
            server_info: None,
        };

        let startup_timeout = client.config.startup_timeout();
        match timeout(startup_timeout, client.initialize()).await {
            Ok(Ok(())) => Ok(client),
            Ok(Err(e)) => {
                let _ = client.shutdown().await;
                Err(match e {
                    Error::Mcp(McpError::Rpc { code, message }) => McpError::Connection {
                        server: client.config.name.clone(),
                        message: format!("initialize rejected ({}): {}", code, message),
                    }
                    .into(),
                    Error::Mcp(mcp) => mcp.into(),
                    other => McpError::Connection {
                        server: client.config.name.clone(),
                        message: other.to_string(),
                    }
                    .into(),
                })
            }
            Err(_) => {
                let _ = client.shutdown().await;
                Err(McpError::StartupTimeout {
                    server: client.config.name.clone(),
                    seconds: client.config.startup_timeout_secs,
                }
                .into())
            }
        }
    }

    /// Server name and version reported during the handshake
    pub fn server_info(&self) -> Option<&Implementation> {
        self.server_info.as_ref()
    }

    pub fn config(&self) -> &McpServerConfig {
        &self.config
    }

    /// Send initialization request to MCP server
    async fn initialize(&mut self) -> Result<()> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        let result = self
            .roundtrip("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult =
            serde_json::from_value(result).map_err(|e| McpError::Connection {
                server: self.config.name.clone(),
                message: format!("invalid initialize result: {}", e),
            })?;

        if result.protocol_version != PROTOCOL_VERSION {
            warn!(
                "MCP server '{}' speaks protocol {} (client asked for {})",
                self.config.name, result.protocol_version, PROTOCOL_VERSION
            );
        }
        info!(
            "Connected to MCP server '{}' ({} {})",
            self.config.name, result.server_info.name, result.server_info.version
        );
        self.server_info = Some(result.server_info);

        self.notify("notifications/initialized").await
    }

    /// Get next request ID
    fn next_request_id(&mut self) -> u64 {
        self.request_id += 1;
        self.request_id
    }

    async fn write_message(&mut self, message: &JsonRpcRequest) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| McpError::Closed {
            server: self.config.name.clone(),
        })?;

        let mut line = serde_json::to_string(message)?;
        debug!("MCP -> {}", line);
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn notify(&mut self, method: &str) -> Result<()> {
        self.write_message(&JsonRpcRequest::notification(method, None))
            .await
    }

    /// Send a request and wait for the response carrying the same id.
    /// Notifications, server requests and stray lines are skipped.
    async fn roundtrip(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_request_id();
        self.write_message(&JsonRpcRequest::new(id, method, params))
            .await?;

        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| McpError::Closed {
                    server: self.config.name.clone(),
                })?;

            if line.trim().is_empty() {
                continue;
            }
            debug!("MCP <- {}", line);

            let message: JsonRpcMessage = match serde_json::from_str(line.trim()) {
                Ok(message) => message,
                Err(e) => {
                    warn!("Ignoring non JSON-RPC output from MCP server: {}", e);
                    continue;
                }
            };

            if !message.answers(id) {
                if let Some(method) = &message.method {
                    debug!("Skipping server message '{}'", method);
                } else {
                    debug!("Skipping response for another request: {:?}", message.id);
                }
                continue;
            }

            if let Some(error) = message.error {
                return Err(McpError::Rpc {
                    code: error.code,
                    message: error.message,
                }
                .into());
            }

            return Ok(message.result.unwrap_or(Value::Null));
        }
    }

    /// Round trip bounded by the per-request timeout
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        let limit = self.config.request_timeout();
        match timeout(limit, self.roundtrip(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(McpError::RequestTimeout {
                server: self.config.name.clone(),
                method: method.to_string(),
                seconds: self.config.request_timeout_secs,
            }
            .into()),
        }
    }
}

#[async_trait]
impl ToolProvider for McpClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn list_tools(&mut self) -> Result<Vec<ToolSpec>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let result = self.request("tools/list", params).await?;
            let page: ListToolsResult =
                serde_json::from_value(result).map_err(|e| McpError::Connection {
                    server: self.config.name.clone(),
                    message: format!("invalid tools/list result: {}", e),
                })?;

            tools.extend(page.tools.into_iter().map(|tool| {
                ToolSpec::new(
                    tool.name,
                    tool.description.unwrap_or_default(),
                    tool.input_schema
                        .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
                )
            }));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        Ok(tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        let params = json!({
            "name": name,
            "arguments": arguments,
        });

        // A channel that dies mid-call fails the invocation
        let result = match self.request("tools/call", Some(params)).await {
            Ok(result) => result,
            Err(e @ Error::Mcp(McpError::Closed { .. })) | Err(e @ Error::Io(_)) => {
                return Err(ToolError::ExecutionFailed {
                    name: name.to_string(),
                    message: e.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e),
        };

        if result.get("isError").and_then(Value::as_bool) == Some(true) {
            let message = crate::tools::payload::envelope_text(&result)
                .unwrap_or_else(|| result.to_string());
            return Err(ToolError::ExecutionFailed {
                name: name.to_string(),
                message,
            }
            .into());
        }

        Ok(result)
    }

    async fn shutdown(&mut self) -> Result<()> {
        // Closing stdin asks a well-behaved server to exit
        drop(self.stdin.take());

        if let Some(mut process) = self.process.take() {
            match timeout(SHUTDOWN_GRACE, process.wait()).await {
                Ok(Ok(status)) => debug!("MCP server '{}' exited: {}", self.config.name, status),
                _ => {
                    debug!("Killing MCP server '{}'", self.config.name);
                    let _ = process.kill().await;
                }
            }
            info!("MCP server '{}' stopped", self.config.name);
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }

        Ok(())
    }
}
