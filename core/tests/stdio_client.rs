//! MCP stdio client against small scripted `sh` servers
#![cfg(unix)]

use async_trait::async_trait;
use docs_agent_core::error::{LlmError, McpError, ToolError};
use docs_agent_core::llm::{
    ChatOptions, FinishReason, LlmClient, LlmMessage, LlmResponse, MessageRole, ToolCallRequest,
    ToolDefinition,
};
use docs_agent_core::{AgentBuilder, Error, ErrorKind, McpClient, McpServerConfig, ToolProvider};
use serde_json::{json, Map};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const INIT_REPLY: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake-docs","version":"0.3.0"}}}"#;

/// Answers initialize, two pages of tools/list, then two tools/call requests.
/// Emits noise and a null-id error before the first page.
fn docs_server_script() -> String {
    format!(
        r#"read line
echo '{init}'
read line
read line
echo 'starting up...'
echo '{{"jsonrpc":"2.0","id":null,"error":{{"code":-32601,"message":"Method not found"}}}}'
echo '{{"jsonrpc":"2.0","id":2,"result":{{"tools":[{{"name":"search_docs","description":"Search docs","inputSchema":{{"type":"object","properties":{{"query":{{"type":"string"}}}},"required":["query"]}}}}],"nextCursor":"page-2"}}}}'
read line
echo '{{"jsonrpc":"2.0","id":3,"result":{{"tools":[{{"name":"list_categories"}}]}}}}'
read line
echo '{{"jsonrpc":"2.0","method":"notifications/message","params":{{"level":"info"}}}}'
echo '{{"jsonrpc":"2.0","id":4,"result":{{"content":[{{"type":"text","text":"nginx: access and error logs"}}],"isError":false}}}}'
read line
echo '{{"jsonrpc":"2.0","id":5,"result":{{"content":[{{"type":"text","text":"unknown category"}}],"isError":true}}}}'
read line
"#,
        init = INIT_REPLY
    )
}

fn sh_config(name: &str, script: &str) -> McpServerConfig {
    McpServerConfig::new(
        name,
        vec!["sh".to_string(), "-c".to_string(), script.to_string()],
    )
    .with_startup_timeout(5)
    .with_request_timeout(5)
}

#[tokio::test]
async fn test_handshake_listing_and_calls() {
    let mut client = McpClient::connect(sh_config("fake-docs", &docs_server_script()))
        .await
        .unwrap();

    let info = client.server_info().unwrap();
    assert_eq!(info.name, "fake-docs");
    assert_eq!(info.version, "0.3.0");

    let tools = client.list_tools().await.unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["search_docs", "list_categories"]);
    assert_eq!(tools[0].required_arguments(), vec!["query"]);
    assert_eq!(tools[1].input_schema["type"], "object");

    let mut arguments = Map::new();
    arguments.insert("query".to_string(), json!("nginx"));
    let result = client.call_tool("search_docs", arguments).await.unwrap();
    assert_eq!(result["content"][0]["text"], "nginx: access and error logs");

    let err = client
        .call_tool("list_categories", Map::new())
        .await
        .unwrap_err();
    match err {
        Error::Tool(ToolError::ExecutionFailed { name, message }) => {
            assert_eq!(name, "list_categories");
            assert_eq!(message, "unknown category");
        }
        other => panic!("unexpected error: {other}"),
    }

    client.shutdown().await.unwrap();
    // Second shutdown is a no-op
    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_command_is_a_connection_error() {
    let config = McpServerConfig::new(
        "missing",
        vec!["/nonexistent/docs-agent-test-server".to_string()],
    );
    let err = McpClient::connect(config).await.err().unwrap();
    assert!(matches!(err, Error::Mcp(McpError::Spawn { .. })));
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn test_silent_server_hits_startup_timeout() {
    let config = sh_config("silent", "sleep 30").with_startup_timeout(1);
    let err = McpClient::connect(config).await.err().unwrap();
    assert!(matches!(err, Error::Mcp(McpError::StartupTimeout { seconds: 1, .. })));
}

#[tokio::test]
async fn test_server_exit_during_handshake() {
    let err = McpClient::connect(sh_config("quitter", "read line; exit 0"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::Mcp(McpError::Closed { .. })));
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn test_unanswered_call_times_out() {
    let script = format!(
        r#"read line
echo '{init}'
read line
read line
echo '{{"jsonrpc":"2.0","id":2,"result":{{"tools":[{{"name":"slow"}}]}}}}'
read line
sleep 30
"#,
        init = INIT_REPLY
    );
    let mut client = McpClient::connect(sh_config("slow", &script).with_request_timeout(1))
        .await
        .unwrap();
    client.list_tools().await.unwrap();

    let err = client.call_tool("slow", Map::new()).await.unwrap_err();
    assert!(matches!(err, Error::Mcp(McpError::RequestTimeout { .. })));
    assert_eq!(err.kind(), ErrorKind::ToolExecution);
    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_exit_during_call_is_a_tool_failure() {
    let script = format!(
        r#"read line
echo '{init}'
read line
read line
echo '{{"jsonrpc":"2.0","id":2,"result":{{"tools":[{{"name":"search_docs"}}]}}}}'
read line
exit 0
"#,
        init = INIT_REPLY
    );
    let mut client = McpClient::connect(sh_config("crashy", &script))
        .await
        .unwrap();
    client.list_tools().await.unwrap();

    let err = client.call_tool("search_docs", Map::new()).await.unwrap_err();
    match &err {
        Error::Tool(ToolError::ExecutionFailed { name, message }) => {
            assert_eq!(name, "search_docs");
            assert!(message.contains("crashy"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.kind(), ErrorKind::ToolExecution);
    client.shutdown().await.unwrap();
}

struct ScriptedLlm {
    replies: Mutex<VecDeque<LlmMessage>>,
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat_completion(
        &self,
        _messages: &[LlmMessage],
        _tools: &[ToolDefinition],
        _options: Option<ChatOptions>,
    ) -> docs_agent_core::Result<LlmResponse> {
        let message = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::EmptyResponse {
                message: "no more replies".to_string(),
            })?;
        Ok(LlmResponse {
            message,
            usage: None,
            model: "scripted".to_string(),
            finish_reason: Some(FinishReason::Stop),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

#[tokio::test]
async fn test_agent_answers_through_stdio_server() {
    let client = McpClient::connect(sh_config("fake-docs", &docs_server_script()))
        .await
        .unwrap();

    let llm = Arc::new(ScriptedLlm {
        replies: Mutex::new(VecDeque::from(vec![
            LlmMessage::assistant_tool_calls(
                "",
                vec![ToolCallRequest::new(
                    "call_1",
                    "search_docs",
                    r#"{"query":"nginx"}"#,
                )],
            ),
            LlmMessage::assistant("Nginx collects access and error logs."),
        ])),
    });

    let mut agent = AgentBuilder::new(llm)
        .build(Box::new(client))
        .await
        .unwrap();
    assert_eq!(agent.catalog().len(), 2);

    let outcome = agent.process_query("What does nginx collect?").await.unwrap();
    assert_eq!(outcome.answer, "Nginx collects access and error logs.");
    assert_eq!(outcome.tool_calls, 1);

    let tool_message = &agent.transcript().messages()[3];
    assert_eq!(tool_message.role, MessageRole::Tool);
    assert_eq!(tool_message.content, "\"nginx: access and error logs\"");

    agent.shutdown().await.unwrap();
}
