//! Tool provider trait and tool descriptions

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A remote source of named, schema-described tools.
///
/// Every operation takes `&mut self`: the provider is owned by one session and
/// only one request can be outstanding at a time.
#[async_trait]
pub trait ToolProvider: Send {
    /// Logical name of the provider
    fn name(&self) -> &str;

    /// List the tools the provider exposes, in provider order
    async fn list_tools(&mut self) -> Result<Vec<ToolSpec>>;

    /// Invoke a tool and wait for its raw result
    async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> Result<Value>;

    /// Release the provider. Must be safe to call more than once.
    async fn shutdown(&mut self) -> Result<()>;
}

/// Description of a single tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool name
    pub name: String,

    /// Human readable purpose
    pub description: String,

    /// JSON schema of the arguments object
    pub input_schema: Value,
}

impl ToolSpec {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, description: D, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Argument names listed under the schema's `required` key
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}
