//! Immutable catalog of the tools a session may call

use crate::error::{Result, ToolError};
use crate::llm::{FunctionDefinition, ToolDefinition};
use crate::tools::{ToolProvider, ToolSpec};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{info, warn};

/// Tools fetched once from the provider at session start.
///
/// Names are unique and provider order is preserved.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolSpec>,
    definitions: Vec<ToolDefinition>,
}

impl ToolCatalog {
    /// Build a catalog, keeping the first tool of any duplicated name
    pub fn new(specs: Vec<ToolSpec>) -> Self {
        let mut seen = HashSet::new();
        let mut tools = Vec::with_capacity(specs.len());

        for spec in specs {
            if seen.insert(spec.name.clone()) {
                tools.push(spec);
            } else {
                warn!("Ignoring duplicate tool '{}' from provider", spec.name);
            }
        }

        let definitions = tools
            .iter()
            .map(|tool| ToolDefinition {
                tool_type: "function".to_string(),
                function: FunctionDefinition {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.input_schema.clone(),
                },
            })
            .collect();

        Self { tools, definitions }
    }

    /// Fetch the catalog from a provider
    pub async fn fetch(provider: &mut dyn ToolProvider) -> Result<Self> {
        let specs = provider.list_tools().await?;
        let catalog = Self::new(specs);

        if catalog.is_empty() {
            warn!("Tool provider '{}' exposes no tools", provider.name());
        } else {
            info!(
                "Found {} tool(s) on '{}': {}",
                catalog.len(),
                provider.name(),
                catalog.names().join(", ")
            );
        }

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter()
    }

    /// Tool definitions in the shape the chat API expects
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Check parsed arguments against the tool's schema and return them as
    /// the object the provider expects.
    ///
    /// Only the top-level shape is checked: the value must be an object that
    /// carries every `required` key.
    pub fn validate_arguments(&self, name: &str, arguments: Value) -> Result<Map<String, Value>> {
        let spec = self.get(name).ok_or_else(|| ToolError::NotFound {
            name: name.to_string(),
        })?;

        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(ToolError::SchemaViolation {
                    name: name.to_string(),
                    message: format!("expected an object, got {}", other),
                }
                .into())
            }
        };

        let missing: Vec<&str> = spec
            .required_arguments()
            .into_iter()
            .filter(|key| !arguments.contains_key(*key))
            .collect();

        if !missing.is_empty() {
            return Err(ToolError::SchemaViolation {
                name: name.to_string(),
                message: format!("missing required argument(s): {}", missing.join(", ")),
            }
            .into());
        }

        Ok(arguments)
    }
}
