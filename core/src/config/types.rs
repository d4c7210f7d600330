//! Configuration types for docs-agent core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default base URL for OpenAI-compatible endpoints
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default logical name of the tool provider
pub const DEFAULT_SERVER_NAME: &str = "elastic-integration-docs-mcp";

/// Default seconds allowed for the provider to start and finish the handshake
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;

/// Default seconds allowed for a single tool provider request after startup
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingField {
                field: "api_key".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(ConfigError::MissingField {
                field: "model".to_string(),
            });
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "base_url".to_string(),
                value: self.base_url.clone(),
            });
        }

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err(ConfigError::InvalidValue {
                    field: "params.temperature".to_string(),
                    value: temp.to_string(),
                });
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::InvalidValue {
                    field: "params.top_p".to_string(),
                    value: top_p.to_string(),
                });
            }
        }

        Ok(())
    }
}

/// How to launch and talk to the tool provider process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Logical server name, used in logs and error messages
    pub name: String,
    /// Program followed by its leading arguments
    pub command: Vec<String>,
    /// Extra arguments appended after `command`
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables for the child process
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Bound on spawn + initialize handshake
    pub startup_timeout_secs: u64,
    /// Bound on each request once the server is up
    pub request_timeout_secs: u64,
}

impl McpServerConfig {
    /// Create a server config with default timeouts
    pub fn new<S: Into<String>>(name: S, command: Vec<String>) -> Self {
        Self {
            name: name.into(),
            command,
            args: Vec::new(),
            env: HashMap::new(),
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }

    pub fn with_startup_timeout(mut self, seconds: u64) -> Self {
        self.startup_timeout_secs = seconds;
        self
    }

    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "server.name".to_string(),
            });
        }

        match self.command.first() {
            Some(program) if !program.trim().is_empty() => {}
            _ => {
                return Err(ConfigError::MissingField {
                    field: "server.command".to_string(),
                })
            }
        }

        if self.startup_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.startup_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for McpServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_NAME, vec![DEFAULT_SERVER_NAME.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_validation() {
        let config = ResolvedLlmConfig::new(
            DEFAULT_BASE_URL.to_string(),
            "sk-test".to_string(),
            DEFAULT_MODEL.to_string(),
        );
        assert!(config.validate().is_ok());

        let mut missing_key = config.clone();
        missing_key.api_key.clear();
        assert!(matches!(
            missing_key.validate(),
            Err(ConfigError::MissingField { field }) if field == "api_key"
        ));

        let mut bad_url = config.clone();
        bad_url.base_url = "api.openai.com".to_string();
        assert!(bad_url.validate().is_err());

        let hot = config.with_params(ModelParams {
            temperature: Some(3.5),
            ..Default::default()
        });
        assert!(hot.validate().is_err());
    }

    #[test]
    fn test_server_config_validation() {
        assert!(McpServerConfig::default().validate().is_ok());

        let empty = McpServerConfig::new("docs", Vec::new());
        assert!(matches!(
            empty.validate(),
            Err(ConfigError::MissingField { field }) if field == "server.command"
        ));

        let no_wait = McpServerConfig::default().with_startup_timeout(0);
        assert!(no_wait.validate().is_err());

        let no_request_wait = McpServerConfig::default().with_request_timeout(0);
        assert!(matches!(
            no_request_wait.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "server.request_timeout_secs"
        ));
    }
}
