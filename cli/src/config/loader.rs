//! CLI configuration loader for docs-agent
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./docs-agent.json or ./.docs-agent/config.json
//! 3. Git repository root: <repo_root>/.docs-agent/config.json
//! 4. XDG config: $XDG_CONFIG_HOME/docs-agent/config.json or ~/.config/docs-agent/config.json
//! 5. Environment variables only (no files)
//!
//! Environment variables fill whatever the chosen file leaves out, and flags
//! override everything.

use anyhow::{anyhow, Context, Result};
use docs_agent_core::config::types::{
    DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVER_NAME,
    DEFAULT_STARTUP_TIMEOUT_SECS,
};
use docs_agent_core::{AgentConfig, McpServerConfig, ModelParams, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "docs-agent";

/// Raw configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// API key (can be "env:VAR_NAME" for environment variable)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name
    #[serde(default)]
    pub model: Option<String>,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Tool provider process
    #[serde(default)]
    pub server: RawServerConfig,
    /// Agent loop limits
    #[serde(default)]
    pub agent: RawAgentConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawServerConfig {
    #[serde(default)]
    pub name: Option<String>,
    /// Program followed by its arguments
    #[serde(default)]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub startup_timeout_secs: Option<u64>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawAgentConfig {
    #[serde(default)]
    pub max_steps: Option<usize>,
    #[serde(default)]
    pub max_duration_secs: Option<u64>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Everything a session needs, resolved and validated
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: ResolvedLlmConfig,
    pub server: McpServerConfig,
    pub agent: AgentConfig,
}

/// CLI configuration loader
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Directory the search starts from
    working_dir: Option<PathBuf>,
    /// Environment snapshot
    env: HashMap<String, String>,
    /// Flag overrides
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    server_name_override: Option<String>,
    server_command_override: Option<Vec<String>>,
    max_steps_override: Option<usize>,
    startup_timeout_override: Option<u64>,
}

impl CliConfigLoader {
    /// Create a new loader reading the process environment
    pub fn new() -> Self {
        Self {
            config_override: None,
            working_dir: None,
            env: std::env::vars().collect(),
            api_key_override: None,
            base_url_override: None,
            model_override: None,
            server_name_override: None,
            server_command_override: None,
            max_steps_override: None,
            startup_timeout_override: None,
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Search for config files from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = Some(dir);
        self
    }

    /// Replace the environment snapshot
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set tool provider name override
    pub fn with_server_name_override(mut self, name: String) -> Self {
        self.server_name_override = Some(name);
        self
    }

    /// Set tool provider command override (program followed by arguments)
    pub fn with_server_command_override(mut self, command: Vec<String>) -> Self {
        self.server_command_override = Some(command);
        self
    }

    /// Set max steps override
    pub fn with_max_steps_override(mut self, max_steps: usize) -> Self {
        self.max_steps_override = Some(max_steps);
        self
    }

    /// Set startup timeout override in seconds
    pub fn with_startup_timeout_override(mut self, seconds: u64) -> Self {
        self.startup_timeout_override = Some(seconds);
        self
    }

    /// Load and resolve configuration
    pub async fn load(&self) -> Result<AppConfig> {
        // Step 1: Find and load base configuration
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load().await?.unwrap_or_default()
        };

        // Step 2: Fill gaps from the environment
        self.apply_env(&mut config);

        // Step 3: Apply flag overrides
        if let Some(api_key) = &self.api_key_override {
            config.api_key = Some(api_key.clone());
        }
        if let Some(base_url) = &self.base_url_override {
            config.base_url = Some(base_url.clone());
        }
        if let Some(model) = &self.model_override {
            config.model = Some(model.clone());
        }
        if let Some(name) = &self.server_name_override {
            config.server.name = Some(name.clone());
        }
        if let Some(command) = &self.server_command_override {
            config.server.command = Some(command.clone());
        }
        if let Some(max_steps) = self.max_steps_override {
            config.agent.max_steps = Some(max_steps);
        }
        if let Some(seconds) = self.startup_timeout_override {
            config.server.startup_timeout_secs = Some(seconds);
        }

        // Step 4: Resolve to final config
        self.resolve_config(config)
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<Option<RawConfig>> {
        let cwd = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        // 1. Current working directory
        for candidate in [
            cwd.join("docs-agent.json"),
            cwd.join(".docs-agent").join("config.json"),
        ] {
            if candidate.exists() {
                return Ok(Some(self.load_file(&candidate).await?));
            }
        }

        // 2. Git repository root
        if let Some(git_root) = find_git_root(&cwd) {
            let config_path = git_root.join(".docs-agent").join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }

        // 3. XDG config directory
        if let Some(config_dir) = self.xdg_config_dir() {
            let config_path = config_dir.join(APP_DIR).join("config.json");
            if config_path.exists() {
                return Ok(Some(self.load_file(&config_path).await?));
            }
        }

        // 4. Environment variables only
        Ok(None)
    }

    fn apply_env(&self, config: &mut RawConfig) {
        let var = |name: &str| {
            self.env
                .get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if config.api_key.is_none() {
            config.api_key = var("OPENAI_API_KEY");
        }
        if config.base_url.is_none() {
            config.base_url = var("OPENAI_BASE_URL");
        }
        if config.model.is_none() {
            config.model = var("DOCS_AGENT_MODEL").or_else(|| var("OPENAI_MODEL"));
        }
        if config.server.command.is_none() {
            config.server.command = var("DOCS_AGENT_SERVER_COMMAND")
                .map(|command| command.split_whitespace().map(str::to_string).collect());
        }
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        tracing::debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get XDG config directory
    fn xdg_config_dir(&self) -> Option<PathBuf> {
        match self.env.get("XDG_CONFIG_HOME") {
            Some(xdg_config) if !xdg_config.is_empty() => Some(PathBuf::from(xdg_config)),
            _ => dirs::config_dir(),
        }
    }

    /// Resolve raw config to the final application config
    fn resolve_config(&self, config: RawConfig) -> Result<AppConfig> {
        // Resolve API key (handle env: prefix)
        let api_key = match config.api_key {
            Some(key) => match key.strip_prefix("env:") {
                Some(var_name) => self
                    .env
                    .get(var_name)
                    .cloned()
                    .ok_or_else(|| anyhow!("Environment variable not found: {}", var_name))?,
                None => key,
            },
            None => {
                return Err(anyhow!(
                    "No API key found. Create a docs-agent.json file, pass --api-key or set OPENAI_API_KEY"
                ))
            }
        };

        let llm = ResolvedLlmConfig::new(
            config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            config.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        )
        .with_params(config.params);

        llm.validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        let server_config = config.server;
        let command = server_config
            .command
            .filter(|command| !command.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SERVER_NAME.to_string()]);
        let server = McpServerConfig::new(
            server_config
                .name
                .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string()),
            command,
        )
        .with_args(server_config.args)
        .with_env(server_config.env)
        .with_startup_timeout(
            server_config
                .startup_timeout_secs
                .unwrap_or(DEFAULT_STARTUP_TIMEOUT_SECS),
        )
        .with_request_timeout(
            server_config
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        server
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        let mut agent = AgentConfig::default();
        if let Some(max_steps) = config.agent.max_steps {
            if max_steps == 0 {
                return Err(anyhow!(
                    "Configuration validation failed: agent.max_steps must be at least 1"
                ));
            }
            agent.max_steps = max_steps;
        }
        agent.max_duration_secs = config.agent.max_duration_secs;
        agent.system_prompt = config.agent.system_prompt;

        Ok(AppConfig { llm, server, agent })
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Find git repository root
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Loader rooted at `dir` that never sees the real environment
    fn isolated(dir: &Path, vars: &[(&str, &str)]) -> CliConfigLoader {
        let mut env: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        env.insert(
            "XDG_CONFIG_HOME".to_string(),
            dir.join("xdg").display().to_string(),
        );
        CliConfigLoader::new()
            .with_working_dir(dir.to_path_buf())
            .with_env(env)
    }

    #[tokio::test]
    async fn test_env_only_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = isolated(dir.path(), &[("OPENAI_API_KEY", "sk-env")])
            .load()
            .await
            .unwrap();

        assert_eq!(config.llm.api_key, "sk-env");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.server.name, DEFAULT_SERVER_NAME);
        assert_eq!(config.server.command, vec![DEFAULT_SERVER_NAME.to_string()]);
        assert_eq!(config.server.startup_timeout_secs, DEFAULT_STARTUP_TIMEOUT_SECS);
        assert_eq!(config.agent.max_steps, 25);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let dir = tempdir().unwrap();
        let err = isolated(dir.path(), &[]).load().await.unwrap_err();
        assert!(err.to_string().contains("No API key found"));
    }

    #[tokio::test]
    async fn test_cwd_file_with_env_key_reference() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("docs-agent.json"),
            r#"{
                "api_key": "env:MY_KEY",
                "model": "gpt-4o-mini",
                "params": {"temperature": 0.2},
                "server": {
                    "name": "docs",
                    "command": ["npx", "-y", "docs-mcp"],
                    "env": {"DOCS_INDEX": "/tmp/index"},
                    "request_timeout_secs": 10
                },
                "agent": {"max_steps": 8, "system_prompt": "Be brief."}
            }"#,
        )
        .unwrap();

        let config = isolated(
            dir.path(),
            &[
                ("MY_KEY", "sk-file"),
                ("OPENAI_API_KEY", "sk-ignored"),
                ("OPENAI_MODEL", "ignored-model"),
            ],
        )
        .load()
        .await
        .unwrap();

        assert_eq!(config.llm.api_key, "sk-file");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.params.temperature, Some(0.2));
        assert_eq!(config.server.name, "docs");
        assert_eq!(config.server.command, vec!["npx", "-y", "docs-mcp"]);
        assert_eq!(config.server.env.get("DOCS_INDEX").unwrap(), "/tmp/index");
        assert_eq!(config.server.request_timeout_secs, 10);
        assert_eq!(config.agent.max_steps, 8);
        assert_eq!(config.agent.system_prompt.as_deref(), Some("Be brief."));
    }

    #[tokio::test]
    async fn test_dot_dir_config_and_flag_overrides() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".docs-agent")).unwrap();
        std::fs::write(
            dir.path().join(".docs-agent").join("config.json"),
            r#"{"api_key": "sk-file", "model": "from-file"}"#,
        )
        .unwrap();

        let config = isolated(dir.path(), &[])
            .with_model_override("from-flag".to_string())
            .with_base_url_override("http://localhost:11434/v1".to_string())
            .with_server_command_override(vec!["./server".to_string(), "--stdio".to_string()])
            .with_max_steps_override(3)
            .with_startup_timeout_override(5)
            .load()
            .await
            .unwrap();

        assert_eq!(config.llm.api_key, "sk-file");
        assert_eq!(config.llm.model, "from-flag");
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.server.command, vec!["./server", "--stdio"]);
        assert_eq!(config.agent.max_steps, 3);
        assert_eq!(config.server.startup_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_server_command_from_env_is_split() {
        let dir = tempdir().unwrap();
        let config = isolated(
            dir.path(),
            &[
                ("OPENAI_API_KEY", "sk"),
                ("DOCS_AGENT_SERVER_COMMAND", "node  build/index.js"),
                ("DOCS_AGENT_MODEL", "preferred"),
                ("OPENAI_MODEL", "fallback"),
            ],
        )
        .load()
        .await
        .unwrap();
        assert_eq!(config.server.command, vec!["node", "build/index.js"]);
        assert_eq!(config.llm.model, "preferred");
    }

    #[tokio::test]
    async fn test_config_override_directory() {
        let dir = tempdir().unwrap();
        let conf_dir = dir.path().join("conf");
        std::fs::create_dir_all(&conf_dir).unwrap();
        std::fs::write(conf_dir.join("config.json"), r#"{"api_key": "sk-dir"}"#).unwrap();

        let config = isolated(dir.path(), &[])
            .with_config_override(conf_dir)
            .load()
            .await
            .unwrap();
        assert_eq!(config.llm.api_key, "sk-dir");

        let missing = isolated(dir.path(), &[])
            .with_config_override(dir.path().join("nope.json"))
            .load()
            .await
            .unwrap_err();
        assert!(missing.to_string().contains("override path"));
    }

    #[tokio::test]
    async fn test_invalid_values_are_rejected() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("docs-agent.json"),
            r#"{"api_key": "sk", "base_url": "ftp://example.com"}"#,
        )
        .unwrap();
        let err = isolated(dir.path(), &[]).load().await.unwrap_err();
        assert!(err.to_string().contains("validation failed"));

        std::fs::write(
            dir.path().join("docs-agent.json"),
            r#"{"api_key": "sk", "agent": {"max_steps": 0}}"#,
        )
        .unwrap();
        let err = isolated(dir.path(), &[]).load().await.unwrap_err();
        assert!(err.to_string().contains("max_steps"));

        std::fs::write(dir.path().join("docs-agent.json"), "{ not json").unwrap();
        let err = isolated(dir.path(), &[]).load().await.unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }
}
