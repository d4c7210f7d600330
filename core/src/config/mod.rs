//! Minimal configuration module for docs-agent core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{McpServerConfig, ModelParams, ResolvedLlmConfig};
