//! Agent loop, transcript and configuration

pub mod config;
pub mod core;
pub mod execution;
pub mod prompt;
pub mod transcript;

pub use config::{AgentBuilder, AgentConfig, DEFAULT_MAX_STEPS};
pub use core::Agent;
pub use execution::QueryOutcome;
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use transcript::Transcript;
