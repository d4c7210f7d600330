//! LLM client abstractions and implementations

pub mod client;
pub mod message;
pub mod providers;

pub use client::{
    ChatOptions, FinishReason, FunctionDefinition, LlmClient, LlmResponse, ToolChoice,
    ToolDefinition, Usage,
};
pub use message::{LlmMessage, MessageRole, ToolCallRequest};
pub use providers::*;
