//! Tool provider channel: an MCP server spawned as a child process

pub mod client;
pub mod protocol;

pub use client::McpClient;
pub use protocol::Implementation;
