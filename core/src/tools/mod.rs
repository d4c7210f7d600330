//! Tool provider abstraction, catalog and result payloads

pub mod base;
pub mod catalog;
pub mod payload;

pub use base::{ToolProvider, ToolSpec};
pub use catalog::ToolCatalog;
pub use payload::unwrap_envelope;
