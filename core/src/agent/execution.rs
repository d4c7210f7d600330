//! Result of a completed query

use crate::llm::Usage;
use serde::{Deserialize, Serialize};

/// What a successful query produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// Final natural-language answer
    pub answer: String,

    /// Number of LLM round trips
    pub steps: usize,

    /// Number of tool calls executed
    pub tool_calls: usize,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Tokens consumed by this query
    pub usage: Usage,
}
