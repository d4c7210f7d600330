//! System prompt seeded into every session

/// Instruction given to the model when no custom prompt is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert AI agent that answers questions about \
Elastic integration documentation. Use the provided tools exclusively to look up facts. \
Never guess or make up information. Only use the tools when necessary. \
When a tool call is needed, output only the tool call and no conversational text.";

/// Pick the configured prompt, falling back to the default one
pub fn resolve_system_prompt(custom: Option<&str>) -> &str {
    match custom {
        Some(prompt) if !prompt.trim().is_empty() => prompt,
        _ => DEFAULT_SYSTEM_PROMPT,
    }
}
