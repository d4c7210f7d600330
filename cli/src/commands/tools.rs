//! Tools listing command

use crate::config::CliConfigLoader;
use anyhow::Result;
use console::style;
use docs_agent_core::output::NullOutput;
use docs_agent_core::ToolSpec;

/// Connect to the tool provider and print its catalog
pub async fn tools_command(config_loader: CliConfigLoader) -> Result<()> {
    let config = config_loader.load().await?;
    let mut agent = super::connect_agent(&config, Box::new(NullOutput)).await?;

    println!(
        "{}\n",
        style(format!("Tools exposed by {}", agent.provider_name())).bold()
    );
    for tool in agent.catalog().iter() {
        println!("{}", format_tool(tool));
    }
    if agent.catalog().is_empty() {
        println!("(no tools)");
    }

    agent.shutdown().await?;
    Ok(())
}

/// Name followed by the first line of the description
fn format_tool(tool: &ToolSpec) -> String {
    let first_line = tool.description.lines().next().unwrap_or("");
    format!("{}\n   {}\n", style(&tool.name).cyan().bold(), first_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_tool_keeps_first_line() {
        let tool = ToolSpec::new(
            "search_service_docs",
            "Search for service-specific documentation.\nLonger details follow.",
            json!({"type": "object"}),
        );
        let text = console::strip_ansi_codes(&format_tool(&tool)).to_string();
        assert_eq!(
            text,
            "search_service_docs\n   Search for service-specific documentation.\n"
        );
    }
}
