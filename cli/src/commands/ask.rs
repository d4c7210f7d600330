//! Single query command

use crate::config::CliConfigLoader;
use crate::output::ConsoleOutput;
use anyhow::Result;
use console::style;
use tracing::debug;

/// Answer one question and exit
pub async fn ask_command(question: String, config_loader: CliConfigLoader, verbose: bool) -> Result<()> {
    let config = config_loader.load().await?;
    let mut agent = super::connect_agent(&config, Box::new(ConsoleOutput::new(verbose))).await?;

    let result = agent.process_query(&question).await;
    if let Err(e) = agent.shutdown().await {
        tracing::warn!("Failed to shut down tool provider: {}", e);
    }

    let outcome = result?;
    println!("{}\n{}", style("[AGENT]").green().bold(), outcome.answer);

    debug!(
        "Answered in {} step(s), {} tool call(s), {} ms",
        outcome.steps, outcome.tool_calls, outcome.duration_ms
    );
    if verbose && outcome.usage.total_tokens > 0 {
        println!(
            "{}",
            style(format!(
                "Tokens: {} input + {} output = {} total",
                outcome.usage.prompt_tokens,
                outcome.usage.completion_tokens,
                outcome.usage.total_tokens
            ))
            .dim()
        );
    }

    Ok(())
}
