//! # docs-agent CLI
//!
//! Command-line interface for docs-agent, a conversational agent that answers
//! questions about integration documentation through MCP tools.
//!
//! ## Usage
//!
//! - `docs-agent` - Start an interactive session
//! - `docs-agent "question"` - Answer a single question
//! - `docs-agent tools` - Show the tools exposed by the MCP server

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;
mod session;

use commands::{ask_command, interactive_command, tools_command};
use config::CliConfigLoader;

/// docs-agent - Ask questions about integration documentation
#[derive(Parser)]
#[command(name = "docs-agent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A conversational agent that answers documentation questions through MCP tools")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Logical name of the MCP server
    #[arg(long)]
    server_name: Option<String>,

    /// Command that starts the MCP server, e.g. `--server-command node build/index.js`
    #[arg(long, num_args = 1.., allow_hyphen_values = true, value_terminator = "--")]
    server_command: Option<Vec<String>>,

    /// Maximum number of LLM round trips per question
    #[arg(long)]
    max_steps: Option<usize>,

    /// Seconds allowed for the MCP server to start
    #[arg(long)]
    startup_timeout: Option<u64>,

    /// Enable verbose logging and tool result previews
    #[arg(short, long)]
    verbose: bool,

    /// The question to answer (if provided, runs in single-question mode)
    question: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tools exposed by the MCP server
    Tools,
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(server_name) = &cli.server_name {
        loader = loader.with_server_name_override(server_name.clone());
    }

    if let Some(server_command) = &cli.server_command {
        loader = loader.with_server_command_override(server_command.clone());
    }

    if let Some(max_steps) = cli.max_steps {
        loader = loader.with_max_steps_override(max_steps);
    }

    if let Some(seconds) = cli.startup_timeout {
        loader = loader.with_startup_timeout_override(seconds);
    }

    loader
}

/// Print a failure with its classification
fn report(error: &anyhow::Error) {
    eprintln!("{}", session::format_startup_error(error));
}

async fn run(cli: Cli) -> Result<()> {
    let config_loader = build_config_loader(&cli);

    match (cli.question, cli.command) {
        (Some(question), None) => ask_command(question, config_loader, cli.verbose).await,
        (Some(_), Some(_)) => Err(anyhow::anyhow!(
            "Cannot specify both a question and a subcommand"
        )),
        (None, Some(Commands::Tools)) => tools_command(config_loader).await,
        (None, None) => interactive_command(config_loader, cli.verbose).await,
    }
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    docs_agent_core::init_tracing_with_debug(cli.verbose);

    let interactive = cli.question.is_none() && cli.command.is_none();
    if let Err(e) = run(cli).await {
        // The interactive session has already printed its startup failure
        if !interactive {
            report(&e);
        }
        std::process::exit(1);
    }
}
