//! Interactive mode command

use crate::config::CliConfigLoader;
use crate::output::ConsoleOutput;
use crate::session::InteractiveSession;
use anyhow::Result;
use tokio::io::BufReader;
use tracing::debug;

/// Start interactive mode
pub async fn interactive_command(config_loader: CliConfigLoader, verbose: bool) -> Result<()> {
    let mut session = InteractiveSession::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());

    let connected = match config_loader.load().await {
        Ok(config) => super::connect_agent(&config, Box::new(ConsoleOutput::new(verbose))).await,
        Err(e) => Err(e),
    };

    let mut agent = match connected {
        Ok(agent) => agent,
        Err(e) => {
            session.abort(&e).await?;
            return Err(e);
        }
    };

    let summary = session.run(&mut agent).await?;
    debug!(
        "Session ended: {} answered, {} failed",
        summary.answered, summary.failed
    );
    println!("Goodbye!");
    Ok(())
}
