// file: src/main.rs
// version: 1.0.0
// guid: 9a4f2c71-6e0b-4d38-95a2-c7b13e8d0f54

//! galaxy-runner - Main entry point

use anyhow::Context;
use clap::Parser;
use galaxy_runner::{
    cli::{run_cli, Cli},
    logging,
};
use tokio::signal;
use tracing::warn;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.json_logs {
        logging::init_json_logger(cli.verbose, cli.quiet)
    } else {
        logging::init_logger(cli.verbose, cli.quiet)
    }
    .context("logging setup failed")?;

    let shutdown_signal = async {
        if signal::ctrl_c().await.is_err() {
            // No handler available; never resolve so the task runs to completion.
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = run_cli(&cli) => {
            result.with_context(|| format!("{} failed", cli.command.name()))
        }
        _ = shutdown_signal => {
            warn!("Interrupted by user");
            std::process::exit(130);
        }
    }
}
