//! rax-transfer - Entry Point
//!
//! Command line client for moving files to and from SFTP and FTP servers.

use clap::Parser;
use log::{error, info, warn};
use std::process::ExitCode;

use rax_transfer::commands::{self, Cli};
use rax_transfer::utils::logging;
use rax_transfer::{CancelToken, ConnectConfig};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let config = match ConnectConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Launching rax-transfer against {}://{}:{}",
        config.protocol,
        config.host,
        config.port()
    );

    // The engine blocks; cancellation is driven from the async side
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let command = cli.command;
    let mut task =
        tokio::task::spawn_blocking(move || commands::run(&config, command, worker_cancel));

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupt received, stopping after the current file...");
            cancel.cancel();
            task.await
        }
    };

    match joined {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("Transfer task failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
