//! Command handlers
//!
//! Runs one CLI command against a connected `FileTransfer` and reports the
//! result on stdout.

use chrono::DateTime;
use log::{error, info};
use std::path::Path;

use crate::commands::parser::Command;
use crate::config::ConnectConfig;
use crate::error::TransferError;
use crate::error::handlers::{error_to_exit_code, handle_error};
use crate::file_transfer::FileTransfer;
use crate::listing::RemoteEntry;
use crate::transfer::CancelToken;
use crate::transfer::results::{TransferOutcome, failed};

/// The session could not be established
pub const EXIT_CONNECT_FAILED: u8 = 1;
/// A tree operation finished with failed entries
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Connects, runs `command` and disconnects, returning the exit status.
pub fn run(config: &ConnectConfig, command: Command, cancel: CancelToken) -> u8 {
    let mut transfer = FileTransfer::for_protocol(config.protocol).with_cancel_token(cancel);

    let outcome = transfer.connect(config);
    if let Some(cause) = outcome.cause() {
        error!("Could not connect to {}: {}", config.host, cause);
        return EXIT_CONNECT_FAILED;
    }

    let code = execute(&mut transfer, command);
    transfer.disconnect();
    code
}

/// Handle a single command against a live session
pub fn execute(transfer: &mut FileTransfer, command: Command) -> u8 {
    info!("Executing {:?}", command);

    match command {
        Command::Ls { path } => finish_single(transfer.list_ordered(&path).map(|entries| {
            for entry in &entries {
                println!("{}", format_entry(entry));
            }
        })),
        Command::Get {
            remote,
            local,
            recursive: true,
        } => finish_tree(transfer.download_tree(&remote, &local)),
        Command::Get { remote, local, .. } => {
            finish_single(transfer.download(&remote, &local).map(|bytes| {
                println!("{} -> {} ({} bytes)", remote, local.display(), bytes);
            }))
        }
        Command::Put {
            local,
            remote_dir,
            recursive,
        } => {
            if !recursive && local.is_dir() {
                return finish_single(Err(TransferError::InvalidPath(format!(
                    "{} is a directory, use -r",
                    local.display()
                ))));
            }
            finish_tree(transfer.upload(Path::new(&local), &remote_dir))
        }
        Command::Rm {
            path,
            recursive: true,
        } => finish_tree(transfer.delete_tree(&path)),
        Command::Rm { path, .. } => finish_single(transfer.rm(&path)),
        Command::Mkdir { path } => finish_single(transfer.mkdir(&path)),
        Command::Rmdir { path } => finish_single(transfer.rmdir(&path)),
    }
}

fn finish_single(result: Result<(), TransferError>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            handle_error(&e);
            error_to_exit_code(&e)
        }
    }
}

fn finish_tree(result: Result<Vec<TransferOutcome>, TransferError>) -> u8 {
    match result {
        Ok(outcomes) => {
            report(&outcomes);
            if failed(&outcomes).is_empty() {
                0
            } else {
                EXIT_PARTIAL_FAILURE
            }
        }
        Err(e) => {
            report(e.completed());
            handle_error(&e);
            error_to_exit_code(&e)
        }
    }
}

fn report(outcomes: &[TransferOutcome]) {
    for outcome in outcomes {
        println!("{}", outcome);
    }
    let failures = failed(outcomes).len();
    println!(
        "{} items, {} succeeded, {} failed",
        outcomes.len(),
        outcomes.len() - failures,
        failures
    );
}

fn format_entry(entry: &RemoteEntry) -> String {
    let kind = if entry.is_directory() { 'd' } else { '-' };
    let modified = i64::try_from(entry.modified())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!("{} {:>12} {} {}", kind, entry.size(), modified, entry.name())
}
