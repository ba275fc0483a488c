//! Module `file_ops`
//!
//! Single-entry operations: streaming one file to or from the remote store,
//! and creating or removing one remote entry.

use log::{error, info};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{RemoteOp, StoreError, TransferError};
use crate::protocol::RemoteStore;
use crate::storage::filesystem::{commit_staging_file, create_staging_file, open_file};
use crate::transfer::results::TransferOutcome;

const STREAM_ORIGIN: &str = "<stream>";

fn require_path(remote_path: &str) -> Result<(), TransferError> {
    if remote_path.trim().is_empty() {
        return Err(TransferError::InvalidPath(remote_path.to_string()));
    }
    Ok(())
}

/// A failure on the caller's end of the stream is local, anything else remote.
fn stream_failure(op: RemoteOp, remote_path: &str, local: &Path, error: StoreError) -> TransferError {
    match error {
        StoreError::Local(e) => TransferError::local(local, e),
        other => TransferError::remote(op, remote_path, other),
    }
}

fn put_from(
    store: &mut dyn RemoteStore,
    source: &mut dyn Read,
    origin: &Path,
    remote_path: &str,
) -> TransferOutcome {
    if let Err(e) = require_path(remote_path) {
        return TransferOutcome::failed(remote_path, e);
    }

    info!("Starting upload to {}", remote_path);
    match store.put(source, remote_path) {
        Ok(bytes) => {
            info!("Upload completed: {} ({} bytes)", remote_path, bytes);
            TransferOutcome::succeeded(remote_path, bytes)
        }
        Err(e) => {
            error!("Upload of {} failed: {}", remote_path, e);
            TransferOutcome::failed(remote_path, stream_failure(RemoteOp::Put, remote_path, origin, e))
        }
    }
}

/// Streams caller-owned bytes to `remote_path`.
///
/// The reader is borrowed: opening and closing it stays with the caller.
pub fn put_file(
    store: &mut dyn RemoteStore,
    source: &mut dyn Read,
    remote_path: &str,
) -> TransferOutcome {
    put_from(store, source, Path::new(STREAM_ORIGIN), remote_path)
}

/// Opens `local_path` and uploads its contents to `remote_path`.
pub fn upload_local_file(
    store: &mut dyn RemoteStore,
    local_path: &Path,
    remote_path: &str,
) -> TransferOutcome {
    let mut file = match open_file(local_path) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open local file {}: {}", local_path.display(), e);
            return TransferOutcome::failed(remote_path, TransferError::local(local_path, e));
        }
    };
    put_from(store, &mut file, local_path, remote_path)
}

/// Downloads `remote_path` into `local_path`, creating or truncating it.
///
/// Bytes land in a uniquely named staging file in the same directory, which
/// replaces `local_path` once the transfer completes and is removed if it
/// fails. An existing `local_path` survives a failed download.
pub fn get_file(store: &mut dyn RemoteStore, remote_path: &str, local_path: &Path) -> TransferOutcome {
    if let Err(e) = require_path(remote_path) {
        return TransferOutcome::failed(remote_path, e);
    }

    info!(
        "Starting download: {} -> {}",
        remote_path,
        local_path.display()
    );

    let mut staged = match create_staging_file(local_path) {
        Ok(staged) => staged,
        Err(e) => {
            error!("Failed to create local file {}: {}", local_path.display(), e);
            return TransferOutcome::failed(remote_path, TransferError::local(local_path, e));
        }
    };

    let received = store
        .get(remote_path, &mut staged)
        .map_err(|e| stream_failure(RemoteOp::Get, remote_path, local_path, e))
        .and_then(|bytes| {
            staged
                .flush()
                .map(|_| bytes)
                .map_err(|e| TransferError::local(local_path, e))
        });

    // Dropping `staged` on any error path removes the staging file
    let committed = received.and_then(|bytes| {
        commit_staging_file(staged, local_path)
            .map(|_| bytes)
            .map_err(|e| TransferError::local(local_path, e))
    });

    match committed {
        Ok(bytes) => {
            info!("Download completed: {} ({} bytes)", remote_path, bytes);
            TransferOutcome::succeeded(remote_path, bytes)
        }
        Err(e) => {
            error!("Download of {} failed: {}", remote_path, e);
            TransferOutcome::failed(remote_path, e)
        }
    }
}

pub fn make_directory(store: &mut dyn RemoteStore, remote_path: &str) -> Result<(), TransferError> {
    require_path(remote_path)?;
    store
        .mkdir(remote_path)
        .map_err(|e| TransferError::remote(RemoteOp::Mkdir, remote_path, e))?;
    info!("Created remote directory {}", remote_path);
    Ok(())
}

/// Removes an empty remote directory; stores reject non-empty ones.
pub fn remove_directory(store: &mut dyn RemoteStore, remote_path: &str) -> Result<(), TransferError> {
    require_path(remote_path)?;
    store
        .rmdir(remote_path)
        .map_err(|e| TransferError::remote(RemoteOp::Rmdir, remote_path, e))?;
    info!("Removed remote directory {}", remote_path);
    Ok(())
}

pub fn remove_file(store: &mut dyn RemoteStore, remote_path: &str) -> Result<(), TransferError> {
    require_path(remote_path)?;
    store
        .rm(remote_path)
        .map_err(|e| TransferError::remote(RemoteOp::Rm, remote_path, e))?;
    info!("Removed remote file {}", remote_path);
    Ok(())
}
