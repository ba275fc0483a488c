//! Navigation operations implementation

use log::{debug, info};

use crate::error::{RemoteOp, TransferError};
use crate::protocol::RemoteStore;

/// Determines whether a remote path is a directory.
///
/// Every call is a fresh stat against the store; nothing is cached.
pub fn is_directory(store: &mut dyn RemoteStore, path: &str) -> Result<bool, TransferError> {
    let attrs = store
        .stat(path)
        .map_err(|e| TransferError::remote(RemoteOp::Stat, path, e))?;

    debug!("path:[{}] is_dir:[{}]", path, attrs.is_dir);
    Ok(attrs.is_dir)
}

/// Changes the working directory and returns the new one.
pub fn change_directory(
    store: &mut dyn RemoteStore,
    target_path: &str,
) -> Result<String, TransferError> {
    if target_path.trim().is_empty() {
        return Err(TransferError::InvalidPath("Empty path provided".into()));
    }

    store
        .cd(target_path)
        .map_err(|e| TransferError::remote(RemoteOp::Cd, target_path, e))?;

    let new_path = working_directory(store)?;
    info!("Changed remote directory to {}", new_path);
    Ok(new_path)
}

/// Returns the session's working directory.
pub fn working_directory(store: &mut dyn RemoteStore) -> Result<String, TransferError> {
    store
        .pwd()
        .map_err(|e| TransferError::remote(RemoteOp::Pwd, ".", e))
}
