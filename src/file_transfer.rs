//! Module `file_transfer`
//!
//! Public facade combining the connection manager, directory listing, path
//! classification and the transfer engine into the operations callers use.
//! Every operation except connect, disconnect and is_connected requires a
//! live session and fails with `NotConnected` before touching the network.

use log::{info, warn};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex, TryLockError};

use crate::config::ConnectConfig;
use crate::error::TransferError;
use crate::listing::{RemoteEntry, list_directory, list_directory_map};
use crate::navigate::{change_directory, is_directory, working_directory};
use crate::protocol::{Protocol, RemoteStore, open_store};
use crate::session::{ConnectOutcome, ConnectionManager};
use crate::transfer::{
    CancelToken, TransferOutcome, delete_tree, download_tree, file_ops, get_file, put_file,
    upload_tree,
};

pub struct FileTransfer {
    connection: ConnectionManager,
    cancel: CancelToken,
}

impl FileTransfer {
    pub fn new(store: Box<dyn RemoteStore + Send>) -> Self {
        Self {
            connection: ConnectionManager::new(store),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_store<S: RemoteStore + Send + 'static>(store: S) -> Self {
        Self::new(Box::new(store))
    }

    pub fn for_protocol(protocol: Protocol) -> Self {
        Self::new(open_store(protocol))
    }

    /// Uses `token` to cancel tree operations instead of a private one.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn connect(&mut self, config: &ConnectConfig) -> ConnectOutcome {
        self.connection.connect(config)
    }

    pub fn disconnect(&mut self) {
        self.connection.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    fn store(&mut self) -> Result<&mut dyn RemoteStore, TransferError> {
        self.connection.active_store()
    }

    /// Changes the working directory, returning the new one.
    pub fn cd(&mut self, remote_path: &str) -> Result<String, TransferError> {
        change_directory(self.store()?, remote_path)
    }

    pub fn pwd(&mut self) -> Result<String, TransferError> {
        working_directory(self.store()?)
    }

    pub fn mkdir(&mut self, remote_path: &str) -> Result<(), TransferError> {
        file_ops::make_directory(self.store()?, remote_path)
    }

    pub fn rmdir(&mut self, remote_path: &str) -> Result<(), TransferError> {
        file_ops::remove_directory(self.store()?, remote_path)
    }

    pub fn rm(&mut self, remote_path: &str) -> Result<(), TransferError> {
        file_ops::remove_file(self.store()?, remote_path)
    }

    /// Entries of a directory keyed by name, without `.` and `..`.
    pub fn list(&mut self, remote_path: &str) -> Result<HashMap<String, RemoteEntry>, TransferError> {
        list_directory_map(self.store()?, remote_path)
    }

    /// Entries of a directory in listing order.
    pub fn list_ordered(&mut self, remote_path: &str) -> Result<Vec<RemoteEntry>, TransferError> {
        list_directory(self.store()?, remote_path)
    }

    pub fn is_directory(&mut self, remote_path: &str) -> Result<bool, TransferError> {
        is_directory(self.store()?, remote_path)
    }

    /// Streams `source` to `remote_path`, returning the bytes written.
    pub fn upload_stream(
        &mut self,
        source: &mut dyn Read,
        remote_path: &str,
    ) -> Result<u64, TransferError> {
        put_file(self.store()?, source, remote_path).into_result()
    }

    /// Uploads a local file or directory into `remote_dir`.
    pub fn upload(
        &mut self,
        local_path: &Path,
        remote_dir: &str,
    ) -> Result<Vec<TransferOutcome>, TransferError> {
        let cancel = self.cancel.clone();
        upload_tree(self.store()?, local_path, remote_dir, &cancel)
    }

    /// Downloads one remote file to `local_path`, returning the bytes read.
    pub fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64, TransferError> {
        get_file(self.store()?, remote_path, local_path).into_result()
    }

    pub fn download_tree(
        &mut self,
        remote_path: &str,
        local_root: &Path,
    ) -> Result<Vec<TransferOutcome>, TransferError> {
        let cancel = self.cancel.clone();
        download_tree(self.store()?, remote_path, local_root, &cancel)
    }

    pub fn delete_tree(&mut self, remote_path: &str) -> Result<Vec<TransferOutcome>, TransferError> {
        let cancel = self.cancel.clone();
        delete_tree(self.store()?, remote_path, &cancel)
    }
}

/// A `FileTransfer` shared between threads.
///
/// Operations never queue: a call made while another one holds the session
/// fails with `Busy`.
#[derive(Clone)]
pub struct SharedFileTransfer {
    inner: Arc<Mutex<FileTransfer>>,
    cancel: CancelToken,
}

impl SharedFileTransfer {
    pub fn new(transfer: FileTransfer) -> Self {
        let cancel = transfer.cancel_token();
        Self {
            inner: Arc::new(Mutex::new(transfer)),
            cancel,
        }
    }

    /// Runs `operation` with exclusive use of the session.
    pub fn run<T>(
        &self,
        operation: impl FnOnce(&mut FileTransfer) -> Result<T, TransferError>,
    ) -> Result<T, TransferError> {
        let mut guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => {
                info!("Rejected operation, session busy");
                return Err(TransferError::Busy);
            }
            Err(TryLockError::Poisoned(poisoned)) => {
                warn!("Previous operation panicked, resetting session");
                let mut guard = poisoned.into_inner();
                guard.disconnect();
                self.inner.clear_poison();
                guard
            }
        };
        operation(&mut guard)
    }

    /// Cancels the tree operation currently running, if any.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}
