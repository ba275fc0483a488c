//! Recursive tree operations
//!
//! Download, delete and upload applied to a directory and all its
//! descendants. A failure on one leaf is recorded as a failed outcome and the
//! traversal moves on to its siblings. Only failing to classify or list the
//! node being traversed stops the walk; the outcomes gathered so far travel
//! with the error.

use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{RemoteOp, StoreError, TransferError};
use crate::listing::{EntryType, list_directory};
use crate::navigate::{is_directory, path};
use crate::protocol::RemoteStore;
use crate::storage::filesystem::create_directory;
use crate::storage::validation::local_child_path;
use crate::transfer::cancel::CancelToken;
use crate::transfer::file_ops::{get_file, remove_directory, remove_file, upload_local_file};
use crate::transfer::results::TransferOutcome;

/// Why a traversal stopped early
enum Halt {
    Cancelled,
    Failed { path: String, source: TransferError },
}

struct Traversal<'a> {
    store: &'a mut dyn RemoteStore,
    cancel: &'a CancelToken,
    outcomes: Vec<TransferOutcome>,
}

impl<'a> Traversal<'a> {
    fn new(store: &'a mut dyn RemoteStore, cancel: &'a CancelToken) -> Self {
        Self {
            store,
            cancel,
            outcomes: Vec::new(),
        }
    }

    fn check_cancelled(&self) -> Result<(), Halt> {
        if self.cancel.is_cancelled() {
            Err(Halt::Cancelled)
        } else {
            Ok(())
        }
    }

    fn record(&mut self, outcome: TransferOutcome) {
        if let Some(e) = outcome.failure() {
            error!("Skipping {}: {}", outcome.path(), e);
        }
        self.outcomes.push(outcome);
    }

    /// Whether `remote_path` is a directory. Children carry the type their
    /// parent listing already checked, so only the root needs a stat.
    fn classify(&mut self, remote_path: &str, listed: Option<EntryType>) -> Result<bool, Halt> {
        if let Some(listed) = listed {
            return Ok(listed.is_directory());
        }
        is_directory(self.store, remote_path).map_err(|source| Halt::Failed {
            path: remote_path.to_string(),
            source,
        })
    }

    fn children(&mut self, remote_dir: &str) -> Result<Vec<(String, EntryType)>, Halt> {
        let entries = list_directory(self.store, remote_dir).map_err(|source| Halt::Failed {
            path: remote_dir.to_string(),
            source,
        })?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.name().to_string(), entry.entry_type()))
            .collect())
    }

    fn download(
        &mut self,
        remote_path: &str,
        local_path: &Path,
        listed: Option<EntryType>,
    ) -> Result<(), Halt> {
        self.check_cancelled()?;

        if !self.classify(remote_path, listed)? {
            // A file root may point into a directory that does not exist yet
            if listed.is_none() {
                if let Some(parent) = local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    create_directory(parent).map_err(|e| Halt::Failed {
                        path: remote_path.to_string(),
                        source: TransferError::local(parent, e),
                    })?;
                }
            }
            let outcome = get_file(self.store, remote_path, local_path);
            self.record(outcome);
            return Ok(());
        }

        create_directory(local_path).map_err(|e| Halt::Failed {
            path: remote_path.to_string(),
            source: TransferError::local(local_path, e),
        })?;

        for (name, entry_type) in self.children(remote_path)? {
            let child = path::join(remote_path, &name);
            match local_child_path(local_path, &name) {
                Some(local_child) => self.download(&child, &local_child, Some(entry_type))?,
                None => self.record(TransferOutcome::failed(
                    child,
                    TransferError::InvalidPath(name),
                )),
            }
        }
        Ok(())
    }

    fn delete(&mut self, remote_path: &str, listed: Option<EntryType>) -> Result<(), Halt> {
        self.check_cancelled()?;

        if !self.classify(remote_path, listed)? {
            let outcome = leaf_outcome(remote_path, remove_file(self.store, remote_path));
            self.record(outcome);
            return Ok(());
        }

        for (name, entry_type) in self.children(remote_path)? {
            let child = path::join(remote_path, &name);
            self.delete(&child, Some(entry_type))?;
        }

        self.check_cancelled()?;
        let outcome = leaf_outcome(remote_path, remove_directory(self.store, remote_path));
        self.record(outcome);
        Ok(())
    }

    fn upload(&mut self, local_path: &Path, remote_dir: &str) -> Result<(), Halt> {
        self.check_cancelled()?;

        let halt_local = |e: std::io::Error| Halt::Failed {
            path: local_path.display().to_string(),
            source: TransferError::local(local_path, e),
        };

        let metadata = std::fs::metadata(local_path).map_err(halt_local)?;
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Halt::Failed {
                path: local_path.display().to_string(),
                source: TransferError::InvalidPath(local_path.display().to_string()),
            })?;
        let remote_root = path::join(remote_dir, &name);

        if !metadata.is_dir() {
            let outcome = upload_local_file(self.store, local_path, &remote_root);
            self.record(outcome);
            return Ok(());
        }

        ensure_remote_dir(self.store, &remote_root).map_err(|source| Halt::Failed {
            path: remote_root.clone(),
            source,
        })?;

        let walker = WalkDir::new(local_path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let failed_path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let remote = remote_target(&remote_root, local_path, &failed_path);
                    let source = TransferError::local(failed_path, e.into());
                    self.record(TransferOutcome::failed(remote, source));
                    continue;
                }
            };

            let remote = remote_target(&remote_root, local_path, entry.path());
            if entry.file_type().is_dir() {
                if let Err(e) = ensure_remote_dir(self.store, &remote) {
                    error!("Could not create remote directory {}: {}", remote, e);
                }
                continue;
            }

            self.check_cancelled()?;
            let outcome = upload_local_file(self.store, entry.path(), &remote);
            self.record(outcome);
        }
        Ok(())
    }

    fn finish(self, operation: &str, result: Result<(), Halt>) -> Result<Vec<TransferOutcome>, TransferError> {
        let completed = self.outcomes;
        match result {
            Ok(()) => {
                let failures = completed.iter().filter(|o| !o.is_success()).count();
                info!(
                    "{} finished: {} items, {} failed",
                    operation,
                    completed.len(),
                    failures
                );
                Ok(completed)
            }
            Err(Halt::Cancelled) => {
                warn!("{} cancelled after {} items", operation, completed.len());
                Err(TransferError::Cancelled { completed })
            }
            Err(Halt::Failed { path, source }) => {
                error!("{} aborted at {}: {}", operation, path, source);
                Err(TransferError::TreeAborted {
                    path,
                    source: Box::new(source),
                    completed,
                })
            }
        }
    }
}

fn leaf_outcome(remote_path: &str, result: Result<(), TransferError>) -> TransferOutcome {
    match result {
        Ok(()) => TransferOutcome::succeeded(remote_path, 0),
        Err(e) => TransferOutcome::failed(remote_path, e),
    }
}

/// Remote counterpart of a local path found under `local_root`
fn remote_target(remote_root: &str, local_root: &Path, local_path: &Path) -> String {
    let relative: PathBuf = local_path
        .strip_prefix(local_root)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    relative
        .components()
        .fold(remote_root.to_string(), |acc, part| {
            path::join(&acc, &part.as_os_str().to_string_lossy())
        })
}

/// Creates `remote_path` unless a directory already exists there.
fn ensure_remote_dir(store: &mut dyn RemoteStore, remote_path: &str) -> Result<(), TransferError> {
    match store.stat(remote_path) {
        Ok(attrs) if attrs.is_dir => {
            debug!("Reusing remote directory {}", remote_path);
            Ok(())
        }
        Ok(_) => Err(TransferError::remote(
            RemoteOp::Mkdir,
            remote_path,
            StoreError::Rejected(format!("{} exists and is not a directory", remote_path)),
        )),
        Err(_) => store
            .mkdir(remote_path)
            .map_err(|e| TransferError::remote(RemoteOp::Mkdir, remote_path, e)),
    }
}

/// Mirrors `remote_path` into `local_root`.
///
/// A file yields exactly one outcome. A directory yields one outcome per leaf
/// file, parents before children and children in listing order.
pub fn download_tree(
    store: &mut dyn RemoteStore,
    remote_path: &str,
    local_root: &Path,
    cancel: &CancelToken,
) -> Result<Vec<TransferOutcome>, TransferError> {
    info!(
        "Downloading tree {} -> {}",
        remote_path,
        local_root.display()
    );
    let mut traversal = Traversal::new(store, cancel);
    let result = traversal.download(remote_path, local_root, None);
    traversal.finish("Download", result)
}

/// Removes `remote_path` and everything below it, children before their
/// directory.
///
/// Unlike `download_tree`, which reports leaf files only, directories get an
/// outcome too: the outcomes cover files and directories in removal order.
pub fn delete_tree(
    store: &mut dyn RemoteStore,
    remote_path: &str,
    cancel: &CancelToken,
) -> Result<Vec<TransferOutcome>, TransferError> {
    info!("Deleting tree {}", remote_path);
    let mut traversal = Traversal::new(store, cancel);
    let result = traversal.delete(remote_path, None);
    traversal.finish("Delete", result)
}

/// Uploads a local file or directory into `remote_dir`.
///
/// `local_path` lands at `remote_dir/<name>`; directories are mirrored with
/// children in file-name order and existing remote directories are reused.
pub fn upload_tree(
    store: &mut dyn RemoteStore,
    local_path: &Path,
    remote_dir: &str,
    cancel: &CancelToken,
) -> Result<Vec<TransferOutcome>, TransferError> {
    info!(
        "Uploading tree {} -> {}",
        local_path.display(),
        remote_dir
    );
    let mut traversal = Traversal::new(store, cancel);
    let result = traversal.upload(local_path, remote_dir);
    traversal.finish("Upload", result)
}
