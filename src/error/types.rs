//! Error types
//!
//! Defines the error types raised while connecting to a remote store,
//! reported by store backends, and surfaced by transfer operations.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::transfer::results::TransferOutcome;

/// Errors raised while establishing a session
#[derive(Debug)]
pub enum ConnectError {
    InvalidConfig(String),
    Resolve(String),
    Transport(io::Error),
    Handshake(String),
    HostKey(String),
    Authentication(String),
    Channel(String),
    Protocol(String),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::InvalidConfig(msg) => write!(f, "Invalid connection config: {}", msg),
            ConnectError::Resolve(host) => write!(f, "Could not resolve host: {}", host),
            ConnectError::Transport(e) => write!(f, "Transport error: {}", e),
            ConnectError::Handshake(msg) => write!(f, "Handshake failed: {}", msg),
            ConnectError::HostKey(msg) => write!(f, "Host key verification failed: {}", msg),
            ConnectError::Authentication(user) => {
                write!(f, "Authentication failed for user: {}", user)
            }
            ConnectError::Channel(msg) => write!(f, "Could not open channel: {}", msg),
            ConnectError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectError {}

impl From<io::Error> for ConnectError {
    fn from(error: io::Error) -> Self {
        ConnectError::Transport(error)
    }
}

/// Raw failure reported by a store backend
#[derive(Debug)]
pub enum StoreError {
    NotConnected,
    NotFound(String),
    PermissionDenied(String),
    Rejected(String),
    Protocol(String),
    Io(io::Error),
    /// The local end of a stream failed (the caller's reader or sink)
    Local(io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotConnected => write!(f, "Channel is not connected"),
            StoreError::NotFound(p) => write!(f, "No such file or directory: {}", p),
            StoreError::PermissionDenied(p) => write!(f, "Permission denied: {}", p),
            StoreError::Rejected(msg) => write!(f, "Rejected by server: {}", msg),
            StoreError::Protocol(msg) => write!(f, "Protocol error: {}", msg),
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Local(e) => write!(f, "Local stream error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        StoreError::Io(error)
    }
}

/// Remote command that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    List,
    Stat,
    Get,
    Put,
    Mkdir,
    Rmdir,
    Rm,
    Cd,
    Pwd,
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteOp::List => "list",
            RemoteOp::Stat => "stat",
            RemoteOp::Get => "get",
            RemoteOp::Put => "put",
            RemoteOp::Mkdir => "mkdir",
            RemoteOp::Rmdir => "rmdir",
            RemoteOp::Rm => "rm",
            RemoteOp::Cd => "cd",
            RemoteOp::Pwd => "pwd",
        };
        f.write_str(name)
    }
}

/// Classification attached to a failed outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotConnected,
    Busy,
    InvalidPath,
    RemoteIo,
    LocalIo,
    Cancelled,
    Aborted,
}

/// Errors surfaced by file transfer operations
#[derive(Debug)]
pub enum TransferError {
    NotConnected,
    Busy,
    InvalidPath(String),
    RemoteIo {
        op: RemoteOp,
        path: String,
        source: StoreError,
    },
    LocalIo {
        path: PathBuf,
        source: io::Error,
    },
    Cancelled {
        completed: Vec<TransferOutcome>,
    },
    TreeAborted {
        path: String,
        source: Box<TransferError>,
        completed: Vec<TransferOutcome>,
    },
}

impl TransferError {
    pub fn remote(op: RemoteOp, path: &str, source: StoreError) -> Self {
        TransferError::RemoteIo {
            op,
            path: path.to_string(),
            source,
        }
    }

    pub fn local(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransferError::LocalIo {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            TransferError::NotConnected => FailureKind::NotConnected,
            TransferError::Busy => FailureKind::Busy,
            TransferError::InvalidPath(_) => FailureKind::InvalidPath,
            TransferError::RemoteIo { .. } => FailureKind::RemoteIo,
            TransferError::LocalIo { .. } => FailureKind::LocalIo,
            TransferError::Cancelled { .. } => FailureKind::Cancelled,
            TransferError::TreeAborted { .. } => FailureKind::Aborted,
        }
    }

    /// Outcomes a tree operation finished before it stopped.
    pub fn completed(&self) -> &[TransferOutcome] {
        match self {
            TransferError::Cancelled { completed } => completed,
            TransferError::TreeAborted { completed, .. } => completed,
            _ => &[],
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NotConnected => write!(f, "No live session, connect first"),
            TransferError::Busy => {
                write!(f, "Another operation is already running on this session")
            }
            TransferError::InvalidPath(p) => write!(f, "Invalid path: {}", p),
            TransferError::RemoteIo { op, path, source } => {
                write!(f, "Remote {} failed for {}: {}", op, path, source)
            }
            TransferError::LocalIo { path, source } => {
                write!(f, "Local I/O failed for {}: {}", path.display(), source)
            }
            TransferError::Cancelled { completed } => {
                write!(f, "Cancelled after {} completed items", completed.len())
            }
            TransferError::TreeAborted { path, source, .. } => {
                write!(f, "Tree operation aborted at {}: {}", path, source)
            }
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::RemoteIo { source, .. } => Some(source),
            TransferError::LocalIo { source, .. } => Some(source),
            TransferError::TreeAborted { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
