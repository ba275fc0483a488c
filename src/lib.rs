pub mod commands;
pub mod config;
pub mod error;
pub mod file_transfer;
pub mod listing;
pub mod navigate;
pub mod protocol;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use config::ConnectConfig;
pub use error::{ConnectError, FailureKind, StoreError, TransferError};
pub use file_transfer::{FileTransfer, SharedFileTransfer};
pub use listing::{EntryType, RemoteEntry};
pub use protocol::{Protocol, RemoteStore};
pub use session::ConnectOutcome;
pub use transfer::{CancelToken, TransferOutcome};
