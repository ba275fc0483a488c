//! Error handlers
//!
//! Logging and exit-status mapping for transfer errors.

use crate::error::types::{FailureKind, TransferError};
use log::error;

/// Log a transfer error
pub fn handle_error(err: &TransferError) {
    error!("Transfer error: {}", err);
}

/// Convert error to a process exit status
pub fn error_to_exit_code(err: &TransferError) -> u8 {
    match err.kind() {
        FailureKind::NotConnected => 3,
        FailureKind::Busy => 4,
        FailureKind::InvalidPath => 5,
        FailureKind::RemoteIo => 6,
        FailureKind::LocalIo => 7,
        FailureKind::Aborted => 8,
        FailureKind::Cancelled => 130,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::types::{RemoteOp, StoreError};

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let remote = TransferError::remote(RemoteOp::Rm, "/x", StoreError::NotFound("/x".into()));
        assert_eq!(error_to_exit_code(&remote), 6);
        assert_eq!(error_to_exit_code(&TransferError::NotConnected), 3);
        assert_eq!(
            error_to_exit_code(&TransferError::Cancelled { completed: vec![] }),
            130
        );
    }
}
