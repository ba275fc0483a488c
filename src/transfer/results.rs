//! Transfer result types
//!
//! Defines the per-file outcome records returned by transfer operations.

use std::fmt;

use crate::error::{FailureKind, TransferError};

/// Result of a single file operation
#[derive(Debug)]
pub struct TransferOutcome {
    path: String,
    bytes: u64,
    failure: Option<TransferError>,
}

impl TransferOutcome {
    pub fn succeeded(path: impl Into<String>, bytes: u64) -> Self {
        Self {
            path: path.into(),
            bytes,
            failure: None,
        }
    }

    pub fn failed(path: impl Into<String>, error: TransferError) -> Self {
        Self {
            path: path.into(),
            bytes: 0,
            failure: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Remote path the operation addressed
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn failure(&self) -> Option<&TransferError> {
        self.failure.as_ref()
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(TransferError::kind)
    }

    /// Bytes moved, or the error carried by a failed outcome.
    pub fn into_result(self) -> Result<u64, TransferError> {
        match self.failure {
            None => Ok(self.bytes),
            Some(error) => Err(error),
        }
    }
}

impl fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            None => write!(f, "ok     {} ({} bytes)", self.path, self.bytes),
            Some(error) => write!(f, "failed {}: {}", self.path, error),
        }
    }
}

/// True when any outcome in the sequence failed
pub fn has_failures(outcomes: &[TransferOutcome]) -> bool {
    outcomes.iter().any(|o| !o.is_success())
}

/// The failed outcomes of a sequence, in order
pub fn failed(outcomes: &[TransferOutcome]) -> Vec<&TransferOutcome> {
    outcomes.iter().filter(|o| !o.is_success()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcomes_are_reported() {
        let outcomes = vec![
            TransferOutcome::succeeded("/a/x", 10),
            TransferOutcome::failed("/a/y", TransferError::InvalidPath("/a/y".into())),
            TransferOutcome::succeeded("/a/z", 3),
        ];

        assert!(has_failures(&outcomes));
        let failures = failed(&outcomes);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path(), "/a/y");
        assert_eq!(failures[0].kind(), Some(FailureKind::InvalidPath));
        assert_eq!(failures[0].bytes(), 0);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(TransferOutcome::succeeded("/f", 7).into_result().ok(), Some(7));
        let err = TransferOutcome::failed("/f", TransferError::NotConnected)
            .into_result()
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::NotConnected);
        assert!(!has_failures(&[]));
    }
}
