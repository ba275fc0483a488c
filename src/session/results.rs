//! Session result types
//!
//! Defines result structures returned by session operations.

use crate::error::ConnectError;

/// Result of a connect attempt.
///
/// A failed attempt is a value, not an error: the caller decides whether to
/// retry, and the cause stays available for diagnostics.
#[derive(Debug)]
pub struct ConnectOutcome {
    connected: bool,
    cause: Option<ConnectError>,
}

impl ConnectOutcome {
    pub fn connected() -> Self {
        Self {
            connected: true,
            cause: None,
        }
    }

    pub fn failed(cause: ConnectError) -> Self {
        Self {
            connected: false,
            cause: Some(cause),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn cause(&self) -> Option<&ConnectError> {
        self.cause.as_ref()
    }

    pub fn into_result(self) -> Result<(), ConnectError> {
        match self.cause {
            Some(cause) => Err(cause),
            None => Ok(()),
        }
    }
}
