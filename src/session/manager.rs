//! Connection manager
//!
//! Establishes and tears down the session of one store, replacing any live
//! session on reconnect.

use log::{debug, info, warn};

use crate::config::ConnectConfig;
use crate::error::{ConnectError, TransferError};
use crate::protocol::RemoteStore;
use crate::session::results::ConnectOutcome;
use crate::session::state::ConnectionState;

pub struct ConnectionManager {
    store: Box<dyn RemoteStore + Send>,
    state: ConnectionState,
}

impl ConnectionManager {
    pub fn new(store: Box<dyn RemoteStore + Send>) -> Self {
        Self {
            store,
            state: ConnectionState::Disconnected,
        }
    }

    /// Opens a new session, tearing down any existing one first.
    ///
    /// Never fails: a failed attempt is reported through the outcome and
    /// leaves the manager disconnected.
    pub fn connect(&mut self, config: &ConnectConfig) -> ConnectOutcome {
        if self.state == ConnectionState::Connected || self.store.is_connected() {
            warn!("session is live, will disconnect first....");
            self.disconnect();
        }

        if let Err(e) = config.validate() {
            let outcome = ConnectOutcome::failed(ConnectError::InvalidConfig(e.to_string()));
            info!("connect :{}", outcome.is_connected());
            return outcome;
        }

        let outcome = match self.store.connect(config) {
            Ok(()) if self.store.is_connected() => ConnectOutcome::connected(),
            Ok(()) => ConnectOutcome::failed(ConnectError::Channel(
                "store reports no live channel after connect".into(),
            )),
            Err(e) => {
                warn!(
                    "Failed to connect to {}:{} as {}: {}",
                    config.host,
                    config.port(),
                    config.username,
                    e
                );
                ConnectOutcome::failed(e)
            }
        };

        self.state = if outcome.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        };
        info!("connect :{}", outcome.is_connected());
        outcome
    }

    /// Releases the session. Safe to call when nothing is connected; close
    /// errors are logged and never escalate.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected && !self.store.is_connected() {
            debug!("disconnect requested with no live session");
            return;
        }

        if let Err(e) = self.store.disconnect() {
            warn!("Error while closing session: {}", e);
        }
        self.state = ConnectionState::Disconnected;
        info!("session disconnected");
    }

    /// Last known liveness of the sub-channel
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.store.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// The live store, or `NotConnected` without touching the network.
    pub fn active_store(&mut self) -> Result<&mut dyn RemoteStore, TransferError> {
        if !self.is_connected() {
            return Err(TransferError::NotConnected);
        }
        let store: &mut dyn RemoteStore = self.store.as_mut();
        Ok(store)
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.disconnect();
    }
}
