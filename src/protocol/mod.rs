//! Protocol bindings
//!
//! The `RemoteStore` contract and its SFTP and FTP implementations.

pub mod ftp;
pub mod sftp;
pub mod store;

use serde::Deserialize;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::ConnectError;

pub use ftp::FtpStore;
pub use sftp::SftpStore;
pub use store::{LocalEnd, RawAttrs, RawEntry, RemoteStore, copy_stream};

/// Supported remote store protocols
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Sftp,
    Ftp,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Sftp => 22,
            Protocol::Ftp => 21,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Sftp => f.write_str("sftp"),
            Protocol::Ftp => f.write_str("ftp"),
        }
    }
}

/// Creates an unconnected store for the protocol
pub fn open_store(protocol: Protocol) -> Box<dyn RemoteStore + Send> {
    match protocol {
        Protocol::Sftp => Box::new(SftpStore::new()),
        Protocol::Ftp => Box::new(FtpStore::new()),
    }
}

/// First socket address the host resolves to
pub(crate) fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr, ConnectError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|_| ConnectError::Resolve(host.to_string()))?
        .next()
        .ok_or_else(|| ConnectError::Resolve(host.to_string()))
}
