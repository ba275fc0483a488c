//! Module `data_channel`
//!
//! Opens passive-mode data connections used by LIST, RETR and STOR.
//! Each transfer gets a fresh connection; it is closed when the stream drops.

use log::{debug, info};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::error::StoreError;
use crate::protocol::ftp::commands::Command;
use crate::protocol::ftp::control::ControlChannel;
use crate::protocol::ftp::parser::parse_pasv;
use crate::protocol::ftp::responses::ENTERING_PASSIVE;

/// Requests passive mode and connects to the advertised data socket.
///
/// An unspecified advertised address is replaced with the control peer's.
pub fn open_passive(
    control: &mut ControlChannel,
    timeout: Option<Duration>,
) -> Result<TcpStream, StoreError> {
    let reply = control.execute(&Command::PASV, &[ENTERING_PASSIVE])?;
    let mut data_socket = parse_pasv(&reply.text)?;

    if data_socket.ip().is_unspecified() {
        debug!(
            "Server advertised {}, using control peer {} instead",
            data_socket,
            control.peer_ip()
        );
        data_socket = SocketAddr::new(control.peer_ip(), data_socket.port());
    }

    // A refused data connection leaves the control connection usable
    let stream = match timeout {
        Some(t) => TcpStream::connect_timeout(&data_socket, t),
        None => TcpStream::connect(data_socket),
    }
    .map_err(|e| StoreError::Rejected(format!("Data connection to {} failed: {}", data_socket, e)))?;

    info!("Data connection established to {} in PASV mode", data_socket);
    Ok(stream)
}
