//! FTP control connection
//!
//! Sends commands and reads replies on the control channel.

use log::debug;
use std::io::{BufReader, Write};
use std::net::{IpAddr, Shutdown, TcpStream};
use std::time::Duration;

use crate::error::StoreError;
use crate::protocol::ftp::commands::Command;
use crate::protocol::ftp::responses::{Reply, read_reply, reply_to_error};
use crate::utils::validation::contains_control_break;

pub struct ControlChannel {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    peer_ip: IpAddr,
}

impl ControlChannel {
    pub fn new(stream: TcpStream) -> Result<Self, StoreError> {
        let peer_ip = stream.peer_addr()?.ip();
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            peer_ip,
        })
    }

    /// Address of the server end of the control connection
    pub fn peer_ip(&self) -> IpAddr {
        self.peer_ip
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), StoreError> {
        self.writer.set_read_timeout(timeout)?;
        Ok(())
    }

    pub fn read_reply(&mut self) -> Result<Reply, StoreError> {
        let reply = read_reply(&mut self.reader)?;
        debug!("<- {}", reply);
        Ok(reply)
    }

    /// Sends a command without waiting for the reply
    pub fn send(&mut self, command: &Command) -> Result<(), StoreError> {
        if command.argument().is_some_and(contains_control_break) {
            return Err(StoreError::Protocol(format!(
                "Line break in argument of {}",
                command
            )));
        }
        debug!("-> {}", command);
        self.writer.write_all(command.to_wire().as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }

    /// Sends a command and reads the reply, which must carry one of `expected` codes.
    pub fn execute(&mut self, command: &Command, expected: &[u16]) -> Result<Reply, StoreError> {
        self.send(command)?;
        let reply = self.read_reply()?;
        expect(reply, expected, command.argument())
    }

    pub fn shutdown(&self) {
        let _ = self.writer.shutdown(Shutdown::Both);
    }
}

/// Checks a reply code, mapping unexpected replies to store errors.
pub fn expect(reply: Reply, expected: &[u16], target: Option<&str>) -> Result<Reply, StoreError> {
    if expected.contains(&reply.code) {
        Ok(reply)
    } else {
        Err(reply_to_error(&reply, target))
    }
}
