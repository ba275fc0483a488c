//! FTP binding
//!
//! Implements `RemoteStore` over a plain FTP control connection with
//! passive-mode data connections (RFC 959, plus SIZE/MDTM from RFC 3659).

pub mod commands;
pub mod control;
pub mod data_channel;
pub mod parser;
pub mod responses;

use chrono::Utc;
use log::{debug, info, warn};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::config::ConnectConfig;
use crate::error::{ConnectError, StoreError};
use crate::protocol::resolve_addr;
use crate::protocol::store::{LocalEnd, RawAttrs, RawEntry, RemoteStore, copy_stream};
use commands::Command;
use control::{ControlChannel, expect};
use data_channel::open_passive;
use parser::{parse_listing, parse_mdtm, parse_quoted_path};
use responses::*;

const DATA_OPENED: &[u16] = &[OPENING_DATA, DATA_ALREADY_OPEN];
const DATA_DONE: &[u16] = &[TRANSFER_COMPLETE, FILE_ACTION_OK];

/// FTP control connection plus per-transfer data connections
#[derive(Default)]
pub struct FtpStore {
    control: Option<ControlChannel>,
    timeout: Option<Duration>,
}

impl FtpStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a control command. An I/O failure means the control connection is
    /// gone, so the store is marked disconnected.
    fn execute(&mut self, command: &Command, expected: &[u16]) -> Result<Reply, StoreError> {
        let control = self.control.as_mut().ok_or(StoreError::NotConnected)?;
        let result = control.execute(command, expected);
        self.drop_on_io_error(result)
    }

    fn drop_on_io_error<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(StoreError::Io(e)) = &result {
            warn!("Control connection lost: {}", e);
            if let Some(control) = self.control.take() {
                control.shutdown();
            }
        }
        result
    }

    /// Sends a data command, hands the open data stream to `transfer`, then
    /// waits for the completion reply.
    ///
    /// Only a failure on the control connection drops the session. A failed
    /// transfer is returned once the server has answered on the control
    /// connection.
    fn with_data_stream<T>(
        &mut self,
        command: Command,
        transfer: impl FnOnce(TcpStream) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let timeout = self.timeout;
        let control = self.control.as_mut().ok_or(StoreError::NotConnected)?;

        match data_exchange(control, timeout, &command, transfer) {
            Ok(value) => Ok(value),
            Err(DataFailure::Control(e)) => self.drop_on_io_error(Err(e)),
            Err(DataFailure::Transfer(e)) => Err(e),
        }
    }

    fn modified_time(&mut self, remote_path: &str) -> u64 {
        self.execute(&Command::MDTM(remote_path.to_string()), &[FILE_STATUS])
            .ok()
            .and_then(|reply| parse_mdtm(&reply.text))
            .unwrap_or(0)
    }
}

impl RemoteStore for FtpStore {
    fn connect(&mut self, config: &ConnectConfig) -> Result<(), ConnectError> {
        let port = config.port();
        debug!(
            "create control connection, [{}], [{}], [{}]...",
            config.username, config.host, port
        );

        for key in config.session_options.keys() {
            warn!("Ignoring unsupported session option {}", key);
        }

        let addr = resolve_addr(&config.host, port)?;
        let timeout = config.connect_timeout();
        let stream = match timeout {
            Some(t) => TcpStream::connect_timeout(&addr, t)?,
            None => TcpStream::connect(addr)?,
        };

        let mut control = ControlChannel::new(stream).map_err(store_to_connect)?;
        control.set_read_timeout(timeout).map_err(store_to_connect)?;

        let greeting = control.read_reply().map_err(store_to_connect)?;
        if greeting.code != READY {
            return Err(ConnectError::Handshake(greeting.to_string()));
        }

        let user = control
            .execute(
                &Command::USER(config.username.clone()),
                &[PASSWORD_REQUIRED, LOGIN_SUCCESS],
            )
            .map_err(|_| ConnectError::Authentication(config.username.clone()))?;
        if user.code == PASSWORD_REQUIRED {
            control
                .execute(
                    &Command::PASS(config.password.expose().to_string()),
                    &[LOGIN_SUCCESS],
                )
                .map_err(|_| ConnectError::Authentication(config.username.clone()))?;
        }

        control
            .execute(&Command::TYPE('I'), &[OK])
            .map_err(store_to_connect)?;

        // The connect timeout does not carry over to individual operations
        control.set_read_timeout(None).map_err(store_to_connect)?;

        info!(
            "FTP session established to {}:{} as {}",
            config.host, port, config.username
        );
        self.control = Some(control);
        self.timeout = timeout;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        let Some(mut control) = self.control.take() else {
            return Ok(());
        };

        let result = control.execute(&Command::QUIT, &[CLOSING]).map(|_| ());
        control.shutdown();
        debug!("control connection closed....");
        result
    }

    fn is_connected(&self) -> bool {
        self.control.is_some()
    }

    fn list(&mut self, remote_path: &str) -> Result<Vec<RawEntry>, StoreError> {
        let payload = self.with_data_stream(Command::LIST(remote_path.to_string()), |mut data| {
            let mut payload = String::new();
            data.read_to_string(&mut payload)?;
            Ok(payload)
        })?;
        Ok(parse_listing(&payload, Utc::now()))
    }

    fn stat(&mut self, remote_path: &str) -> Result<RawAttrs, StoreError> {
        let original = self.pwd()?;

        if self
            .execute(&Command::CWD(remote_path.to_string()), &[FILE_ACTION_OK])
            .is_ok()
        {
            self.execute(&Command::CWD(original), &[FILE_ACTION_OK])?;
            return Ok(RawAttrs {
                is_dir: true,
                size: 0,
                modified: self.modified_time(remote_path),
            });
        }

        let size = self
            .execute(&Command::SIZE(remote_path.to_string()), &[FILE_STATUS])?
            .text
            .trim()
            .parse::<u64>()
            .map_err(|_| StoreError::Protocol(format!("Malformed SIZE reply for {}", remote_path)))?;

        Ok(RawAttrs {
            is_dir: false,
            size,
            modified: self.modified_time(remote_path),
        })
    }

    fn get(&mut self, remote_path: &str, sink: &mut dyn Write) -> Result<u64, StoreError> {
        self.with_data_stream(Command::RETR(remote_path.to_string()), |mut data| {
            copy_stream(&mut data, &mut *sink, LocalEnd::Writer)
        })
    }

    fn put(&mut self, source: &mut dyn Read, remote_path: &str) -> Result<u64, StoreError> {
        // The data stream drops at the end of the closure, signalling EOF
        self.with_data_stream(Command::STOR(remote_path.to_string()), |mut data| {
            copy_stream(&mut *source, &mut data, LocalEnd::Reader)
        })
    }

    fn mkdir(&mut self, remote_path: &str) -> Result<(), StoreError> {
        self.execute(&Command::MKD(remote_path.to_string()), &[PATH_CREATED])
            .map(|_| ())
    }

    fn rmdir(&mut self, remote_path: &str) -> Result<(), StoreError> {
        self.execute(&Command::RMD(remote_path.to_string()), &[FILE_ACTION_OK])
            .map(|_| ())
    }

    fn rm(&mut self, remote_path: &str) -> Result<(), StoreError> {
        self.execute(&Command::DELE(remote_path.to_string()), &[FILE_ACTION_OK])
            .map(|_| ())
    }

    fn cd(&mut self, remote_path: &str) -> Result<(), StoreError> {
        self.execute(&Command::CWD(remote_path.to_string()), &[FILE_ACTION_OK])
            .map(|_| ())
    }

    fn pwd(&mut self) -> Result<String, StoreError> {
        let reply = self.execute(&Command::PWD, &[PATH_CREATED])?;
        parse_quoted_path(&reply.text)
            .ok_or_else(|| StoreError::Protocol(format!("Malformed PWD reply: {}", reply)))
    }
}

enum DataFailure {
    /// The control connection misbehaved; the session may be unusable
    Control(StoreError),
    /// The data stream or the caller's end failed; the session survives
    Transfer(StoreError),
}

fn data_exchange<T>(
    control: &mut ControlChannel,
    timeout: Option<Duration>,
    command: &Command,
    transfer: impl FnOnce(TcpStream) -> Result<T, StoreError>,
) -> Result<T, DataFailure> {
    let data = open_passive(control, timeout).map_err(DataFailure::Control)?;
    control.send(command).map_err(DataFailure::Control)?;
    let opened = control.read_reply().map_err(DataFailure::Control)?;
    expect(opened, DATA_OPENED, command.argument()).map_err(DataFailure::Control)?;

    let moved = transfer(data);

    let done = control.read_reply().map_err(DataFailure::Control)?;
    match moved {
        Ok(value) => {
            expect(done, DATA_DONE, command.argument()).map_err(DataFailure::Control)?;
            Ok(value)
        }
        Err(e) => {
            warn!("{} aborted: {} (server replied {})", command, e, done);
            Err(DataFailure::Transfer(e))
        }
    }
}

fn store_to_connect(error: StoreError) -> ConnectError {
    match error {
        StoreError::Io(e) => ConnectError::Transport(e),
        other => ConnectError::Protocol(other.to_string()),
    }
}
