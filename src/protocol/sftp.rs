//! SFTP binding
//!
//! Implements `RemoteStore` over an SSH session and its SFTP sub-channel
//! (libssh2 through the `ssh2` crate). SFTP has no server-side working
//! directory, so the store keeps one and resolves relative paths against it.

use log::{debug, info, warn};
use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, MethodType, Session, Sftp};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use crate::config::ConnectConfig;
use crate::error::{ConnectError, StoreError};
use crate::navigate::path;
use crate::protocol::resolve_addr;
use crate::protocol::store::{LocalEnd, RawAttrs, RawEntry, RemoteStore, copy_stream};

const DEFAULT_DIR_MODE: i32 = 0o755;

// SSH_FX_* status codes carried by SFTP errors
const SSH_FX_NO_SUCH_FILE: i32 = 2;
const SSH_FX_PERMISSION_DENIED: i32 = 3;

impl From<ssh2::Error> for StoreError {
    fn from(error: ssh2::Error) -> Self {
        match error.code() {
            ErrorCode::SFTP(SSH_FX_NO_SUCH_FILE) => StoreError::NotFound(error.message().into()),
            ErrorCode::SFTP(SSH_FX_PERMISSION_DENIED) => {
                StoreError::PermissionDenied(error.message().into())
            }
            _ => StoreError::Rejected(error.to_string()),
        }
    }
}

/// SSH session plus SFTP channel
#[derive(Default)]
pub struct SftpStore {
    session: Option<Session>,
    sftp: Option<Sftp>,
    cwd: String,
}

impl SftpStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self) -> Result<&Sftp, StoreError> {
        self.sftp.as_ref().ok_or(StoreError::NotConnected)
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        PathBuf::from(path::resolve(&self.cwd, remote_path))
    }
}

impl RemoteStore for SftpStore {
    fn connect(&mut self, config: &ConnectConfig) -> Result<(), ConnectError> {
        let port = config.port();
        debug!(
            "create session, [{}], [{}], [{}]...",
            config.username, config.host, port
        );

        let addr = resolve_addr(&config.host, port)?;
        let timeout = config.connect_timeout();
        let tcp = match timeout {
            Some(t) => TcpStream::connect_timeout(&addr, t)?,
            None => TcpStream::connect(addr)?,
        };

        let mut session = Session::new().map_err(|e| ConnectError::Handshake(e.to_string()))?;
        if let Some(t) = timeout {
            session.set_timeout(u32::try_from(t.as_millis()).unwrap_or(u32::MAX));
        }
        apply_session_options(&session, config)?;

        session.set_tcp_stream(tcp);
        debug!("session connecting......");
        session
            .handshake()
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;

        if config
            .option("StrictHostKeyChecking")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"))
        {
            verify_host_key(&session, &config.host, port)?;
        }

        session
            .userauth_password(&config.username, config.password.expose())
            .map_err(|_| ConnectError::Authentication(config.username.clone()))?;
        if !session.authenticated() {
            return Err(ConnectError::Authentication(config.username.clone()));
        }

        debug!("session open channel, type is :[{}]...", config.channel_type);
        let sftp = session
            .sftp()
            .map_err(|e| ConnectError::Channel(e.to_string()))?;

        let cwd = sftp
            .realpath(Path::new("."))
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "/".to_string());

        // The connect timeout does not carry over to individual operations
        session.set_timeout(0);

        info!(
            "SFTP session established to {}:{} as {} (cwd {})",
            config.host, port, config.username, cwd
        );
        self.session = Some(session);
        self.sftp = Some(sftp);
        self.cwd = cwd;
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), StoreError> {
        if let Some(sftp) = self.sftp.take() {
            drop(sftp);
            debug!("sftp channel closed....");
        }
        self.cwd.clear();
        if let Some(session) = self.session.take() {
            session.disconnect(None, "closing session", None)?;
            debug!("session disconnect....");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.sftp.is_some()
    }

    fn list(&mut self, remote_path: &str) -> Result<Vec<RawEntry>, StoreError> {
        let dir = self.resolve(remote_path);
        let entries = self.channel()?.readdir(&dir)?;

        Ok(entries
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().into_owned();
                Some(RawEntry::new(name, attrs_from(&stat)))
            })
            .collect())
    }

    fn stat(&mut self, remote_path: &str) -> Result<RawAttrs, StoreError> {
        let target = self.resolve(remote_path);
        let stat = self.channel()?.stat(&target)?;
        Ok(attrs_from(&stat))
    }

    fn get(&mut self, remote_path: &str, sink: &mut dyn Write) -> Result<u64, StoreError> {
        let target = self.resolve(remote_path);
        let mut file = self.channel()?.open(&target)?;
        copy_stream(&mut file, sink, LocalEnd::Writer)
    }

    fn put(&mut self, source: &mut dyn Read, remote_path: &str) -> Result<u64, StoreError> {
        let target = self.resolve(remote_path);
        let mut file = self.channel()?.create(&target)?;
        copy_stream(source, &mut file, LocalEnd::Reader)
    }

    fn mkdir(&mut self, remote_path: &str) -> Result<(), StoreError> {
        let target = self.resolve(remote_path);
        self.channel()?.mkdir(&target, DEFAULT_DIR_MODE)?;
        Ok(())
    }

    fn rmdir(&mut self, remote_path: &str) -> Result<(), StoreError> {
        let target = self.resolve(remote_path);
        self.channel()?.rmdir(&target)?;
        Ok(())
    }

    fn rm(&mut self, remote_path: &str) -> Result<(), StoreError> {
        let target = self.resolve(remote_path);
        self.channel()?.unlink(&target)?;
        Ok(())
    }

    fn cd(&mut self, remote_path: &str) -> Result<(), StoreError> {
        let target = path::resolve(&self.cwd, remote_path);
        let stat = self.channel()?.stat(Path::new(&target))?;
        if !stat.is_dir() {
            return Err(StoreError::Rejected(format!("Not a directory: {}", target)));
        }
        self.cwd = target;
        Ok(())
    }

    fn pwd(&mut self) -> Result<String, StoreError> {
        self.channel()?;
        Ok(self.cwd.clone())
    }
}

fn attrs_from(stat: &ssh2::FileStat) -> RawAttrs {
    RawAttrs {
        is_dir: stat.is_dir(),
        size: stat.size.unwrap_or(0),
        modified: stat.mtime.unwrap_or(0),
    }
}

/// Applies algorithm preferences; must run before the handshake.
fn apply_session_options(session: &Session, config: &ConnectConfig) -> Result<(), ConnectError> {
    for (key, value) in &config.session_options {
        let methods: &[MethodType] = match key.to_ascii_lowercase().as_str() {
            "compression" => {
                session.set_compress(value.eq_ignore_ascii_case("yes"));
                continue;
            }
            "stricthostkeychecking" => continue,
            "kex" => &[MethodType::Kex],
            "hostkey" | "server_host_key" => &[MethodType::HostKey],
            "cipher" => &[MethodType::CryptCs, MethodType::CryptSc],
            "cipher.c2s" => &[MethodType::CryptCs],
            "cipher.s2c" => &[MethodType::CryptSc],
            "mac" => &[MethodType::MacCs, MethodType::MacSc],
            "mac.c2s" => &[MethodType::MacCs],
            "mac.s2c" => &[MethodType::MacSc],
            other => {
                warn!("Ignoring unsupported session option {}", other);
                continue;
            }
        };

        debug!("session setConfig: {} = {}", key, value);
        for method in methods {
            session
                .method_pref(*method, value)
                .map_err(|e| ConnectError::InvalidConfig(format!("{}: {}", key, e)))?;
        }
    }
    Ok(())
}

fn verify_host_key(session: &Session, host: &str, port: u16) -> Result<(), ConnectError> {
    let known_hosts_path = dirs::home_dir()
        .map(|home| home.join(".ssh").join("known_hosts"))
        .ok_or_else(|| ConnectError::HostKey("cannot locate home directory".into()))?;

    let mut known_hosts = session
        .known_hosts()
        .map_err(|e| ConnectError::HostKey(e.to_string()))?;
    known_hosts
        .read_file(&known_hosts_path, KnownHostFileKind::OpenSSH)
        .map_err(|e| ConnectError::HostKey(format!("{}: {}", known_hosts_path.display(), e)))?;

    let (key, _) = session
        .host_key()
        .ok_or_else(|| ConnectError::HostKey("server sent no host key".into()))?;

    match known_hosts.check_port(host, port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err(ConnectError::HostKey(format!(
            "{} is not in {}",
            host,
            known_hosts_path.display()
        ))),
        CheckResult::Mismatch => Err(ConnectError::HostKey(format!(
            "host key for {} does not match {}",
            host,
            known_hosts_path.display()
        ))),
        CheckResult::Failure => Err(ConnectError::HostKey(format!(
            "could not check host key for {}",
            host
        ))),
    }
}
