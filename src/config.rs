//! Connection configuration
//!
//! Loads the settings needed to open a session from `rax-transfer.toml`
//! (or an explicit file) with `RAX_TRANSFER_` environment overrides.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::protocol::Protocol;
use crate::utils::validation::is_valid_input;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_NAME: &str = "rax-transfer";

/// Sub-channel type opened on SSH sessions
pub const DEFAULT_CHANNEL_TYPE: &str = "sftp";

/// A credential that never renders in diagnostic output
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(******)")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Everything needed to open one session
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectConfig {
    #[serde(default)]
    pub protocol: Protocol,

    pub host: String,

    pub username: String,

    #[serde(default)]
    pub password: Secret,

    /// Defaults to the protocol's well-known port
    #[serde(default)]
    pub port: Option<u16>,

    /// Sub-channel opened on the SSH session
    #[serde(default = "default_channel_type")]
    pub channel_type: String,

    /// Low-level session options, keys are matched case-insensitively
    #[serde(default)]
    pub session_options: HashMap<String, String>,

    /// 0 disables the explicit timeout
    #[serde(default)]
    pub connect_timeout_ms: u64,
}

fn default_channel_type() -> String {
    DEFAULT_CHANNEL_TYPE.to_string()
}

impl ConnectConfig {
    pub fn new(
        protocol: Protocol,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            protocol,
            host: host.into(),
            username: username.into(),
            password: Secret::new(password),
            port: None,
            channel_type: default_channel_type(),
            session_options: HashMap::new(),
            connect_timeout_ms: 0,
        }
    }

    pub fn sftp(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(Protocol::Sftp, host, username, password)
    }

    pub fn ftp(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(Protocol::Ftp, host, username, password)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.session_options.insert(key.into(), value.into());
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Load configuration from a file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(p) => File::from(p),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("RAX_TRANSFER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ConnectConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if !is_valid_input(&self.host) {
            return Err(config::ConfigError::Message(
                "host must be a non-empty single line".into(),
            ));
        }

        if !is_valid_input(&self.username) {
            return Err(config::ConfigError::Message(
                "username must be a non-empty single line".into(),
            ));
        }

        if self.port == Some(0) {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.protocol == Protocol::Sftp && self.channel_type != DEFAULT_CHANNEL_TYPE {
            return Err(config::ConfigError::Message(format!(
                "unsupported channel type '{}' for sftp",
                self.channel_type
            )));
        }

        Ok(())
    }

    /// Port to dial, falling back to the protocol default
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// Connect timeout as Duration, `None` when disabled
    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    /// Session option lookup ignoring key case
    pub fn option(&self, key: &str) -> Option<&str> {
        self.session_options
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_follow_protocol() {
        let sftp = ConnectConfig::sftp("h", "u", "p");
        assert_eq!(sftp.port(), 22);
        assert_eq!(sftp.channel_type, "sftp");
        assert!(sftp.connect_timeout().is_none());

        let ftp = ConnectConfig::ftp("h", "u", "p").with_port(2121);
        assert_eq!(ftp.port(), 2121);
    }

    #[test]
    fn test_debug_output_hides_password() {
        let config = ConnectConfig::sftp("h", "u", "hunter2");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("******"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ConnectConfig::sftp("", "u", "p").validate().is_err());
        assert!(ConnectConfig::ftp("h", "u\r\nDELE x", "p").validate().is_err());
        assert!(ConnectConfig::sftp("h", "u", "p").with_port(0).validate().is_err());

        let mut shell = ConnectConfig::sftp("h", "u", "p");
        shell.channel_type = "shell".into();
        assert!(shell.validate().is_err());

        let mut ftp = ConnectConfig::ftp("h", "u", "p");
        ftp.channel_type = "anything".into();
        assert!(ftp.validate().is_ok());
    }

    #[test]
    fn test_option_lookup_ignores_case() {
        let config = ConnectConfig::sftp("h", "u", "p").with_option("StrictHostKeyChecking", "no");
        assert_eq!(config.option("stricthostkeychecking"), Some("no"));
        assert_eq!(config.option("compression"), None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "protocol = \"ftp\"\nhost = \"files.example.org\"\nusername = \"u\"\npassword = \"p\"\nconnect_timeout_ms = 1500\n\n[session_options]\ncompression = \"yes\""
        )
        .unwrap();

        let config = ConnectConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.protocol, Protocol::Ftp);
        assert_eq!(config.port(), 21);
        assert_eq!(config.password.expose(), "p");
        assert_eq!(config.connect_timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.option("compression"), Some("yes"));
    }
}
