//! FTP commands
//!
//! Commands the client sends on the control connection, and their wire form.

use std::fmt;

/// Represents an FTP command sent to the server.
///
/// Commands that take an argument store it as a `String`.
#[derive(Debug, PartialEq)]
pub enum Command {
    USER(String),
    PASS(String),
    TYPE(char),   // Representation type, 'I' for binary
    PWD,          // Print working directory
    CWD(String),  // Change working directory
    MKD(String),  // Make directory
    RMD(String),  // Remove directory
    DELE(String), // Delete file
    PASV,         // Enter passive mode
    LIST(String), // Directory listing over the data channel
    RETR(String), // Retrieve/download file
    STOR(String), // Store/upload file
    SIZE(String), // File size (RFC 3659)
    MDTM(String), // File modification time (RFC 3659)
    QUIT,
}

impl Command {
    fn verb(&self) -> &'static str {
        match self {
            Command::USER(_) => "USER",
            Command::PASS(_) => "PASS",
            Command::TYPE(_) => "TYPE",
            Command::PWD => "PWD",
            Command::CWD(_) => "CWD",
            Command::MKD(_) => "MKD",
            Command::RMD(_) => "RMD",
            Command::DELE(_) => "DELE",
            Command::PASV => "PASV",
            Command::LIST(_) => "LIST",
            Command::RETR(_) => "RETR",
            Command::STOR(_) => "STOR",
            Command::SIZE(_) => "SIZE",
            Command::MDTM(_) => "MDTM",
            Command::QUIT => "QUIT",
        }
    }

    /// Argument as sent, if the command takes one
    pub fn argument(&self) -> Option<&str> {
        match self {
            Command::USER(a)
            | Command::PASS(a)
            | Command::CWD(a)
            | Command::MKD(a)
            | Command::RMD(a)
            | Command::DELE(a)
            | Command::RETR(a)
            | Command::STOR(a)
            | Command::SIZE(a)
            | Command::MDTM(a) => Some(a),
            Command::LIST(a) if !a.is_empty() => Some(a),
            _ => None,
        }
    }

    /// Line written to the control connection, CRLF terminated
    pub fn to_wire(&self) -> String {
        match self {
            Command::TYPE(t) => format!("TYPE {}\r\n", t),
            _ => match self.argument() {
                Some(arg) => format!("{} {}\r\n", self.verb(), arg),
                None => format!("{}\r\n", self.verb()),
            },
        }
    }
}

/// Log-safe rendering; the password argument is masked.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::PASS(_) => write!(f, "PASS ******"),
            Command::TYPE(t) => write!(f, "TYPE {}", t),
            _ => match self.argument() {
                Some(arg) => write!(f, "{} {}", self.verb(), arg),
                None => f.write_str(self.verb()),
            },
        }
    }
}
