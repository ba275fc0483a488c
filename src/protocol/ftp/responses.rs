//! FTP Response handling
//!
//! Reply codes and the reader for single- and multi-line replies.

use std::fmt;
use std::io::BufRead;

use crate::error::StoreError;

/// Standard FTP reply codes
pub const DATA_ALREADY_OPEN: u16 = 125;
pub const OPENING_DATA: u16 = 150;
pub const OK: u16 = 200;
pub const FILE_STATUS: u16 = 213;
pub const READY: u16 = 220;
pub const CLOSING: u16 = 221;
pub const TRANSFER_COMPLETE: u16 = 226;
pub const ENTERING_PASSIVE: u16 = 227;
pub const LOGIN_SUCCESS: u16 = 230;
pub const FILE_ACTION_OK: u16 = 250;
pub const PATH_CREATED: u16 = 257;
pub const PASSWORD_REQUIRED: u16 = 331;
pub const NOT_LOGGED_IN: u16 = 530;
pub const FILE_UNAVAILABLE: u16 = 550;

/// A complete server reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub text: String,
}

impl Reply {
    /// 1xx
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

/// Splits `"123 text"` / `"123-text"` into code, separator and text.
fn split_reply_line(line: &str) -> Option<(u16, char, &str)> {
    let code = line.get(..3)?.parse::<u16>().ok()?;
    let separator = line[3..].chars().next().unwrap_or(' ');
    let text = line.get(4..).unwrap_or("");
    Some((code, separator, text))
}

/// Reads one reply, following `123-` continuation lines until `123 `.
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply, StoreError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(StoreError::Protocol("Connection closed by server".into()));
    }

    let first = line.trim_end_matches(['\r', '\n']).to_string();
    let (code, separator, text) = split_reply_line(&first)
        .ok_or_else(|| StoreError::Protocol(format!("Malformed reply: {}", first)))?;
    let mut full_text = text.to_string();

    if separator == '-' {
        let terminator = format!("{} ", code);
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(StoreError::Protocol("Connection closed mid-reply".into()));
            }
            let next = line.trim_end_matches(['\r', '\n']);
            if let Some(rest) = next.strip_prefix(&terminator) {
                full_text.push('\n');
                full_text.push_str(rest);
                break;
            }
            full_text.push('\n');
            full_text.push_str(next);
        }
    }

    Ok(Reply {
        code,
        text: full_text,
    })
}

/// Converts a negative reply into the matching store error
pub fn reply_to_error(reply: &Reply, target: Option<&str>) -> StoreError {
    match (reply.code, target) {
        (FILE_UNAVAILABLE, Some(path)) => StoreError::NotFound(format!("{} ({})", path, reply)),
        (NOT_LOGGED_IN, _) => StoreError::PermissionDenied(reply.to_string()),
        _ => StoreError::Rejected(reply.to_string()),
    }
}
