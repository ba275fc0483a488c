//! Remote store contract
//!
//! The capability set every protocol binding implements. Paths are remote
//! path strings; relative paths resolve against the store's working directory.

use std::io::{ErrorKind, Read, Write};

use crate::config::ConnectConfig;
use crate::error::{ConnectError, StoreError};

const BUFFER_SIZE: usize = 8192;

/// Which end of a copy belongs to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalEnd {
    Reader,
    Writer,
}

/// Attributes reported by a stat or carried on a raw listing record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawAttrs {
    pub is_dir: bool,
    pub size: u64,
    /// Last modification, epoch seconds
    pub modified: u64,
}

/// One record of a raw directory listing, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub name: String,
    pub attrs: RawAttrs,
}

impl RawEntry {
    pub fn new(name: impl Into<String>, attrs: RawAttrs) -> Self {
        Self {
            name: name.into(),
            attrs,
        }
    }
}

/// A connection to a remote file store.
///
/// Implementations own their transport and sub-channel privately. Calls are
/// blocking and must not be issued concurrently on one store.
pub trait RemoteStore {
    /// Establishes the session and sub-channel. On error no partial session is kept.
    fn connect(&mut self, config: &ConnectConfig) -> Result<(), ConnectError>;

    /// Releases the sub-channel, then the session. Afterwards the store is
    /// disconnected even if closing reported an error.
    fn disconnect(&mut self) -> Result<(), StoreError>;

    /// Last known liveness of the sub-channel.
    fn is_connected(&self) -> bool;

    /// Raw listing of `path`, may include `.` and `..`.
    fn list(&mut self, path: &str) -> Result<Vec<RawEntry>, StoreError>;

    fn stat(&mut self, path: &str) -> Result<RawAttrs, StoreError>;

    /// Streams the remote file into `sink`, returning the byte count.
    fn get(&mut self, path: &str, sink: &mut dyn Write) -> Result<u64, StoreError>;

    /// Streams `source` into the remote file, returning the byte count.
    fn put(&mut self, source: &mut dyn Read, path: &str) -> Result<u64, StoreError>;

    fn mkdir(&mut self, path: &str) -> Result<(), StoreError>;

    fn rmdir(&mut self, path: &str) -> Result<(), StoreError>;

    fn rm(&mut self, path: &str) -> Result<(), StoreError>;

    fn cd(&mut self, path: &str) -> Result<(), StoreError>;

    fn pwd(&mut self) -> Result<String, StoreError>;
}

/// Copies `reader` into `writer` until EOF and flushes the writer.
///
/// Failures on the caller's end are reported as `StoreError::Local`, failures
/// on the remote end as `StoreError::Io`.
pub fn copy_stream(
    reader: &mut dyn Read,
    writer: &mut dyn Write,
    local: LocalEnd,
) -> Result<u64, StoreError> {
    let wrap_read = |e| match local {
        LocalEnd::Reader => StoreError::Local(e),
        LocalEnd::Writer => StoreError::Io(e),
    };
    let wrap_write = |e| match local {
        LocalEnd::Reader => StoreError::Io(e),
        LocalEnd::Writer => StoreError::Local(e),
    };

    let mut buffer = [0; BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(wrap_read(e)),
        };
        writer.write_all(&buffer[..n]).map_err(wrap_write)?;
        total += n as u64;
    }
    writer.flush().map_err(wrap_write)?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_copy_stream_blames_the_failing_end() {
        let mut sink = Vec::new();
        let copied = copy_stream(&mut Cursor::new(vec![7u8; 20_000]), &mut sink, LocalEnd::Writer);
        assert_eq!(copied.unwrap(), 20_000);
        assert_eq!(sink.len(), 20_000);

        let err = copy_stream(&mut Cursor::new(b"abc".to_vec()), &mut FullDisk, LocalEnd::Writer);
        assert!(matches!(err, Err(StoreError::Local(_))));

        let err = copy_stream(&mut Cursor::new(b"abc".to_vec()), &mut FullDisk, LocalEnd::Reader);
        assert!(matches!(err, Err(StoreError::Io(_))));
    }
}
