//! Listing result types

use serde::Serialize;
use std::fmt;

/// Kind of a remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

impl EntryType {
    pub fn is_directory(self) -> bool {
        self == EntryType::Directory
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::File => f.write_str("file"),
            EntryType::Directory => f.write_str("directory"),
        }
    }
}

/// Normalized listing record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    name: String,
    entry_type: EntryType,
    size: u64,
    /// Last modification, epoch seconds
    modified: u64,
}

impl RemoteEntry {
    pub fn new(name: impl Into<String>, entry_type: EntryType, size: u64, modified: u64) -> Self {
        Self {
            name: name.into(),
            entry_type,
            size,
            modified,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type.is_directory()
    }

    /// Size in bytes; only meaningful for files.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn modified(&self) -> u64 {
        self.modified
    }
}
