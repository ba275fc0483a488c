//! Directory listing
//!
//! Normalizes raw listings into `RemoteEntry` records.

pub mod operations;
pub mod results;

pub use operations::{list_directory, list_directory_map};
pub use results::{EntryType, RemoteEntry};
