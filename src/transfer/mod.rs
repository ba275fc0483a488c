//! Transfer module
//!
//! Moves file bytes between the local filesystem and a remote store, one file
//! at a time or across whole subtrees.

pub mod cancel;
pub mod file_ops;
pub mod results;
pub mod tree;

// Re-export key types and functions
pub use cancel::CancelToken;
pub use file_ops::{get_file, make_directory, put_file, remove_directory, remove_file, upload_local_file};
pub use results::TransferOutcome;
pub use tree::{delete_tree, download_tree, upload_tree};
