//! Navigate module
//!
//! Remote path handling, working-directory changes and directory
//! classification.

mod operations;
pub mod path;

// Re-export public types and functions
pub use operations::{change_directory, is_directory, working_directory};
