//! Local storage
//!
//! The local filesystem side of transfers.

pub mod filesystem;
pub mod validation;
