//! Error handling
//!
//! Defines error types and handling for the transfer engine.

pub mod handlers;
pub mod types;

pub use types::*;
