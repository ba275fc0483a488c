//! Utility functions
//!
//! Provides logging setup and input validation.

pub mod logging;
pub mod validation;
