//! Session management
//!
//! Owns the lifecycle of the one remote session a transfer instance uses.

pub mod manager;
pub mod results;
pub mod state;

pub use manager::ConnectionManager;
pub use results::ConnectOutcome;
pub use state::ConnectionState;
