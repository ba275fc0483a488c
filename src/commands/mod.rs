mod handlers;
mod parser;

pub use handlers::{EXIT_CONNECT_FAILED, EXIT_PARTIAL_FAILURE, execute, run};
pub use parser::{Cli, Command};
