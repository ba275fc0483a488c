//! Logging utilities
//!
//! Process-wide logger setup. The logger is installed once; later calls are no-ops.

use std::sync::Once;

static INIT: Once = Once::new();

/// Setup logging for the process (env_logger picks up RUST_LOG, default `info`)
pub fn init() {
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // A test harness may already have installed a logger
        let _ = env_logger::Builder::from_env(env).try_init();
    });
}
