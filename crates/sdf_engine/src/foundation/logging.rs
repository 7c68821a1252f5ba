//! Logging setup for binaries and tests

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system from the `RUST_LOG` environment variable
pub fn init() {
    env_logger::init();
}

/// Initialize logging without panicking if a logger is already installed
///
/// Useful in tests where several cases may race to set the global logger.
pub fn try_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
