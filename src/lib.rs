// OSC Watch Library - Public API

// Re-export error types
pub mod error;
pub use error::{Result, WatchError};

// Module declarations
pub mod commands;
pub mod core;
pub mod logging;
pub mod osc;
pub mod platform;
pub mod ui;

// Re-export commonly used types
pub use core::scheduler::SchedulerConfig;
pub use core::WatchController;

/// Initialize logging to stderr and the daily log file
pub fn init_logging() {
    logging::init(logging::default_log_dir().as_deref());
}
