// UI and formatting module

pub mod prompts;
pub mod status;

// Re-export commonly used items for cleaner imports
pub use prompts::{bold, confirm, dimmed, error, error_banner, info, success, warn};
pub use status::{format_preset_list, format_sample, format_status};
