//! Parameter synchronization core.
//!
//! Digit model, change/resync tracking, the transmission loop and the
//! foreground controller, plus the persisted settings they read.

pub mod controller;
pub mod gpu;
pub mod params;
pub mod scheduler;
pub mod settings;
pub mod tracker;

pub use controller::{StatusSummary, WatchController};
pub use gpu::{GpuProvider, GpuVendor, ProviderCandidate};
pub use params::{AvatarParameter, DigitFrame, GpuSample};
pub use scheduler::{RunEvent, RunHandle, SchedulerConfig, TickEngine, TickSources};
pub use settings::{ChatPresets, Settings};
pub use tracker::ResyncTracker;
