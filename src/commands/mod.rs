// Command handlers module
pub mod gpu;
pub mod listen;
pub mod presets;
pub mod run;
pub mod settings;
pub mod version;

// Re-exports for cleaner imports
pub use gpu::execute as gpu;
pub use listen::execute as listen;
pub use run::execute as run;
pub use version::execute as version;
