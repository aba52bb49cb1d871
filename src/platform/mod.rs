// Platform-specific code module

pub mod gpu;

pub use gpu::detect_gpu_provider;
