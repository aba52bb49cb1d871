//! GPU-specific platform code.
//!
//! Provides GPU metrics collection for different vendors:
//! NVIDIA via NVML, AMD via the amdgpu sysfs counters on Linux and the GPU
//! performance counters on Windows, and a plain adapter listing for
//! integrated graphics.

pub mod adapters;
mod integrated;
mod nvidia;
pub mod perf_counters;
mod radeon;

pub use integrated::{IntegratedCandidate, IntegratedGpuProvider};
pub use nvidia::{NvidiaCandidate, NvidiaDriverMissing, NvidiaGpuProvider, DRIVER_REMEDIATION};
pub use radeon::{RadeonCandidate, RadeonCounterProvider, RadeonGpuProvider};

use crate::core::gpu::{detect_with, GpuProvider, ProviderCandidate};

/// Detection chain in priority order:
/// 1. NVIDIA (via NVML)
/// 2. AMD (amdgpu sysfs, or WMI performance counters on Windows)
/// 3. Any adapter the OS enumerates (integrated)
pub fn default_candidates() -> Vec<Box<dyn ProviderCandidate>> {
    vec![
        Box::new(NvidiaCandidate),
        Box::new(RadeonCandidate::default()),
        Box::new(IntegratedCandidate::default()),
    ]
}

/// Resolve the GPU provider for this process. Call once at startup.
pub fn detect_gpu_provider() -> Box<dyn GpuProvider> {
    detect_with(&default_candidates())
}
