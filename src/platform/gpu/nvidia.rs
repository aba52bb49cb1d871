#[cfg(feature = "nvml")]
use nvml_wrapper::{error::NvmlError, Nvml};
#[cfg(feature = "nvml")]
use once_cell::sync::Lazy;

use super::adapters::{enumerate_adapters, AdapterVendor};
#[cfg(feature = "nvml")]
use crate::core::gpu::{busiest_of, display_name};
use crate::core::gpu::{GpuProvider, GpuVendor, ProviderCandidate};
use crate::core::params::GpuSample;
#[cfg(feature = "nvml")]
use crate::core::params::percent_of;
use crate::error::{Result, WatchError};

/// Shown to the user when the NVML library cannot be loaded.
pub const DRIVER_REMEDIATION: &str = "The NVIDIA Management Library (nvml.dll / libnvidia-ml.so) \
could not be loaded. Install or repair the NVIDIA display driver, then start OSC Watch again.";

/// Outcome of the one-time NVML initialisation
#[cfg(feature = "nvml")]
enum NvmlState {
    Ready(Nvml),
    LibraryMissing(String),
    Failed(String),
}

/// NVML must be initialized once only
#[cfg(feature = "nvml")]
static NVML: Lazy<NvmlState> = Lazy::new(|| match Nvml::init() {
    Ok(nvml) => NvmlState::Ready(nvml),
    Err(e) if is_driver_missing(&e) => NvmlState::LibraryMissing(e.to_string()),
    Err(e) => NvmlState::Failed(e.to_string()),
});

#[cfg(feature = "nvml")]
fn is_driver_missing(err: &NvmlError) -> bool {
    matches!(
        err,
        NvmlError::LibloadingError(_) | NvmlError::LibraryNotFound | NvmlError::DriverNotLoaded
    )
}

#[cfg(feature = "nvml")]
fn map_nvml_error(context: &str, err: NvmlError) -> WatchError {
    if is_driver_missing(&err) {
        WatchError::driver_missing(format!("{}: {}", context, err))
    } else if matches!(err, NvmlError::NotSupported) {
        WatchError::metrics_unsupported(format!("{}: {}", context, err))
    } else {
        WatchError::metric_collection(format!("{}: {}", context, err))
    }
}

/// NVIDIA GPU provider using NVML.
///
/// Every device NVML reports is sampled; the busiest one is published.
pub struct NvidiaGpuProvider {
    device_count: u32,
    name: String,
}

impl NvidiaGpuProvider {
    pub fn new() -> Result<Self> {
        #[cfg(feature = "nvml")]
        {
            let nvml = match &*NVML {
                NvmlState::Ready(nvml) => nvml,
                NvmlState::LibraryMissing(e) => return Err(WatchError::driver_missing(e.clone())),
                NvmlState::Failed(e) => {
                    return Err(WatchError::gpu_not_available(format!(
                        "Failed to init NVML: {}",
                        e
                    )))
                }
            };

            let device_count = nvml.device_count().map_err(|e| {
                WatchError::gpu_not_available(format!("Failed to count GPUs: {}", e))
            })?;
            if device_count == 0 {
                return Err(WatchError::gpu_not_available("NVML reports no GPUs"));
            }

            let first = nvml.device_by_index(0).map_err(|e| {
                WatchError::gpu_not_available(format!("GPU 0 not found: {}", e))
            })?;
            let name = first
                .name()
                .unwrap_or_else(|_| "Unknown NVIDIA GPU".to_string());

            Ok(Self {
                device_count,
                name: display_name(&name, device_count as usize),
            })
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(WatchError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }

    pub fn device_count(&self) -> u32 {
        self.device_count
    }
}

#[cfg(feature = "nvml")]
fn sample_device(nvml: &Nvml, index: u32) -> Result<GpuSample> {
    let device = nvml
        .device_by_index(index)
        .map_err(|e| map_nvml_error("Failed to get GPU device", e))?;

    let utilization = device
        .utilization_rates()
        .map_err(|e| map_nvml_error("Failed to get utilization", e))?;

    let memory = device
        .memory_info()
        .map_err(|e| map_nvml_error("Failed to get memory info", e))?;

    Ok(GpuSample::clamped(
        utilization.gpu,
        percent_of(memory.used, memory.total),
    ))
}

impl GpuProvider for NvidiaGpuProvider {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Nvidia
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        #[cfg(feature = "nvml")]
        {
            let nvml = match &*NVML {
                NvmlState::Ready(nvml) => nvml,
                NvmlState::LibraryMissing(e) => return Err(WatchError::driver_missing(e.clone())),
                NvmlState::Failed(e) => return Err(WatchError::metric_collection(e.clone())),
            };

            busiest_of((0..self.device_count).map(|index| sample_device(nvml, index)))
        }
        #[cfg(not(feature = "nvml"))]
        {
            Err(WatchError::gpu_not_available(
                "NVIDIA GPU support not enabled",
            ))
        }
    }
}

/// Stands in for an NVIDIA card whose management library is absent.
///
/// Every sample fails with [`WatchError::DriverMissing`], which ends the run.
pub struct NvidiaDriverMissing {
    name: String,
    reason: String,
}

impl NvidiaDriverMissing {
    pub fn new<S: Into<String>>(name: S, reason: S) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl GpuProvider for NvidiaDriverMissing {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Nvidia
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        Err(WatchError::driver_missing(self.reason.clone()))
    }
}

/// First in the detection chain
#[derive(Debug, Default)]
pub struct NvidiaCandidate;

impl ProviderCandidate for NvidiaCandidate {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Nvidia
    }

    fn probe(&self) -> Option<Box<dyn GpuProvider>> {
        match NvidiaGpuProvider::new() {
            Ok(provider) => Some(Box::new(provider)),
            Err(WatchError::DriverMissing(reason)) => {
                // Only fatal when there really is an NVIDIA card to report on
                let adapter = enumerate_adapters()
                    .ok()?
                    .into_iter()
                    .find(|a| a.vendor == AdapterVendor::Nvidia)?;

                log::error!(
                    "NVIDIA adapter '{}' found but NVML is missing: {}",
                    adapter.name,
                    reason
                );
                Some(Box::new(NvidiaDriverMissing::new(adapter.name, reason)))
            }
            Err(e) => {
                log::info!("NVIDIA probe failed: {}", e);
                None
            }
        }
    }
}
