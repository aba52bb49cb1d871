use super::params::GpuSample;
use crate::error::{Result, WatchError};
use std::fmt;

/// GPU vendor, resolved once at startup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GpuVendor {
    Nvidia,
    Radeon,
    Integrated,
    #[default]
    Unknown,
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GpuVendor::Nvidia => "NVIDIA",
            GpuVendor::Radeon => "RADEON",
            GpuVendor::Integrated => "INTEGRATED",
            GpuVendor::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Trait for GPU metrics providers
///
/// One implementation per vendor stack. Implementations live in the
/// platform layer.
pub trait GpuProvider: Send {
    /// Vendor this provider services
    fn vendor(&self) -> GpuVendor;

    /// Adapter name for display
    fn name(&self) -> String;

    /// Read current usage and memory percentages, clamped to `0..=99`
    fn sample(&mut self) -> Result<GpuSample>;
}

/// One entry in the ranked detection chain.
pub trait ProviderCandidate {
    fn vendor(&self) -> GpuVendor;

    /// Return a working provider, or `None` when this vendor's stack is absent.
    fn probe(&self) -> Option<Box<dyn GpuProvider>>;
}

/// Walk the candidates in order and keep the first that probes successfully.
pub fn detect_with(candidates: &[Box<dyn ProviderCandidate>]) -> Box<dyn GpuProvider> {
    for candidate in candidates {
        match candidate.probe() {
            Some(provider) => {
                log::info!("GPU vendor: {} ({})", provider.vendor(), provider.name());
                return provider;
            }
            None => log::debug!("GPU probe for {} found nothing", candidate.vendor()),
        }
    }

    log::warn!("No GPU vendor could be resolved, reporting 0% usage");
    Box::new(UnknownProvider::default())
}

/// `"RX 7900 XT"`, or `"RX 7900 XT (+1 more)"` when several devices are sampled
pub fn display_name(first: &str, devices: usize) -> String {
    if devices > 1 {
        format!("{} (+{} more)", first, devices - 1)
    } else {
        first.to_string()
    }
}

/// Fold per-device readings into one sample for a multi-GPU machine.
///
/// The busiest usage and the fullest memory win, each on its own. Devices
/// that fail are skipped; a fatal error ends the fold at once. With no
/// successful reading the last error is returned.
pub fn busiest_of<I>(readings: I) -> Result<GpuSample>
where
    I: IntoIterator<Item = Result<GpuSample>>,
{
    let mut samples = Vec::new();
    let mut last_error = None;

    for reading in readings {
        match reading {
            Ok(sample) => samples.push(sample),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                log::debug!("Skipping GPU device: {}", e);
                last_error = Some(e);
            }
        }
    }

    match GpuSample::max_of(samples) {
        Some(sample) => Ok(sample),
        None => Err(last_error
            .unwrap_or_else(|| WatchError::metrics_unsupported("No GPU devices to sample"))),
    }
}

/// Fallback when no vendor could be resolved. Always reports `(0, 0)`.
#[derive(Debug, Default)]
pub struct UnknownProvider {
    warned: bool,
}

impl GpuProvider for UnknownProvider {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Unknown
    }

    fn name(&self) -> String {
        "Unknown GPU".to_string()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        if !self.warned {
            log::warn!("GPU vendor {} is unresolved, sending 0% usage", self.vendor());
            self.warned = true;
        }
        Ok(GpuSample::zero())
    }
}
