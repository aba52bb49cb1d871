//! AMD Radeon providers.
//!
//! Linux reads the `amdgpu` kernel driver's sysfs counters for every AMD
//! card. Windows reads the OS GPU performance counters through WMI.

use super::adapters::{enumerate_drm_adapters, read_sysfs_u64, AdapterVendor, DRM_CLASS_ROOT};
use super::perf_counters;
use crate::core::gpu::{busiest_of, display_name, GpuProvider, GpuVendor, ProviderCandidate};
use crate::core::params::{percent_of, GpuSample};
use crate::error::{Result, WatchError};
use std::path::{Path, PathBuf};

const BUSY_PERCENT: &str = "gpu_busy_percent";
const VRAM_USED: &str = "mem_info_vram_used";
const VRAM_TOTAL: &str = "mem_info_vram_total";
const COUNTERS: [&str; 3] = [BUSY_PERCENT, VRAM_USED, VRAM_TOTAL];

/// Counters a sysfs `device` directory does not expose
pub fn missing_counters(device_path: &Path) -> Vec<&'static str> {
    COUNTERS
        .into_iter()
        .filter(|counter| !device_path.join(counter).is_file())
        .collect()
}

/// AMD GPU provider reading `gpu_busy_percent` and `mem_info_vram_*`.
///
/// Holds every card of the machine; the busiest one is published.
pub struct RadeonGpuProvider {
    name: String,
    devices: Vec<PathBuf>,
}

impl RadeonGpuProvider {
    pub fn new<S: Into<String>>(name: S, device_path: PathBuf) -> Self {
        Self::with_devices(name, vec![device_path])
    }

    pub fn with_devices<S: Into<String>>(name: S, devices: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            devices,
        }
    }

    pub fn devices(&self) -> &[PathBuf] {
        &self.devices
    }

    fn sample_device(&self, device_path: &Path) -> Result<GpuSample> {
        let missing = missing_counters(device_path);
        if !missing.is_empty() {
            return Err(WatchError::metrics_unsupported(format!(
                "{} does not expose {}",
                device_path.display(),
                missing.join(", ")
            )));
        }

        let read = |counter: &str| {
            read_sysfs_u64(&device_path.join(counter)).ok_or_else(|| {
                WatchError::metric_collection(format!(
                    "Failed to read {} for {}",
                    counter, self.name
                ))
            })
        };

        let busy = read(BUSY_PERCENT)?;
        let vram_used = read(VRAM_USED)?;
        let vram_total = read(VRAM_TOTAL)?;

        Ok(GpuSample::clamped(
            busy.min(u32::MAX as u64) as u32,
            percent_of(vram_used, vram_total),
        ))
    }
}

impl GpuProvider for RadeonGpuProvider {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Radeon
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        busiest_of(self.devices.iter().map(|device| self.sample_device(device)))
    }
}

/// AMD GPU provider reading the Windows GPU performance counters
pub struct RadeonCounterProvider {
    name: String,
    /// Largest AMD adapter's memory size in bytes, 0 when unknown
    vram_total: u64,
}

impl RadeonCounterProvider {
    pub fn new<S: Into<String>>(name: S, vram_total: u64) -> Self {
        Self {
            name: name.into(),
            vram_total,
        }
    }
}

impl GpuProvider for RadeonCounterProvider {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Radeon
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        let (engines, memory) = perf_counters::query_counters()?;
        perf_counters::sample_from_counters(&engines, &memory, self.vram_total)
    }
}

/// Memory size of the largest AMD adapter, from the display class registry keys
#[cfg(windows)]
fn amd_vram_total() -> Option<u64> {
    use super::adapters::vendor_from_name;
    use winreg::enums::HKEY_LOCAL_MACHINE;
    use winreg::RegKey;

    const DISPLAY_CLASS: &str =
        r"SYSTEM\CurrentControlSet\Control\Class\{4d36e968-e325-11ce-bfc1-08002be10318}";

    let class = RegKey::predef(HKEY_LOCAL_MACHINE)
        .open_subkey(DISPLAY_CLASS)
        .ok()?;

    class
        .enum_keys()
        .flatten()
        .filter_map(|sub| class.open_subkey(&sub).ok())
        .filter(|key| {
            key.get_value::<String, _>("DriverDesc")
                .map(|desc| vendor_from_name(&desc) == AdapterVendor::Amd)
                .unwrap_or(false)
        })
        .filter_map(|key| key.get_value::<u64, _>("HardwareInformation.qwMemorySize").ok())
        .max()
}

/// Second in the detection chain
#[derive(Debug, Default)]
pub struct RadeonCandidate {
    /// Overrides the platform default with a DRM directory
    drm_root: Option<PathBuf>,
}

impl RadeonCandidate {
    pub fn with_root<P: AsRef<Path>>(drm_root: P) -> Self {
        Self {
            drm_root: Some(drm_root.as_ref().to_path_buf()),
        }
    }

    fn probe_sysfs(&self, drm_root: &Path) -> Option<Box<dyn GpuProvider>> {
        let adapters = match enumerate_drm_adapters(drm_root) {
            Ok(adapters) => adapters,
            Err(e) => {
                log::info!("AMD probe failed: {}", e);
                return None;
            }
        };

        let cards: Vec<(String, PathBuf)> = adapters
            .into_iter()
            .filter(|a| a.vendor == AdapterVendor::Amd)
            .filter_map(|a| a.device_path.map(|path| (a.name, path)))
            .collect();

        if cards.is_empty() {
            log::info!("AMD probe failed: no amdgpu device under {}", drm_root.display());
            return None;
        }

        // Cards without counters (e.g. an APU next to a discrete card) only
        // count when nothing else reports
        let (supported, unsupported): (Vec<_>, Vec<_>) = cards
            .into_iter()
            .partition(|(_, path)| missing_counters(path).is_empty());
        let cards = if supported.is_empty() { unsupported } else { supported };

        let name = display_name(&cards[0].0, cards.len());
        let devices = cards.into_iter().map(|(_, path)| path).collect();
        Some(Box::new(RadeonGpuProvider::with_devices(name, devices)))
    }

    #[cfg(windows)]
    fn probe_counters(&self) -> Option<Box<dyn GpuProvider>> {
        use super::adapters::enumerate_adapters;

        let adapters = match enumerate_adapters() {
            Ok(adapters) => adapters,
            Err(e) => {
                log::info!("AMD probe failed: {}", e);
                return None;
            }
        };

        let amd: Vec<_> = adapters
            .into_iter()
            .filter(|a| a.vendor == AdapterVendor::Amd)
            .collect();
        if amd.is_empty() {
            log::info!("AMD probe failed: no AMD display adapter");
            return None;
        }

        let vram_total = amd_vram_total().unwrap_or(0);
        if vram_total == 0 {
            log::warn!("AMD adapter memory size is unknown, VRAM usage will not be reported");
        }

        let name = display_name(&amd[0].name, amd.len());
        Some(Box::new(RadeonCounterProvider::new(name, vram_total)))
    }
}

impl ProviderCandidate for RadeonCandidate {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Radeon
    }

    fn probe(&self) -> Option<Box<dyn GpuProvider>> {
        if let Some(root) = &self.drm_root {
            return self.probe_sysfs(root);
        }

        #[cfg(windows)]
        {
            self.probe_counters()
        }

        #[cfg(not(windows))]
        {
            self.probe_sysfs(Path::new(DRM_CLASS_ROOT))
        }
    }
}
