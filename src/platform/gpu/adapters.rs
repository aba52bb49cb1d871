//! OS-level display adapter enumeration.
//!
//! Linux reads the DRM class directory in sysfs. Windows asks WMI for
//! `Win32_VideoController` through PowerShell.

use crate::error::{Result, WatchError};
use std::fs;
use std::path::{Path, PathBuf};

/// Default sysfs DRM class directory
pub const DRM_CLASS_ROOT: &str = "/sys/class/drm";

const PCI_VENDOR_NVIDIA: &str = "0x10de";
const PCI_VENDOR_AMD: &str = "0x1002";
const PCI_VENDOR_INTEL: &str = "0x8086";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterVendor {
    Nvidia,
    Amd,
    Intel,
    Other,
}

impl AdapterVendor {
    fn from_pci_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            PCI_VENDOR_NVIDIA => AdapterVendor::Nvidia,
            PCI_VENDOR_AMD => AdapterVendor::Amd,
            PCI_VENDOR_INTEL => AdapterVendor::Intel,
            _ => AdapterVendor::Other,
        }
    }

    fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("nvidia") {
            AdapterVendor::Nvidia
        } else if name.contains("amd") || name.contains("radeon") {
            AdapterVendor::Amd
        } else if name.contains("intel") {
            AdapterVendor::Intel
        } else {
            AdapterVendor::Other
        }
    }

    fn label(self) -> &'static str {
        match self {
            AdapterVendor::Nvidia => "NVIDIA",
            AdapterVendor::Amd => "AMD",
            AdapterVendor::Intel => "Intel",
            AdapterVendor::Other => "GPU",
        }
    }
}

/// A display adapter reported by the OS
#[derive(Debug, Clone)]
pub struct DisplayAdapter {
    pub name: String,
    pub vendor: AdapterVendor,
    /// sysfs `device` directory, Linux only
    pub device_path: Option<PathBuf>,
}

/// Enumerate adapters using the platform's native mechanism
pub fn enumerate_adapters() -> Result<Vec<DisplayAdapter>> {
    #[cfg(windows)]
    {
        enumerate_wmi_adapters()
    }

    #[cfg(not(windows))]
    {
        enumerate_drm_adapters(Path::new(DRM_CLASS_ROOT))
    }
}

/// List `cardN` entries under a DRM class directory
pub fn enumerate_drm_adapters(root: &Path) -> Result<Vec<DisplayAdapter>> {
    let entries = fs::read_dir(root).map_err(|e| {
        WatchError::gpu_not_available(format!("Cannot read {}: {}", root.display(), e))
    })?;

    let mut adapters = Vec::new();
    for entry in entries.flatten() {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        // card0, card1, ... but not connector entries like card0-DP-1
        if !file_name.starts_with("card") || file_name.contains('-') {
            continue;
        }

        let device_path = entry.path().join("device");
        let Some(vendor_id) = read_sysfs_str(&device_path.join("vendor")) else {
            continue;
        };

        let vendor = AdapterVendor::from_pci_id(&vendor_id);
        let name = read_sysfs_str(&device_path.join("label"))
            .unwrap_or_else(|| format!("{} ({})", vendor.label(), file_name));

        adapters.push(DisplayAdapter {
            name,
            vendor,
            device_path: Some(device_path),
        });
    }

    adapters.sort_by(|a, b| a.device_path.cmp(&b.device_path));
    Ok(adapters)
}

#[cfg(windows)]
fn enumerate_wmi_adapters() -> Result<Vec<DisplayAdapter>> {
    use serde::Deserialize;
    use std::process::Command;

    #[derive(Debug, Deserialize)]
    struct VideoControllerPs {
        #[serde(rename = "Name")]
        name: String,
    }

    let output = Command::new("powershell")
        .args([
            "-NoProfile",
            "-Command",
            "Get-CimInstance Win32_VideoController | Select Name | ConvertTo-Json",
        ])
        .output()
        .map_err(|e| WatchError::gpu_not_available(format!("PowerShell execution failed: {e}")))?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let raw: serde_json::Value = serde_json::from_str(&stdout).map_err(|e| {
        WatchError::gpu_not_available(format!("JSON parsing failed: {e}. Output: {stdout}"))
    })?;

    // A single controller comes back as an object, several as an array
    let controllers: Vec<VideoControllerPs> = match raw {
        serde_json::Value::Array(arr) => serde_json::from_value(serde_json::Value::Array(arr))?,
        value => vec![serde_json::from_value(value)?],
    };

    Ok(controllers
        .into_iter()
        .filter(|c| !c.name.contains("Basic Display"))
        .map(|c| DisplayAdapter {
            vendor: AdapterVendor::from_name(&c.name),
            name: c.name,
            device_path: None,
        })
        .collect())
}

pub(crate) fn read_sysfs_str(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

pub(crate) fn read_sysfs_u64(path: &Path) -> Option<u64> {
    read_sysfs_str(path).and_then(|s| s.parse().ok())
}

/// Vendor guess from a marketing name, used when no PCI id is at hand
pub fn vendor_from_name(name: &str) -> AdapterVendor {
    AdapterVendor::from_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fake_card(root: &Path, card: &str, vendor: &str) {
        let device = root.join(card).join("device");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("vendor"), format!("{}\n", vendor)).unwrap();
    }

    #[test]
    fn test_enumerate_drm_skips_connectors() {
        let tmp = TempDir::new().unwrap();
        fake_card(tmp.path(), "card0", PCI_VENDOR_INTEL);
        fs::create_dir_all(tmp.path().join("card0-DP-1")).unwrap();
        fake_card(tmp.path(), "card1", PCI_VENDOR_AMD);

        let adapters = enumerate_drm_adapters(tmp.path()).unwrap();
        assert_eq!(adapters.len(), 2);
        assert_eq!(adapters[0].vendor, AdapterVendor::Intel);
        assert_eq!(adapters[1].vendor, AdapterVendor::Amd);
    }

    #[test]
    fn test_enumerate_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let result = enumerate_drm_adapters(&tmp.path().join("nope"));
        assert!(matches!(result, Err(WatchError::GpuNotAvailable(_))));
    }

    #[test]
    fn test_vendor_from_name() {
        assert_eq!(
            vendor_from_name("NVIDIA GeForce RTX 4070"),
            AdapterVendor::Nvidia
        );
        assert_eq!(
            vendor_from_name("AMD Radeon RX 7800 XT"),
            AdapterVendor::Amd
        );
        assert_eq!(
            vendor_from_name("Intel(R) UHD Graphics 770"),
            AdapterVendor::Intel
        );
        assert_eq!(vendor_from_name("Virtual Display"), AdapterVendor::Other);
    }
}
