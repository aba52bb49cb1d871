use osc_watch::core::gpu::{detect_with, UnknownProvider};
use osc_watch::core::{GpuProvider, GpuSample, GpuVendor, ProviderCandidate};
use osc_watch::platform::gpu::{IntegratedCandidate, RadeonCandidate};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Failing(GpuVendor);

impl ProviderCandidate for Failing {
    fn vendor(&self) -> GpuVendor {
        self.0
    }

    fn probe(&self) -> Option<Box<dyn GpuProvider>> {
        None
    }
}

fn card(root: &Path, name: &str, vendor: &str) {
    let device = root.join(name).join("device");
    fs::create_dir_all(&device).unwrap();
    fs::write(device.join("vendor"), format!("{}\n", vendor)).unwrap();
}

#[test]
fn test_falls_back_to_integrated() {
    let tmp = TempDir::new().unwrap();
    card(tmp.path(), "card0", "0x8086");

    let candidates: Vec<Box<dyn ProviderCandidate>> = vec![
        Box::new(Failing(GpuVendor::Nvidia)),
        Box::new(RadeonCandidate::with_root(tmp.path())),
        Box::new(IntegratedCandidate::with_drm_root(tmp.path())),
    ];

    let mut provider = detect_with(&candidates);
    assert_eq!(provider.vendor(), GpuVendor::Integrated);
    assert_eq!(provider.sample().unwrap(), GpuSample::zero());
}

#[test]
fn test_radeon_wins_over_integrated() {
    let tmp = TempDir::new().unwrap();
    card(tmp.path(), "card0", "0x8086");
    card(tmp.path(), "card1", "0x1002");
    let device = tmp.path().join("card1").join("device");
    fs::write(device.join("gpu_busy_percent"), "100\n").unwrap();
    fs::write(device.join("mem_info_vram_used"), "512\n").unwrap();
    fs::write(device.join("mem_info_vram_total"), "1024\n").unwrap();

    let candidates: Vec<Box<dyn ProviderCandidate>> = vec![
        Box::new(Failing(GpuVendor::Nvidia)),
        Box::new(RadeonCandidate::with_root(tmp.path())),
        Box::new(IntegratedCandidate::with_drm_root(tmp.path())),
    ];

    let mut provider = detect_with(&candidates);
    assert_eq!(provider.vendor(), GpuVendor::Radeon);
    assert_eq!(provider.sample().unwrap(), GpuSample::clamped(99, 50));
}

#[test]
fn test_nothing_detected_yields_unknown_zero() {
    let tmp = TempDir::new().unwrap();
    let candidates: Vec<Box<dyn ProviderCandidate>> = vec![
        Box::new(Failing(GpuVendor::Nvidia)),
        Box::new(IntegratedCandidate::with_drm_root(tmp.path())),
    ];

    let mut provider = detect_with(&candidates);
    assert_eq!(provider.vendor(), GpuVendor::Unknown);
    assert_eq!(provider.sample().unwrap(), GpuSample::zero());
    assert_eq!(provider.sample().unwrap(), GpuSample::zero());

    let mut unknown = UnknownProvider::default();
    assert_eq!(unknown.sample().unwrap(), GpuSample::zero());
}
