//! One-shot GPU detection and sample.

use anyhow::Result;

use crate::error::WatchError;
use crate::platform::detect_gpu_provider;
use crate::platform::gpu::DRIVER_REMEDIATION;
use crate::ui;

pub fn execute() -> Result<()> {
    let mut provider = detect_gpu_provider();

    match provider.sample() {
        Ok(sample) => {
            println!(
                "{}",
                ui::format_sample(provider.vendor(), &provider.name(), &sample)
            );
            Ok(())
        }
        Err(WatchError::DriverMissing(reason)) => {
            ui::error(DRIVER_REMEDIATION);
            Err(anyhow::anyhow!("NVIDIA driver missing: {}", reason))
        }
        Err(e) => {
            ui::warn(&format!("{} ({}): {}", provider.name(), provider.vendor(), e));
            Ok(())
        }
    }
}
