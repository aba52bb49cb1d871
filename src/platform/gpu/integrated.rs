use super::adapters::{enumerate_adapters, enumerate_drm_adapters, AdapterVendor, DisplayAdapter};
use crate::core::gpu::{GpuProvider, GpuVendor, ProviderCandidate};
use crate::core::params::GpuSample;
use crate::error::Result;
use std::path::PathBuf;

/// Integrated adapter. Usage reporting is not implemented, so samples are `(0, 0)`.
pub struct IntegratedGpuProvider {
    name: String,
    noted: bool,
}

impl IntegratedGpuProvider {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            noted: false,
        }
    }
}

impl GpuProvider for IntegratedGpuProvider {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Integrated
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn sample(&mut self) -> Result<GpuSample> {
        if !self.noted {
            log::info!(
                "Usage reporting is not available for integrated adapter '{}', sending 0%",
                self.name
            );
            self.noted = true;
        }
        Ok(GpuSample::zero())
    }
}

/// Last in the detection chain: any adapter the OS lists
#[derive(Debug, Default)]
pub struct IntegratedCandidate {
    /// Overrides the platform enumeration with a DRM directory
    drm_root: Option<PathBuf>,
}

impl IntegratedCandidate {
    pub fn with_drm_root<P: Into<PathBuf>>(drm_root: P) -> Self {
        Self {
            drm_root: Some(drm_root.into()),
        }
    }

    fn adapters(&self) -> Result<Vec<DisplayAdapter>> {
        match &self.drm_root {
            Some(root) => enumerate_drm_adapters(root),
            None => enumerate_adapters(),
        }
    }
}

impl ProviderCandidate for IntegratedCandidate {
    fn vendor(&self) -> GpuVendor {
        GpuVendor::Integrated
    }

    fn probe(&self) -> Option<Box<dyn GpuProvider>> {
        let adapters = match self.adapters() {
            Ok(adapters) => adapters,
            Err(e) => {
                log::info!("Adapter enumeration failed: {}", e);
                return None;
            }
        };

        let adapter = adapters
            .iter()
            .find(|a| a.vendor == AdapterVendor::Intel)
            .or_else(|| adapters.first())?;

        Some(Box::new(IntegratedGpuProvider::new(adapter.name.clone())))
    }
}
