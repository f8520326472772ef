// SPDX-License-Identifier: GPL-3.0-only

//! GPU initialization utilities for compute pipelines.
//!
//! Conversion only needs a compute queue: no surface is requested, so this
//! works on headless machines with any wgpu backend.

use std::sync::Arc;
use tracing::{debug, info};

use crate::errors::{Error, Result};

/// wgpu re-export so compute modules share one import path
pub use ::wgpu;

/// Information about the created GPU device
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
    /// Adapter class (discrete, integrated, CPU emulation)
    pub device_type: wgpu::DeviceType,
}

/// Create a wgpu device and queue for compute work.
///
/// # Arguments
///
/// * `label` - A label for the device (for debugging)
pub async fn create_compute_device(
    label: &str,
) -> Result<(Arc<wgpu::Device>, Arc<wgpu::Queue>, GpuDeviceInfo)> {
    info!(label = label, "Creating GPU device for compute");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| Error::gpu(format!("Failed to find suitable GPU adapter: {}", e)))?;

    let adapter_info = adapter.get_info();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        device_type = ?adapter_info.device_type,
        "GPU adapter selected for compute"
    );

    let downlevel = adapter.get_downlevel_capabilities();
    if !downlevel.flags.contains(wgpu::DownlevelFlags::COMPUTE_SHADERS) {
        return Err(Error::gpu(format!(
            "Adapter {} ({:?}) does not support compute shaders",
            adapter_info.name, adapter_info.backend
        )));
    }

    // Conversion fits comfortably inside downlevel limits; ask for the
    // adapter's own storage buffer ceiling so large frames still bind.
    let adapter_limits = adapter.limits();
    let required_limits = wgpu::Limits {
        max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
        max_buffer_size: adapter_limits.max_buffer_size,
        ..wgpu::Limits::downlevel_defaults()
    };
    debug!(
        max_storage_buffer_binding_size = required_limits.max_storage_buffer_binding_size,
        max_compute_workgroups_per_dimension = required_limits.max_compute_workgroups_per_dimension,
        "Requesting compute limits"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits,
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| Error::gpu(format!("Failed to create GPU device: {}", e)))?;

    let info = GpuDeviceInfo {
        adapter_name: adapter_info.name.clone(),
        backend: adapter_info.backend,
        device_type: adapter_info.device_type,
    };

    Ok((Arc::new(device), Arc::new(queue), info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_compute_device() {
        // This test requires a GPU, so it may be skipped in CI
        match pollster::block_on(create_compute_device("test_device")) {
            Ok((device, queue, info)) => {
                println!("Created device: {:?}", info);
                assert!(!info.adapter_name.is_empty() || info.backend != wgpu::Backend::Noop);
                drop(queue);
                drop(device);
            }
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
            }
        }
    }
}
