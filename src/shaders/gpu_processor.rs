// SPDX-License-Identifier: GPL-3.0-only

//! Shared GPU processor infrastructure
//!
//! - Buffer allocation with dimension caching
//! - Buffer readback
//! - Workgroup count calculation

use crate::errors::{Error, Result};
use crate::gpu::wgpu;

/// Cached resource dimensions - avoids reallocation when dimensions match
#[derive(Default, Clone, Copy, PartialEq, Debug)]
pub struct CachedDimensions {
    pub width: u32,
    pub height: u32,
}

impl CachedDimensions {
    /// Check if dimensions have changed and need update
    pub fn needs_update(&self, width: u32, height: u32) -> bool {
        self.width != width || self.height != height
    }

    pub fn update(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// Map a MAP_READ buffer, hand the first `len` bytes to `read`, then unmap
///
/// The buffer is unmapped even when `read` only borrows the data, so the
/// same staging buffer can be reused for the next frame.
pub async fn read_buffer_with<R>(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    len: u64,
    read: impl FnOnce(&[u8]) -> R,
) -> Result<R> {
    let slice = buffer.slice(..len);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| Error::gpu(format!("Device poll failed: {:?}", e)))?;

    receiver
        .await
        .map_err(|_| Error::gpu("Failed to receive buffer mapping"))?
        .map_err(|e| Error::gpu(format!("Failed to map buffer: {:?}", e)))?;

    let out = {
        let view = slice.get_mapped_range();
        read(&view)
    };
    buffer.unmap();

    Ok(out)
}

/// Number of workgroups needed to cover `dimension`
#[inline]
pub fn compute_dispatch_size(dimension: u32, workgroup_size: u32) -> u32 {
    dimension.div_ceil(workgroup_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_dimensions() {
        let mut dims = CachedDimensions::default();
        assert!(dims.needs_update(640, 480));

        dims.update(640, 480);
        assert!(!dims.needs_update(640, 480));
        assert!(dims.needs_update(1280, 720));
    }

    #[test]
    fn test_compute_dispatch_size() {
        assert_eq!(compute_dispatch_size(640, 16), 40);
        assert_eq!(compute_dispatch_size(641, 16), 41);
        assert_eq!(compute_dispatch_size(16, 16), 1);
        assert_eq!(compute_dispatch_size(1, 16), 1);
    }
}
