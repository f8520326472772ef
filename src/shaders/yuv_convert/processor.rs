// SPDX-License-Identifier: GPL-3.0-only

//! GPU-accelerated YUV to RGBA conversion
//!
//! The frame bytes are uploaded once per dispatch into a storage buffer and
//! the kernel writes one packed RGBA word per pixel into a second storage
//! buffer, which is copied into a staging buffer for read-back.

use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, info};

use crate::constants::{RGBA_BYTES_PER_PIXEL, WORKGROUP_SIZE};
use crate::errors::{Error, Result};
use crate::frame::{Plane, YuvFrame};
use crate::gpu::{self, wgpu};
use crate::shaders::compute_dispatch_size;
use crate::shaders::gpu_processor::{CachedDimensions, read_buffer_with};

/// WGSL source of the conversion kernel
pub const YUV_TO_RGBA_SHADER: &str = include_str!("yuv_to_rgba.wgsl");

/// Uniform buffer for shader parameters
///
/// Field order matches `YuvConvertParams` in the WGSL source.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct YuvConvertParams {
    pub width: u32,
    pub height: u32,
    pub chroma_shift_x: u32,
    pub chroma_shift_y: u32,
    pub y_offset: u32,
    pub y_row_stride: u32,
    pub y_pixel_stride: u32,
    pub u_offset: u32,
    pub u_row_stride: u32,
    pub u_pixel_stride: u32,
    pub v_offset: u32,
    pub v_row_stride: u32,
    pub v_pixel_stride: u32,
    _pad: [u32; 3],
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        Error::gpu(format!(
            "{} {} does not fit the shader's u32 addressing",
            what, value
        ))
    })
}

/// Single upload buffer holding every plane the frame reads
struct FrameUpload<'a> {
    bytes: Cow<'a, [u8]>,
    params: YuvConvertParams,
}

impl<'a> FrameUpload<'a> {
    /// Planes that borrow the same buffer are uploaded once; otherwise the
    /// planes are concatenated and their offsets rebased.
    fn new(frame: &YuvFrame<'a>) -> Result<Self> {
        let [y, u, v] = frame.planes();
        let shared = same_buffer(y, u) && same_buffer(y, v);

        let (bytes, bases) = if shared {
            (Cow::Borrowed(y.data()), [0usize; 3])
        } else {
            let mut joined =
                Vec::with_capacity(y.data().len() + u.data().len() + v.data().len());
            let mut bases = [0usize; 3];
            for (base, plane) in bases.iter_mut().zip([y, u, v]) {
                *base = joined.len();
                joined.extend_from_slice(plane.data());
            }
            (Cow::Owned(joined), bases)
        };
        to_u32(bytes.len(), "frame size")?;

        let (chroma_shift_x, chroma_shift_y) = frame.chroma_shift();
        let params = YuvConvertParams {
            width: frame.width(),
            height: frame.height(),
            chroma_shift_x,
            chroma_shift_y,
            y_offset: to_u32(bases[0] + y.offset(), "Y offset")?,
            y_row_stride: to_u32(y.row_stride(), "Y row stride")?,
            y_pixel_stride: to_u32(y.pixel_stride(), "Y pixel stride")?,
            u_offset: to_u32(bases[1] + u.offset(), "U offset")?,
            u_row_stride: to_u32(u.row_stride(), "U row stride")?,
            u_pixel_stride: to_u32(u.pixel_stride(), "U pixel stride")?,
            v_offset: to_u32(bases[2] + v.offset(), "V offset")?,
            v_row_stride: to_u32(v.row_stride(), "V row stride")?,
            v_pixel_stride: to_u32(v.pixel_stride(), "V pixel stride")?,
            _pad: [0; 3],
        };

        Ok(Self { bytes, params })
    }

    /// Upload size rounded up to the 4-byte copy alignment
    fn padded_len(&self) -> u64 {
        (self.bytes.len() as u64).next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
    }
}

/// Reject frames the device cannot bind or dispatch
///
/// Returns the workgroup counts for the frame.
fn check_limits(
    limits: &wgpu::Limits,
    width: u32,
    height: u32,
    input_len: u64,
) -> Result<(u32, u32)> {
    let workgroups_x = compute_dispatch_size(width, WORKGROUP_SIZE);
    let workgroups_y = compute_dispatch_size(height, WORKGROUP_SIZE);
    let max_groups = limits.max_compute_workgroups_per_dimension;
    if workgroups_x > max_groups || workgroups_y > max_groups {
        return Err(Error::gpu(format!(
            "{}x{} frame needs {}x{} workgroups, device allows {} per dimension",
            width, height, workgroups_x, workgroups_y, max_groups
        )));
    }

    let max_binding = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    let output_len = width as u64 * height as u64 * RGBA_BYTES_PER_PIXEL as u64;
    for (what, len) in [("output", output_len), ("input", input_len)] {
        if len > max_binding {
            return Err(Error::gpu(format!(
                "{} buffer of {} bytes exceeds the device binding limit of {} bytes",
                what, len, max_binding
            )));
        }
    }

    Ok((workgroups_x, workgroups_y))
}

fn same_buffer(a: &Plane<'_>, b: &Plane<'_>) -> bool {
    std::ptr::eq(a.data().as_ptr(), b.data().as_ptr()) && a.data().len() == b.data().len()
}

/// Result of YUV to RGBA conversion
pub struct YuvConvertResult {
    /// Width of output image
    pub width: u32,
    /// Height of output image
    pub height: u32,
    /// RGBA data (4 bytes per pixel) - only populated if read back to CPU
    pub rgba: Option<Vec<u8>>,
    /// Packed RGBA storage buffer for further GPU work
    pub buffer: Arc<wgpu::Buffer>,
}

/// GPU processor for YUV to RGBA conversion
pub struct YuvConvertProcessor {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    adapter_name: String,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    // Cached resources for reuse
    cached_dims: CachedDimensions,
    input_capacity: u64,
    input_buffer: Option<wgpu::Buffer>,
    output_buffer: Option<Arc<wgpu::Buffer>>,
    staging_buffer: Option<wgpu::Buffer>,
}

impl YuvConvertProcessor {
    /// Create a new YUV converter with GPU acceleration
    pub async fn new() -> Result<Self> {
        let (device, queue, info) = gpu::create_compute_device("YUV Convert").await?;

        info!(
            adapter_name = %info.adapter_name,
            backend = ?info.backend,
            "GPU device created for YUV conversion"
        );

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("YUV to RGBA Shader"),
            source: wgpu::ShaderSource::Wgsl(YUV_TO_RGBA_SHADER.into()),
        });

        let storage_entry = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("YUV Convert Bind Group Layout"),
            entries: &[
                // Params uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Input frame bytes
                storage_entry(1, true),
                // Output RGBA words
                storage_entry(2, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("YUV Convert Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("YUV to RGBA Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(e) = device.pop_error_scope().await {
            return Err(Error::gpu(format!("Failed to build YUV convert pipeline: {}", e)));
        }

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("YUV Params Buffer"),
            size: std::mem::size_of::<YuvConvertParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            adapter_name: info.adapter_name,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            cached_dims: CachedDimensions::default(),
            input_capacity: 0,
            input_buffer: None,
            output_buffer: None,
            staging_buffer: None,
        })
    }

    /// Ensure output and staging buffers match the frame dimensions
    fn ensure_output(&mut self, width: u32, height: u32) {
        if !self.cached_dims.needs_update(width, height) {
            return;
        }

        debug!(width, height, "Allocating YUV convert output buffers");

        let output_size = width as u64 * height as u64 * RGBA_BYTES_PER_PIXEL as u64;
        self.output_buffer = Some(Arc::new(self.device.create_buffer(
            &wgpu::BufferDescriptor {
                label: Some("RGBA Output Buffer"),
                size: output_size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            },
        )));
        self.staging_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("RGBA Staging Buffer"),
            size: output_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        }));

        self.cached_dims.update(width, height);
    }

    /// Grow the input buffer when a frame needs more room than it has
    fn ensure_input(&mut self, size: u64) {
        if self.input_buffer.is_some() && size <= self.input_capacity {
            return;
        }

        debug!(size, "Allocating YUV input buffer");
        self.input_buffer = Some(self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("YUV Input Buffer"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.input_capacity = size;
    }

    /// Upload the frame and submit one conversion dispatch
    ///
    /// Frames beyond the device limits, and any validation error wgpu
    /// reports while encoding, come back as [`Error::Gpu`].
    async fn dispatch(
        &mut self,
        frame: &YuvFrame<'_>,
        read_back: bool,
    ) -> Result<Arc<wgpu::Buffer>> {
        let upload = FrameUpload::new(frame)?;
        let (width, height) = (frame.width(), frame.height());
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| Error::gpu(format!("{}x{} pixel count overflows", width, height)))?;
        to_u32(pixels, "pixel count")?;
        let (workgroups_x, workgroups_y) =
            check_limits(&self.device.limits(), width, height, upload.padded_len())?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let output = self.encode_and_submit(
            &upload,
            width,
            height,
            workgroups_x,
            workgroups_y,
            read_back,
        );
        let scope_error = self.device.pop_error_scope().await;

        if let Some(e) = scope_error {
            // Buffers may be invalid now; reallocate on the next frame
            self.cached_dims = CachedDimensions::default();
            self.input_buffer = None;
            self.input_capacity = 0;
            return Err(Error::gpu(format!("YUV convert dispatch failed: {}", e)));
        }
        output
    }

    fn encode_and_submit(
        &mut self,
        upload: &FrameUpload<'_>,
        width: u32,
        height: u32,
        workgroups_x: u32,
        workgroups_y: u32,
        read_back: bool,
    ) -> Result<Arc<wgpu::Buffer>> {
        self.ensure_output(width, height);
        self.ensure_input(upload.padded_len());

        let (Some(input_buffer), Some(output_buffer), Some(staging_buffer)) = (
            self.input_buffer.as_ref(),
            self.output_buffer.as_ref(),
            self.staging_buffer.as_ref(),
        ) else {
            return Err(Error::gpu("YUV convert buffers not allocated"));
        };

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&upload.params));

        // write_buffer wants 4-byte multiples: aligned body, then a padded tail
        let bytes = upload.bytes.as_ref();
        let body = bytes.len() & !3;
        if body > 0 {
            self.queue.write_buffer(input_buffer, 0, &bytes[..body]);
        }
        if body < bytes.len() {
            let mut tail = [0u8; 4];
            tail[..bytes.len() - body].copy_from_slice(&bytes[body..]);
            self.queue.write_buffer(input_buffer, body as u64, &tail);
        }

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("YUV Convert Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: input_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("YUV Convert Encoder"),
            });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("YUV to RGBA Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bind_group, &[]);
            compute_pass.dispatch_workgroups(workgroups_x, workgroups_y, 1);
        }

        if read_back {
            encoder.copy_buffer_to_buffer(
                output_buffer,
                0,
                staging_buffer,
                0,
                output_buffer.size(),
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        Ok(Arc::clone(output_buffer))
    }

    /// Convert a frame on the GPU
    ///
    /// With `read_back` false the result only carries the GPU buffer; the
    /// caller is responsible for any further synchronisation.
    pub async fn convert(
        &mut self,
        frame: &YuvFrame<'_>,
        read_back: bool,
    ) -> Result<YuvConvertResult> {
        let buffer = self.dispatch(frame, read_back).await?;

        let rgba = if read_back {
            let staging_buffer = self
                .staging_buffer
                .as_ref()
                .ok_or_else(|| Error::gpu("staging buffer not allocated"))?;
            Some(
                read_buffer_with(&self.device, staging_buffer, buffer.size(), <[u8]>::to_vec)
                    .await?,
            )
        } else {
            None
        };

        Ok(YuvConvertResult {
            width: frame.width(),
            height: frame.height(),
            rgba,
            buffer,
        })
    }

    /// Convert a frame and copy the RGBA bytes into `out`
    ///
    /// `out` must be exactly `width * height * 4` bytes.
    pub async fn convert_into(&mut self, frame: &YuvFrame<'_>, out: &mut [u8]) -> Result<()> {
        let buffer = self.dispatch(frame, true).await?;
        if out.len() as u64 != buffer.size() {
            return Err(Error::OutputSize {
                len: out.len(),
                expected: buffer.size() as usize,
            });
        }

        let staging_buffer = self
            .staging_buffer
            .as_ref()
            .ok_or_else(|| Error::gpu("staging buffer not allocated"))?;
        read_buffer_with(&self.device, staging_buffer, buffer.size(), |bytes| {
            out.copy_from_slice(bytes)
        })
        .await
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::convert_frame_to_vec;
    use crate::frame::YuvLayout;

    #[test]
    fn test_params_layout() {
        assert_eq!(std::mem::size_of::<YuvConvertParams>(), 64);
    }

    #[test]
    fn test_shared_buffer_uploaded_once() {
        let data = vec![7u8; YuvLayout::NV21.frame_size(6, 4).unwrap()];
        let frame = YuvFrame::new(&data, 6, 4, YuvLayout::NV21).unwrap();
        let upload = FrameUpload::new(&frame).unwrap();

        assert!(matches!(upload.bytes, Cow::Borrowed(_)));
        assert_eq!(upload.params.y_offset, 0);
        assert_eq!(upload.params.v_offset, 24);
        assert_eq!(upload.params.u_offset, 25);
        assert_eq!(upload.params.u_pixel_stride, 2);
        assert_eq!(upload.padded_len(), 36);
    }

    #[test]
    fn test_separate_planes_rebased() {
        let y = [1u8, 2, 3, 4, 5];
        let u = [9u8, 0];
        let v = [8u8];
        let frame = YuvFrame::from_planes(
            2,
            2,
            Plane::new(&y, 1, 2, 1),
            Plane::new(&u, 1, 1, 1),
            Plane::new(&v, 0, 1, 1),
            1,
            1,
        )
        .unwrap();
        let upload = FrameUpload::new(&frame).unwrap();

        assert_eq!(upload.bytes.as_ref(), &[1, 2, 3, 4, 5, 9, 0, 8]);
        assert_eq!(upload.params.y_offset, 1);
        assert_eq!(upload.params.u_offset, 6);
        assert_eq!(upload.params.v_offset, 7);
        assert_eq!(upload.padded_len(), 8);
    }

    #[test]
    fn test_dispatch_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert_eq!(check_limits(&limits, 640, 480, 460_800).unwrap(), (40, 30));

        // One column past 65535 workgroups of 16
        let wide = 16 * 65535 + 16;
        assert!(matches!(
            check_limits(&limits, wide, 1, 1024),
            Err(Error::Gpu(_))
        ));
        assert!(matches!(
            check_limits(&limits, 1, wide, 1024),
            Err(Error::Gpu(_))
        ));
    }

    #[test]
    fn test_buffer_limits() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 1024,
            ..wgpu::Limits::downlevel_defaults()
        };
        // 16x16 RGBA is exactly 1024 bytes
        assert!(check_limits(&limits, 16, 16, 384).is_ok());
        assert!(matches!(
            check_limits(&limits, 16, 17, 384),
            Err(Error::Gpu(_))
        ));
        assert!(matches!(
            check_limits(&limits, 8, 8, 2048),
            Err(Error::Gpu(_))
        ));
    }

    #[test]
    fn test_over_wide_frame_returns_error() {
        // This test requires a GPU, so it may be skipped in CI
        let mut processor = match pollster::block_on(YuvConvertProcessor::new()) {
            Ok(processor) => processor,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };

        let width = 16 * processor.device.limits().max_compute_workgroups_per_dimension + 16;
        let data = vec![128u8; YuvLayout::I420.frame_size(width, 1).unwrap()];
        let frame = YuvFrame::new(&data, width, 1, YuvLayout::I420).unwrap();
        let result = pollster::block_on(processor.convert(&frame, true));
        assert!(matches!(result, Err(Error::Gpu(_))));

        // The processor stays usable afterwards
        let small = vec![128u8; YuvLayout::I420.frame_size(4, 4).unwrap()];
        let frame = YuvFrame::new(&small, 4, 4, YuvLayout::I420).unwrap();
        assert!(pollster::block_on(processor.convert(&frame, true)).is_ok());
    }

    #[test]
    fn test_gpu_matches_cpu() {
        // This test requires a GPU, so it may be skipped in CI
        let mut processor = match pollster::block_on(YuvConvertProcessor::new()) {
            Ok(processor) => processor,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };

        for layout in YuvLayout::ALL {
            // Odd height and a width that is not a workgroup multiple
            let (w, h) = (34, 17);
            let data: Vec<u8> = (0..layout.frame_size(w, h).unwrap())
                .map(|i| ((i * 53 + 7) % 256) as u8)
                .collect();
            let frame = YuvFrame::new(&data, w, h, layout).unwrap();

            let result = pollster::block_on(processor.convert(&frame, true)).unwrap();
            assert_eq!(result.rgba.unwrap(), convert_frame_to_vec(&frame), "{}", layout);
        }
    }
}
