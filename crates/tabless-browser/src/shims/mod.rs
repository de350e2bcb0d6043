//! Device-level shims.
//!
//! [`GpuShims`] wraps the native backend for the duration of one callback and
//! adds the browser behaviour native wgpu lacks: uploads from DOM image
//! sources, a `device.lost` promise, and WGSL fixups.

mod shader;
mod upload;

use std::future::Pending;

use tabless_engine::device::GpuBackend;

use crate::error::{HostError, Result};

pub use shader::rewrite_wgsl;
pub use upload::{ImageSource, RawImage};

/// `GPUDeviceLostInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLostInfo {
    pub reason: String,
    pub message: String,
}

/// Destination of an external-image copy (`GPUImageCopyTextureTagged`).
#[derive(Debug, Clone, Copy)]
pub struct CopyDestination<'a, T> {
    pub texture: &'a T,
    pub origin: wgpu::Origin3d,
}

impl<'a, T> CopyDestination<'a, T> {
    pub fn new(texture: &'a T) -> Self {
        Self { texture, origin: wgpu::Origin3d::ZERO }
    }

    pub fn at(mut self, x: u32, y: u32) -> Self {
        self.origin = wgpu::Origin3d { x, y, z: 0 };
        self
    }
}

/// Decorator over the native GPU backend.
pub struct GpuShims<'a, B: GpuBackend> {
    gpu: &'a mut B,
}

impl<'a, B: GpuBackend> GpuShims<'a, B> {
    pub fn new(gpu: &'a mut B) -> Self {
        Self { gpu }
    }

    /// The undecorated backend.
    pub fn backend(&self) -> &B {
        self.gpu
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.gpu
    }

    /// `navigator.gpu.getPreferredCanvasFormat()`.
    pub fn preferred_format(&self) -> wgpu::TextureFormat {
        self.gpu.preferred_format()
    }

    /// `device.createShaderModule({ code })` with WGSL fixups applied.
    pub fn create_shader_module(&self, label: Option<&str>, wgsl: &str) -> B::ShaderModule {
        let source = rewrite_wgsl(wgsl);
        self.gpu.create_shader_module(label, &source)
    }

    pub fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> B::Texture {
        self.gpu.create_texture(desc)
    }

    /// `queue.writeTexture`, passed through.
    pub fn write_texture(
        &self,
        texture: &B::Texture,
        origin: wgpu::Origin3d,
        data: &[u8],
        layout: wgpu::TexelCopyBufferLayout,
        size: wgpu::Extent3d,
    ) {
        self.gpu.write_texture(texture, origin, data, layout, size);
    }

    /// `queue.copyExternalImageToTexture(source, destination, size)`.
    ///
    /// The source is flattened to RGBA8 and written with a raw texture write.
    /// `size` defaults to the full source; it may not exceed it.
    pub fn copy_external_image_to_texture(
        &self,
        source: ImageSource<'_>,
        destination: CopyDestination<'_, B::Texture>,
        size: Option<(u32, u32)>,
    ) -> Result<()> {
        let (src_w, src_h) = source.size();
        let (width, height) = size.unwrap_or((src_w, src_h));
        if width > src_w || height > src_h {
            return Err(HostError::UnsupportedImageSource(format!(
                "copy of {width}x{height} from a {src_w}x{src_h} source"
            )));
        }
        if width == 0 || height == 0 {
            return Ok(());
        }

        let rgba = source.to_rgba8()?;
        // Rows are laid out at the source width; a smaller copy reads a prefix of each row.
        self.gpu.write_texture(
            destination.texture,
            destination.origin,
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * src_w),
                rows_per_image: Some(src_h),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        log::trace!("copyExternalImageToTexture {width}x{height} at {:?}", destination.origin);
        Ok(())
    }

    /// `device.lost`: native devices here are never reported lost, so the
    /// promise never settles.
    pub fn lost(&self) -> Pending<DeviceLostInfo> {
        std::future::pending()
    }
}
