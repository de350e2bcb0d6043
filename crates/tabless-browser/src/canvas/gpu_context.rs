use tabless_engine::device::{choose_alpha_mode, AcquireError, GpuBackend};

use crate::dom::ElementId;
use crate::error::{HostError, Result};

/// `GPUCanvasConfiguration`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfiguration {
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub alpha_mode: wgpu::CompositeAlphaMode,
    pub view_formats: Vec<wgpu::TextureFormat>,
}

impl CanvasConfiguration {
    /// Browser defaults for `format`: render-attachment usage, opaque alpha.
    pub fn new(format: wgpu::TextureFormat) -> Self {
        Self {
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            alpha_mode: wgpu::CompositeAlphaMode::Opaque,
            view_formats: Vec::new(),
        }
    }

    pub fn with_alpha_mode(mut self, alpha_mode: wgpu::CompositeAlphaMode) -> Self {
        self.alpha_mode = alpha_mode;
        self
    }

    pub fn with_usage(mut self, usage: wgpu::TextureUsages) -> Self {
        self.usage = usage;
        self
    }
}

/// The one `webgpu` canvas context, bound to the native surface.
///
/// The canvas size is tracked separately from the size the surface was last
/// configured with; the two are reconciled when the frame's texture is
/// requested or the window resizes.
pub struct GpuCanvasContext<B: GpuBackend> {
    canvas: ElementId,

    /// Last configuration passed to `configure`.
    config: Option<CanvasConfiguration>,

    /// Canvas element size in physical pixels.
    size: (u32, u32),

    /// What the backend currently runs with.
    applied: Option<wgpu::SurfaceConfiguration>,

    /// Texture handed out this tick; its presence means a present is pending.
    current: Option<B::Texture>,

    overlay: Option<(B::Texture, (u32, u32))>,
}

impl<B: GpuBackend> GpuCanvasContext<B> {
    pub(crate) fn new(canvas: ElementId, size: (u32, u32)) -> Self {
        Self {
            canvas,
            config: None,
            size,
            applied: None,
            current: None,
            overlay: None,
        }
    }

    pub fn canvas(&self) -> ElementId {
        self.canvas
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn configuration(&self) -> Option<&CanvasConfiguration> {
        self.config.as_ref()
    }

    /// Configuration the native surface currently runs with.
    pub fn surface_configuration(&self) -> Option<&wgpu::SurfaceConfiguration> {
        self.applied.as_ref()
    }

    /// `context.configure(config)`.
    pub fn configure(&mut self, gpu: &mut B, config: CanvasConfiguration) {
        self.current = None;
        self.config = Some(config);
        self.apply(gpu);
    }

    /// `context.unconfigure()`.
    pub fn unconfigure(&mut self, gpu: &mut B) {
        self.current = None;
        self.config = None;
        self.applied = None;
        gpu.unconfigure();
    }

    /// Native window resize: reconfigure right away from the last
    /// configuration so the next frame draws at the new size.
    pub(crate) fn resize(&mut self, gpu: &mut B, width: u32, height: u32) {
        self.size = (width, height);
        self.current = None;
        if self.config.is_some() {
            self.apply(gpu);
        }
    }

    /// Canvas `width`/`height` assignment; picked up by the next
    /// [`get_current_texture`](Self::get_current_texture).
    pub(crate) fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    /// `context.getCurrentTexture()`.
    ///
    /// Repeated calls within a tick return the same texture.
    pub fn get_current_texture(&mut self, gpu: &mut B) -> Result<B::Texture> {
        if self.config.is_none() {
            return Err(HostError::NotConfigured);
        }
        if let Some(texture) = &self.current {
            return Ok(texture.clone());
        }

        let stale = self
            .applied
            .as_ref()
            .is_none_or(|c| (c.width, c.height) != self.size);
        if stale {
            self.apply(gpu);
        }
        if self.applied.is_none() {
            return Err(AcquireError::Skipped(format!(
                "canvas is {}x{}",
                self.size.0, self.size.1
            ))
            .into());
        }

        let texture = gpu.acquire()?;
        self.current = Some(texture.clone());
        Ok(texture)
    }

    /// Clears the pending-present flag; returns whether it was set.
    pub(crate) fn take_present_pending(&mut self) -> bool {
        self.current.take().is_some()
    }

    /// Texture receiving the canvas' 2D pixels, created on first use and
    /// recreated when the canvas size changes.
    pub fn overlay_texture(&mut self, gpu: &B) -> &B::Texture {
        let size = self.size;
        if self.overlay.as_ref().is_some_and(|(_, s)| *s != size) {
            self.overlay = None;
        }
        let (texture, _) = self.overlay.get_or_insert_with(|| {
            let texture = gpu.create_texture(&wgpu::TextureDescriptor {
                label: Some("tabless canvas 2d overlay"),
                size: wgpu::Extent3d {
                    width: size.0.max(1),
                    height: size.1.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::COPY_DST
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            });
            (texture, size)
        });
        texture
    }

    /// Configures the backend for the current size. Zero-sized surfaces are
    /// left unconfigured.
    fn apply(&mut self, gpu: &mut B) {
        let Some(config) = &self.config else {
            return;
        };
        let (width, height) = self.size;
        if width == 0 || height == 0 {
            log::debug!("deferring surface configuration for {width}x{height} canvas");
            self.applied = None;
            return;
        }

        let alpha_mode = choose_alpha_mode(gpu.alpha_modes(), Some(config.alpha_mode));
        if alpha_mode != config.alpha_mode {
            log::debug!("alpha mode {:?} unsupported, using {alpha_mode:?}", config.alpha_mode);
        }

        let surface = wgpu::SurfaceConfiguration {
            usage: config.usage,
            format: config.format,
            width,
            height,
            present_mode: gpu.present_mode(),
            desired_maximum_frame_latency: gpu.frame_latency(),
            alpha_mode,
            view_formats: config.view_formats.clone(),
        };
        gpu.configure(&surface);
        self.applied = Some(surface);
    }
}

impl<B: GpuBackend> std::fmt::Debug for GpuCanvasContext<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuCanvasContext")
            .field("canvas", &self.canvas)
            .field("config", &self.config)
            .field("size", &self.size)
            .field("applied", &self.applied)
            .field("texture_acquired", &self.current.is_some())
            .finish()
    }
}
