use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::surface;
use super::{AcquireError, GpuBackend, GpuInit, SurfaceErrorAction};

/// wgpu implementation of [`GpuBackend`] bound to one window.
///
/// The surface starts unconfigured: a browser canvas shows nothing until the
/// page calls `configure`, and client code is expected to do the same.
pub struct WgpuBackend {
    /// Kept alive for the surface; the surface is `'static` through the `Arc`.
    window: Arc<Window>,

    surface: wgpu::Surface<'static>,

    adapter: wgpu::Adapter,

    device: wgpu::Device,

    queue: wgpu::Queue,

    capabilities: wgpu::SurfaceCapabilities,

    preferred_format: wgpu::TextureFormat,

    present_mode: wgpu::PresentMode,

    frame_latency: u32,

    /// Last configuration applied to the surface, if any.
    config: Option<wgpu::SurfaceConfiguration>,

    /// Texture acquired this frame and not yet presented.
    pending: Option<wgpu::SurfaceTexture>,

    scopes: Vec<wgpu::ErrorScopeGuard>,
}

impl WgpuBackend {
    /// Requests adapter and device for `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; the runtime
    /// blocks on it once at startup.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let GpuInit {
            prefer_srgb,
            present_mode,
            required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tabless device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let capabilities = surface.get_capabilities(&adapter);
        let preferred_format = surface::choose_surface_format(&capabilities, prefer_srgb)
            .context("no supported surface formats")?;

        log::info!(
            "gpu ready: {} ({:?}), preferred canvas format {:?}",
            adapter.get_info().name,
            adapter.get_info().backend,
            preferred_format
        );

        Ok(Self {
            window,
            surface,
            adapter,
            device,
            queue,
            capabilities,
            preferred_format,
            present_mode,
            frame_latency: desired_maximum_frame_latency,
            config: None,
            pending: None,
            scopes: Vec::new(),
        })
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    /// Current drawable size of the window (physical pixels).
    pub fn window_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    fn try_acquire(&mut self) -> std::result::Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface.get_current_texture()
    }
}

impl GpuBackend for WgpuBackend {
    type Texture = wgpu::Texture;
    type ShaderModule = wgpu::ShaderModule;

    fn preferred_format(&self) -> wgpu::TextureFormat {
        self.preferred_format
    }

    fn alpha_modes(&self) -> &[wgpu::CompositeAlphaMode] {
        &self.capabilities.alpha_modes
    }

    fn present_mode(&self) -> wgpu::PresentMode {
        self.present_mode
    }

    fn frame_latency(&self) -> u32 {
        self.frame_latency
    }

    fn configure(&mut self, config: &wgpu::SurfaceConfiguration) {
        // A texture acquired under the old configuration must not be presented.
        self.pending = None;
        self.surface.configure(&self.device, config);
        self.config = Some(config.clone());
        log::debug!("surface configured {}x{} {:?}", config.width, config.height, config.format);
    }

    fn unconfigure(&mut self) {
        self.pending = None;
        self.config = None;
    }

    fn acquire(&mut self) -> Result<Self::Texture, AcquireError> {
        if let Some(pending) = &self.pending {
            return Ok(pending.texture.clone());
        }
        let Some(config) = self.config.clone() else {
            return Err(AcquireError::Unconfigured);
        };

        let frame = match self.try_acquire() {
            Ok(frame) => frame,
            Err(err) => match surface::map_surface_error(&err) {
                SurfaceErrorAction::Reconfigured => {
                    self.surface.configure(&self.device, &config);
                    self.try_acquire()
                        .map_err(|e| AcquireError::Skipped(e.to_string()))?
                }
                SurfaceErrorAction::SkipFrame => return Err(AcquireError::Skipped(err.to_string())),
                SurfaceErrorAction::Fatal => return Err(AcquireError::Fatal(err.to_string())),
            },
        };

        let texture = frame.texture.clone();
        self.pending = Some(frame);
        Ok(texture)
    }

    fn present(&mut self) -> bool {
        let Some(frame) = self.pending.take() else {
            return false;
        };
        self.window.pre_present_notify();
        frame.present();
        true
    }

    fn create_shader_module(&self, label: Option<&str>, wgsl: &str) -> Self::ShaderModule {
        self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label,
            source: wgpu::ShaderSource::Wgsl(wgsl.into()),
        })
    }

    fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> Self::Texture {
        self.device.create_texture(desc)
    }

    fn write_texture(
        &self,
        texture: &Self::Texture,
        origin: wgpu::Origin3d,
        data: &[u8],
        layout: wgpu::TexelCopyBufferLayout,
        size: wgpu::Extent3d,
    ) {
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            layout,
            size,
        );
    }

    fn push_validation_scope(&mut self) {
        let guard = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        self.scopes.push(guard);
    }

    fn pop_validation_scope(&mut self) -> Option<String> {
        let guard = self.scopes.pop()?;
        pollster::block_on(guard.pop()).map(|err| err.to_string())
    }
}
