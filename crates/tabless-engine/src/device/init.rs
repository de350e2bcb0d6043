/// Initialization parameters for the GPU layer.
///
/// Surface configuration itself is driven by client code through the canvas
/// context; these values only cover what has to be decided before the first
/// `configure` call.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when reporting the preferred canvas format.
    pub prefer_srgb: bool,

    /// Present mode used for every surface configuration.
    ///
    /// FIFO is broadly supported and is what a browser compositor behaves like.
    pub present_mode: wgpu::PresentMode,

    /// Required wgpu features.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}
