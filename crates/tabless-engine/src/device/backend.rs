use super::AcquireError;

/// The native GPU binding as seen by the browser host.
///
/// One backend exists per process. The runtime owns it and lends it to the
/// host for each native event. Everything here mirrors an entry point that a
/// WebGPU canvas context or device ends up calling; nothing else is exposed.
///
/// Resource handles are associated types so the host can be driven by a
/// recording backend in tests without a real adapter.
pub trait GpuBackend {
    type Texture: Clone;
    type ShaderModule;

    /// Format answered to `navigator.gpu.getPreferredCanvasFormat()`.
    fn preferred_format(&self) -> wgpu::TextureFormat;

    /// Alpha modes the surface can composite with.
    fn alpha_modes(&self) -> &[wgpu::CompositeAlphaMode];

    /// Present mode every configuration uses.
    fn present_mode(&self) -> wgpu::PresentMode;

    /// Desired maximum frame latency every configuration uses.
    fn frame_latency(&self) -> u32;

    /// Applies a surface configuration. Zero-sized configurations must not be
    /// passed in; callers defer them.
    fn configure(&mut self, config: &wgpu::SurfaceConfiguration);

    /// Drops the active configuration and any acquired-but-unpresented texture.
    fn unconfigure(&mut self);

    /// Returns the texture for the current frame, acquiring it on first call.
    fn acquire(&mut self) -> Result<Self::Texture, AcquireError>;

    /// Presents the acquired texture. Returns `false` when nothing was acquired.
    fn present(&mut self) -> bool;

    fn create_shader_module(&self, label: Option<&str>, wgsl: &str) -> Self::ShaderModule;

    fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> Self::Texture;

    /// Raw-bytes texture upload (`GPUQueue.writeTexture`).
    fn write_texture(
        &self,
        texture: &Self::Texture,
        origin: wgpu::Origin3d,
        data: &[u8],
        layout: wgpu::TexelCopyBufferLayout,
        size: wgpu::Extent3d,
    );

    /// Opens a validation error scope.
    fn push_validation_scope(&mut self);

    /// Closes the innermost validation scope, returning the captured error
    /// message if any call inside the scope failed validation.
    fn pop_validation_scope(&mut self) -> Option<String>;
}
