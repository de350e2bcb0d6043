#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tabless_browser::config::BridgeOptions;
use tabless_browser::loader::LoadError;
use tabless_browser::{Browser, EventBridge};
use tabless_engine::core::HostControl;
use tabless_engine::device::{AcquireError, GpuBackend};
use tabless_engine::input::{Modifiers, MouseButton, NativeEvent};

/// A texture write seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub texture: u32,
    pub origin: wgpu::Origin3d,
    pub data: Vec<u8>,
    pub bytes_per_row: Option<u32>,
    pub size: wgpu::Extent3d,
}

/// Recording backend: textures are numbered, shader modules are their source.
#[derive(Debug)]
pub struct MockGpu {
    pub alpha_modes: Vec<wgpu::CompositeAlphaMode>,
    pub configured: Option<wgpu::SurfaceConfiguration>,
    pub configure_log: Vec<wgpu::SurfaceConfiguration>,
    pub unconfigures: usize,
    pub acquired: Option<u32>,
    pub acquires: usize,
    pub presents: usize,
    pub next_texture: Cell<u32>,
    pub created_textures: RefCell<Vec<(u32, wgpu::Extent3d)>>,
    pub shader_sources: RefCell<Vec<String>>,
    pub writes: RefCell<Vec<Write>>,
    pub scope_depth: usize,
    pub scopes_pushed: usize,
    /// Reported by the next scope pop.
    pub validation_error: Option<String>,
}

impl Default for MockGpu {
    fn default() -> Self {
        Self {
            alpha_modes: vec![
                wgpu::CompositeAlphaMode::Opaque,
                wgpu::CompositeAlphaMode::PreMultiplied,
            ],
            configured: None,
            configure_log: Vec::new(),
            unconfigures: 0,
            acquired: None,
            acquires: 0,
            presents: 0,
            next_texture: Cell::new(1),
            created_textures: RefCell::default(),
            shader_sources: RefCell::default(),
            writes: RefCell::default(),
            scope_depth: 0,
            scopes_pushed: 0,
            validation_error: None,
        }
    }
}

impl MockGpu {
    fn fresh_id(&self) -> u32 {
        let id = self.next_texture.get();
        self.next_texture.set(id + 1);
        id
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.borrow().clone()
    }
}

impl GpuBackend for MockGpu {
    type Texture = u32;
    type ShaderModule = String;

    fn preferred_format(&self) -> wgpu::TextureFormat {
        wgpu::TextureFormat::Bgra8Unorm
    }

    fn alpha_modes(&self) -> &[wgpu::CompositeAlphaMode] {
        &self.alpha_modes
    }

    fn present_mode(&self) -> wgpu::PresentMode {
        wgpu::PresentMode::Fifo
    }

    fn frame_latency(&self) -> u32 {
        2
    }

    fn configure(&mut self, config: &wgpu::SurfaceConfiguration) {
        assert!(config.width > 0 && config.height > 0, "zero-sized configure");
        self.acquired = None;
        self.configured = Some(config.clone());
        self.configure_log.push(config.clone());
    }

    fn unconfigure(&mut self) {
        self.acquired = None;
        self.configured = None;
        self.unconfigures += 1;
    }

    fn acquire(&mut self) -> Result<u32, AcquireError> {
        if self.configured.is_none() {
            return Err(AcquireError::Unconfigured);
        }
        if let Some(t) = self.acquired {
            return Ok(t);
        }
        let id = self.fresh_id();
        self.acquired = Some(id);
        self.acquires += 1;
        Ok(id)
    }

    fn present(&mut self) -> bool {
        if self.acquired.take().is_some() {
            self.presents += 1;
            true
        } else {
            false
        }
    }

    fn create_shader_module(&self, _label: Option<&str>, wgsl: &str) -> String {
        self.shader_sources.borrow_mut().push(wgsl.to_string());
        wgsl.to_string()
    }

    fn create_texture(&self, desc: &wgpu::TextureDescriptor<'_>) -> u32 {
        let id = self.fresh_id();
        self.created_textures.borrow_mut().push((id, desc.size));
        id
    }

    fn write_texture(
        &self,
        texture: &u32,
        origin: wgpu::Origin3d,
        data: &[u8],
        layout: wgpu::TexelCopyBufferLayout,
        size: wgpu::Extent3d,
    ) {
        self.writes.borrow_mut().push(Write {
            texture: *texture,
            origin,
            data: data.to_vec(),
            bytes_per_row: layout.bytes_per_row,
            size,
        });
    }

    fn push_validation_scope(&mut self) {
        self.scope_depth += 1;
        self.scopes_pushed += 1;
    }

    fn pop_validation_scope(&mut self) -> Option<String> {
        assert!(self.scope_depth > 0, "pop without push");
        self.scope_depth -= 1;
        self.validation_error.take()
    }
}

pub type Fetched = HashMap<String, Vec<u8>>;

/// Serves `files` by exact URL; everything else is a 404.
pub fn fetcher(files: Fetched) -> impl Fn(&str) -> Result<Vec<u8>, LoadError> + 'static {
    move |url: &str| {
        files.get(url).cloned().ok_or_else(|| LoadError::Status {
            url: url.to_string(),
            status: 404,
        })
    }
}

pub fn browser() -> Browser<MockGpu> {
    Browser::new(fetcher(Fetched::new()))
}

pub fn bridge() -> EventBridge<MockGpu> {
    EventBridge::new(browser(), BridgeOptions::default())
}

pub fn started(width: u32, height: u32, scale_factor: f64) -> NativeEvent {
    NativeEvent::Started { width, height, scale_factor }
}

pub fn resized(width: u32, height: u32) -> NativeEvent {
    NativeEvent::Resized { width, height, scale_factor: 1.0 }
}

pub fn down(x: f32, y: f32) -> NativeEvent {
    NativeEvent::PointerDown {
        button: MouseButton::Left,
        x,
        y,
        modifiers: Modifiers::default(),
    }
}

pub fn moved(x: f32, y: f32) -> NativeEvent {
    NativeEvent::PointerMoved { x, y, modifiers: Modifiers::default() }
}

/// Feeds events in order, asserting each one lets the loop continue.
pub fn pump(bridge: &mut EventBridge<MockGpu>, gpu: &mut MockGpu, events: impl IntoIterator<Item = NativeEvent>) {
    for event in events {
        let control = bridge.handle(event.clone(), gpu);
        assert_eq!(control, HostControl::Continue, "{event:?}");
    }
}

/// PNG bytes of a solid colour.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}
