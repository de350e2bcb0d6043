//! Canvas elements and their rendering contexts.

mod gpu_context;
mod raster;

pub use gpu_context::{CanvasConfiguration, GpuCanvasContext};
pub use raster::{ImageData, RasterSurface};

pub const DEFAULT_CANVAS_WIDTH: u32 = 300;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 150;

/// Largest width or height a canvas takes; larger values are clamped. Matches
/// the default device limit for 2D textures, so the overlay always fits.
pub const MAX_CANVAS_DIMENSION: u32 = 8192;

/// State of a `<canvas>` element.
///
/// The GPU presentation context itself lives in the browser context; there is
/// at most one.
#[derive(Debug)]
pub struct CanvasElement {
    width: u32,
    height: u32,
    raster: Option<RasterSurface>,
}

impl Default for CanvasElement {
    fn default() -> Self {
        Self {
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
            raster: None,
        }
    }
}

impl CanvasElement {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Sets `width`/`height`, clamped to [`MAX_CANVAS_DIMENSION`]. Any change
    /// recreates the 2D buffer cleared.
    pub fn set_size(&mut self, width: u32, height: u32) {
        if width > MAX_CANVAS_DIMENSION || height > MAX_CANVAS_DIMENSION {
            log::warn!("canvas size {width}x{height} clamped to {MAX_CANVAS_DIMENSION}");
        }
        let width = width.min(MAX_CANVAS_DIMENSION);
        let height = height.min(MAX_CANVAS_DIMENSION);
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        if let Some(raster) = &mut self.raster {
            raster.resize(width, height);
        }
    }

    pub fn raster(&self) -> Option<&RasterSurface> {
        self.raster.as_ref()
    }

    pub fn raster_mut(&mut self) -> Option<&mut RasterSurface> {
        self.raster.as_mut()
    }

    /// Returns the 2D surface, creating it at the current size.
    pub(crate) fn raster_or_create(&mut self) -> &mut RasterSurface {
        let (w, h) = (self.width, self.height);
        self.raster.get_or_insert_with(|| RasterSurface::new(w, h))
    }
}
