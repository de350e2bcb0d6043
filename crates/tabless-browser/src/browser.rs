//! The process context client code talks to.

use std::collections::VecDeque;
use std::rc::Rc;

use tabless_engine::device::GpuBackend;
use tabless_engine::time::{FrameClock, FrameTime};

use crate::canvas::{CanvasConfiguration, GpuCanvasContext, RasterSurface};
use crate::config::LoaderConfig;
use crate::decode;
use crate::dom::{Document, ElementId, Event, EventDetail, EventTarget, Listener, Listeners};
use crate::error::{HostError, Result};
use crate::loader::{Fetch, ResourceLoader};
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::shims::{CopyDestination, GpuShims, ImageSource};

/// The `window` object.
#[derive(Debug)]
pub struct WindowState {
    inner_width: f64,
    inner_height: f64,
    device_pixel_ratio: f64,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            inner_width: 0.0,
            inner_height: 0.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl WindowState {
    /// Logical pixels.
    pub fn inner_width(&self) -> f64 {
        self.inner_width
    }

    pub fn inner_height(&self) -> f64 {
        self.inner_height
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    /// Drawable size in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.inner_width * self.device_pixel_ratio).round() as u32,
            (self.inner_height * self.device_pixel_ratio).round() as u32,
        )
    }

    pub(crate) fn set_physical_size(&mut self, width: u32, height: u32, scale_factor: f64) {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        self.inner_width = width as f64 / scale;
        self.inner_height = height as f64 / scale;
        self.device_pixel_ratio = scale;
    }
}

/// What `get_context` created.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderingContext {
    /// The GPU presentation context; reach it through [`Scope::canvas_context`].
    WebGpu(ElementId),
    /// A 2D context; draw through [`Browser::raster_mut`].
    TwoD(ElementId),
}

/// Source of [`Scope::copy_external_image_to_texture`].
#[derive(Debug, Clone, Copy)]
pub enum ExternalImage<'a> {
    /// A loaded `img` or a canvas with a 2D context.
    Element(ElementId),
    Source(ImageSource<'a>),
}

#[derive(Debug)]
enum Task {
    LoadImage {
        element: ElementId,
        generation: u64,
        src: String,
    },
}

/// Browser state for one process: document, window, animation frames, the
/// GPU canvas and pending image loads.
pub struct Browser<B: GpuBackend> {
    document: Document,
    window: WindowState,
    listeners: Listeners<Listener<B>>,
    scheduler: FrameScheduler<B>,
    gpu_canvas: Option<GpuCanvasContext<B>>,
    /// Never decreases; one GPU canvas per process, even after it is dropped.
    gpu_contexts_created: u32,
    tasks: VecDeque<Task>,
    fetcher: Box<dyn Fetch>,
    clock: FrameClock,
}

impl<B: GpuBackend> Browser<B> {
    pub fn new(fetcher: impl Fetch + 'static) -> Self {
        Self {
            document: Document::new(),
            window: WindowState::default(),
            listeners: Listeners::default(),
            scheduler: FrameScheduler::default(),
            gpu_canvas: None,
            gpu_contexts_created: 0,
            tasks: VecDeque::new(),
            fetcher: Box::new(fetcher),
            clock: FrameClock::new(),
        }
    }

    /// Uses a [`ResourceLoader`] for image loads.
    pub fn with_loader(config: LoaderConfig) -> Self {
        Self::new(ResourceLoader::new(config))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn window(&self) -> &WindowState {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut WindowState {
        &mut self.window
    }

    pub fn create_element(&mut self, tag: &str) -> Result<ElementId> {
        self.document.create_element(tag)
    }

    pub fn get_element_by_id(&mut self, id: &str) -> ElementId {
        self.document.get_element_by_id(id)
    }

    /// `element.setAttribute`, keeping the GPU context's size in step with
    /// its canvas.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<()> {
        self.document.set_attribute(element, name, value)?;
        self.sync_gpu_canvas_size(element);
        Ok(())
    }

    /// `canvas.width = w; canvas.height = h`.
    pub fn set_canvas_size(&mut self, canvas: ElementId, width: u32, height: u32) -> Result<()> {
        self.document.canvas_mut(canvas)?.set_size(width, height);
        self.sync_gpu_canvas_size(canvas);
        Ok(())
    }

    /// `window.addEventListener(type, listener)`.
    pub fn add_window_listener(
        &mut self,
        event_type: &str,
        listener: impl for<'a> FnMut(&mut Scope<'a, B>, &Event) -> anyhow::Result<()> + 'static,
    ) {
        self.listeners
            .add(EventTarget::Window, event_type, Box::new(listener));
    }

    /// `element.addEventListener(type, listener)`.
    pub fn add_event_listener(
        &mut self,
        element: ElementId,
        event_type: &str,
        listener: impl for<'a> FnMut(&mut Scope<'a, B>, &Event) -> anyhow::Result<()> + 'static,
    ) -> Result<()> {
        self.document.element(element)?;
        self.listeners
            .add(EventTarget::Element(element), event_type, Box::new(listener));
        Ok(())
    }

    pub fn listener_count(&self, target: EventTarget, event_type: &str) -> usize {
        self.listeners.count(target, event_type)
    }

    /// `requestAnimationFrame(callback)`.
    pub fn request_animation_frame(
        &mut self,
        callback: impl for<'a> FnOnce(&mut Scope<'a, B>, f64) -> anyhow::Result<()> + 'static,
    ) -> FrameHandle {
        self.scheduler.request(Box::new(callback))
    }

    pub fn pending_frame_callbacks(&self) -> usize {
        self.scheduler.len()
    }

    /// `performance.now()`.
    pub fn performance_now(&self) -> f64 {
        self.clock.now_ms()
    }

    /// `canvas.getContext(id)` for `"webgpu"` and `"2d"`.
    ///
    /// Only one GPU context may ever be created per process; the window has a
    /// single native surface.
    pub fn get_context(&mut self, canvas: ElementId, context_id: &str) -> Result<RenderingContext> {
        match context_id {
            "webgpu" => {
                let element = self.document.canvas_mut(canvas)?;
                if self.gpu_contexts_created > 0 {
                    return Err(HostError::TooManyGpuCanvases);
                }

                // The GPU canvas is backed by the window surface; size it to match.
                let (w, h) = self.window.physical_size();
                if w > 0 && h > 0 {
                    element.set_size(w, h);
                }

                self.gpu_contexts_created += 1;
                self.gpu_canvas = Some(GpuCanvasContext::new(canvas, element.size()));
                log::info!("webgpu context created on canvas {canvas}");
                Ok(RenderingContext::WebGpu(canvas))
            }
            "2d" => {
                self.document.canvas_mut(canvas)?.raster_or_create();
                Ok(RenderingContext::TwoD(canvas))
            }
            other => Err(HostError::UnsupportedContext(other.to_string())),
        }
    }

    /// The 2D surface of `canvas`.
    pub fn raster(&self, canvas: ElementId) -> Result<&RasterSurface> {
        self.document
            .canvas(canvas)?
            .raster()
            .ok_or(HostError::UnsupportedOperation("2d drawing without a 2d context"))
    }

    pub fn raster_mut(&mut self, canvas: ElementId) -> Result<&mut RasterSurface> {
        self.document
            .canvas_mut(canvas)?
            .raster_mut()
            .ok_or(HostError::UnsupportedOperation("2d drawing without a 2d context"))
    }

    /// `canvas.toDataURL()`; needs a 2D context.
    pub fn to_data_url(&self, canvas: ElementId) -> Result<String> {
        self.document
            .canvas(canvas)?
            .raster()
            .ok_or(HostError::UnsupportedOperation("toDataURL"))?
            .to_data_url()
    }

    pub fn gpu_canvas(&self) -> Option<&GpuCanvasContext<B>> {
        self.gpu_canvas.as_ref()
    }

    /// `img.src = url`. The load runs on the next task pump.
    pub fn set_image_src(&mut self, image: ElementId, src: &str) -> Result<()> {
        let generation = self.document.image_mut(image)?.begin_load(src.to_string());
        self.document
            .element_mut(image)?
            .attributes
            .insert("src".into(), src.to_string());
        self.tasks.push_back(Task::LoadImage {
            element: image,
            generation,
            src: src.to_string(),
        });
        Ok(())
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Runs the tasks queued so far. Tasks queued by these run next time.
    pub fn run_tasks(&mut self, gpu: &mut B) -> usize {
        let batch = std::mem::take(&mut self.tasks);
        let count = batch.len();
        for task in batch {
            match task {
                Task::LoadImage { element, generation, src } => {
                    self.load_image(gpu, element, generation, &src)
                }
            }
        }
        count
    }

    fn load_image(&mut self, gpu: &mut B, element: ElementId, generation: u64, src: &str) {
        let current = |doc: &Document| {
            doc.image(element)
                .is_ok_and(|img| img.generation() == generation)
        };
        if !current(&self.document) {
            log::trace!("dropping stale load of {src} for {element}");
            return;
        }

        let result = self
            .fetcher
            .fetch(src)
            .map_err(HostError::from)
            .and_then(|bytes| decode::decode(&bytes));

        if !current(&self.document) {
            return;
        }
        let event_type = match (result, self.document.image_mut(element)) {
            (Ok(decoded), Ok(img)) => {
                img.decoded = Some(Rc::new(decoded));
                "load"
            }
            (Err(e), Ok(img)) => {
                log::warn!("image {src} failed to load: {e}");
                img.failed = true;
                "error"
            }
            (_, Err(_)) => return,
        };

        let event = Event::new(event_type, EventTarget::Element(element), EventDetail::None)
            .at(self.clock.now_ms());
        Scope::new(self, gpu).dispatch_event(&event);
    }

    pub(crate) fn tick_clock(&mut self) -> FrameTime {
        self.clock.tick()
    }

    pub(crate) fn take_frame_batch(&mut self) -> Vec<crate::scheduler::FrameCallback<B>> {
        self.scheduler.take_batch()
    }

    pub(crate) fn has_frame_callbacks(&self) -> bool {
        !self.scheduler.is_empty()
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32, scale_factor: f64) {
        self.window.set_physical_size(width, height, scale_factor);
    }

    /// Native resize: the GPU canvas follows the window and the surface is
    /// reconfigured at once.
    pub(crate) fn resize_gpu_canvas(&mut self, gpu: &mut B, width: u32, height: u32) {
        let Some(ctx) = self.gpu_canvas.as_mut() else {
            return;
        };
        let (width, height) = match self.document.canvas_mut(ctx.canvas()) {
            Ok(canvas) => {
                canvas.set_size(width, height);
                canvas.size()
            }
            Err(_) => (width, height),
        };
        ctx.resize(gpu, width, height);
    }

    /// Whether the GPU canvas has no pixels to draw into, as while the window
    /// is minimized.
    pub(crate) fn gpu_canvas_is_empty(&self) -> bool {
        self.gpu_canvas.as_ref().is_some_and(|ctx| {
            let (w, h) = ctx.size();
            w == 0 || h == 0
        })
    }

    pub(crate) fn gpu_canvas_element(&self) -> Option<ElementId> {
        self.gpu_canvas.as_ref().map(GpuCanvasContext::canvas)
    }

    /// Clears the pending-present flag; returns whether the tick should present.
    pub(crate) fn take_present_pending(&mut self) -> bool {
        self.gpu_canvas
            .as_mut()
            .is_some_and(GpuCanvasContext::take_present_pending)
    }

    /// Uploads the GPU canvas' 2D pixels into its overlay texture when they
    /// changed since the last upload.
    pub(crate) fn flush_overlay(&mut self, gpu: &B) {
        let Some(ctx) = self.gpu_canvas.as_mut() else {
            return;
        };
        let Ok(canvas) = self.document.canvas_mut(ctx.canvas()) else {
            return;
        };
        let Some(raster) = canvas.raster_mut() else {
            return;
        };
        if !raster.take_dirty() {
            return;
        }

        let (ctx_w, ctx_h) = ctx.size();
        let width = raster.width().min(ctx_w);
        let height = raster.height().min(ctx_h);
        if width == 0 || height == 0 {
            return;
        }
        let texture = ctx.overlay_texture(gpu).clone();
        gpu.write_texture(
            &texture,
            wgpu::Origin3d::ZERO,
            raster.as_rgba(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * raster.width()),
                rows_per_image: Some(raster.height()),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        log::trace!("uploaded {width}x{height} 2d overlay");
    }

    fn sync_gpu_canvas_size(&mut self, element: ElementId) {
        let Some(ctx) = self.gpu_canvas.as_mut() else {
            return;
        };
        if ctx.canvas() != element {
            return;
        }
        if let Ok(canvas) = self.document.canvas(element) {
            let (w, h) = canvas.size();
            ctx.set_canvas_size(w, h);
        }
    }
}

impl<B: GpuBackend> std::fmt::Debug for Browser<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("document", &self.document)
            .field("window", &self.window)
            .field("listeners", &self.listeners)
            .field("scheduler", &self.scheduler)
            .field("gpu_canvas", &self.gpu_canvas)
            .field("gpu_contexts_created", &self.gpu_contexts_created)
            .field("tasks", &self.tasks)
            .finish_non_exhaustive()
    }
}

/// What a setup script or frame callback gets: the browser plus the shimmed
/// GPU device, both borrowed for the duration of the call.
pub struct Scope<'a, B: GpuBackend> {
    pub browser: &'a mut Browser<B>,
    gpu: &'a mut B,
}

impl<'a, B: GpuBackend> Scope<'a, B> {
    pub fn new(browser: &'a mut Browser<B>, gpu: &'a mut B) -> Self {
        Self { browser, gpu }
    }

    /// `target.dispatchEvent(event)`: runs the handlers registered on
    /// `event.target` for its type and returns how many ran.
    pub fn dispatch_event(&mut self, event: &Event) -> usize {
        let (target, event_type) = (event.target, event.event_type.as_str());
        let mut handlers = self.browser.listeners.take(target, event_type);
        for handler in &mut handlers {
            if let Err(e) = handler(&mut *self, event) {
                log::error!("{event_type} listener on {target:?} failed: {e:#}");
            }
        }
        let ran = handlers.len();
        self.browser.listeners.restore(target, event_type, handlers);
        ran
    }

    /// The device, with browser shims applied.
    pub fn gpu(&mut self) -> GpuShims<'_, B> {
        GpuShims::new(&mut *self.gpu)
    }

    /// The `webgpu` canvas context, once `get_context` created it.
    pub fn canvas_context(&mut self) -> Result<CanvasContext<'_, B>> {
        let ctx = self.browser.gpu_canvas.as_mut().ok_or(HostError::NoGpuCanvas)?;
        Ok(CanvasContext {
            ctx,
            gpu: &mut *self.gpu,
        })
    }

    /// `queue.copyExternalImageToTexture` accepting DOM elements as sources.
    pub fn copy_external_image_to_texture(
        &mut self,
        source: ExternalImage<'_>,
        destination: CopyDestination<'_, B::Texture>,
        size: Option<(u32, u32)>,
    ) -> Result<()> {
        let document = &self.browser.document;
        let source = match source {
            ExternalImage::Source(source) => source,
            ExternalImage::Element(id) => {
                let element = document.element(id)?;
                if let Some(img) = element.as_image() {
                    let decoded = img.decoded().ok_or_else(|| {
                        HostError::UnsupportedImageSource(format!("image {id} is not loaded"))
                    })?;
                    ImageSource::Decoded(decoded)
                } else if let Some(canvas) = element.as_canvas() {
                    let raster = canvas.raster().ok_or_else(|| {
                        HostError::UnsupportedImageSource(format!("canvas {id} has no 2d context"))
                    })?;
                    ImageSource::Raster(raster)
                } else {
                    return Err(HostError::UnsupportedImageSource(format!(
                        "<{}> element",
                        element.tag()
                    )));
                }
            }
        };
        GpuShims::new(&mut *self.gpu).copy_external_image_to_texture(source, destination, size)
    }
}

/// The `webgpu` canvas context as seen from a callback.
pub struct CanvasContext<'a, B: GpuBackend> {
    ctx: &'a mut GpuCanvasContext<B>,
    gpu: &'a mut B,
}

impl<B: GpuBackend> CanvasContext<'_, B> {
    pub fn canvas(&self) -> ElementId {
        self.ctx.canvas()
    }

    pub fn configure(&mut self, config: CanvasConfiguration) {
        self.ctx.configure(self.gpu, config);
    }

    pub fn unconfigure(&mut self) {
        self.ctx.unconfigure(self.gpu);
    }

    pub fn get_current_texture(&mut self) -> Result<B::Texture> {
        self.ctx.get_current_texture(self.gpu)
    }

    pub fn configuration(&self) -> Option<&CanvasConfiguration> {
        self.ctx.configuration()
    }

    pub fn surface_configuration(&self) -> Option<&wgpu::SurfaceConfiguration> {
        self.ctx.surface_configuration()
    }

    /// Texture holding the canvas' 2D pixels, for compositing.
    pub fn overlay_texture(&mut self) -> B::Texture {
        self.ctx.overlay_texture(self.gpu).clone()
    }

    pub fn preferred_format(&self) -> wgpu::TextureFormat {
        self.gpu.preferred_format()
    }
}
