//! Native event pump to DOM events and animation-frame ticks.

use tabless_engine::core::{Host, HostControl};
use tabless_engine::device::GpuBackend;
use tabless_engine::input::{Key, MouseWheelDelta, NativeEvent, PointerState};

use crate::browser::{Browser, Scope};
use crate::config::BridgeOptions;
use crate::dom::{
    Event, EventDetail, EventTarget, PointerEventData, WheelEventData, DOM_DELTA_LINE,
    DOM_DELTA_PIXEL,
};

/// Where the bridge is within the handling of one native event.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BridgeState {
    /// Waiting for the next native event.
    Idle,
    /// Delivering input events to DOM listeners.
    Dispatching,
    /// Running the animation-frame batch.
    Draining,
    /// Presenting the frame the batch drew.
    Presenting,
}

type SetupScript<B> = Box<dyn for<'a> FnOnce(&mut Scope<'a, B>) -> anyhow::Result<()>>;

/// Drives a [`Browser`] from native events.
///
/// Exit codes: 0 for a normal quit, 1 for the force-exit key, a setup or
/// frame callback error, or a GPU validation error.
pub struct EventBridge<B: GpuBackend> {
    browser: Browser<B>,
    options: BridgeOptions,
    setup: Option<SetupScript<B>>,
    pointer: PointerState,
    state: BridgeState,
    /// A resize seen since the last tick; fired before the next batch.
    pending_resize: bool,
    frames_presented: u64,
}

impl<B: GpuBackend> EventBridge<B> {
    pub fn new(browser: Browser<B>, options: BridgeOptions) -> Self {
        Self {
            browser,
            options,
            setup: None,
            pointer: PointerState::default(),
            state: BridgeState::Idle,
            pending_resize: false,
            frames_presented: 0,
        }
    }

    /// Script run once on `Started`, after the window and device exist.
    pub fn with_setup(
        mut self,
        setup: impl for<'a> FnOnce(&mut Scope<'a, B>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    pub fn browser(&self) -> &Browser<B> {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut Browser<B> {
        &mut self.browser
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn resize_pending(&self) -> bool {
        self.pending_resize
    }

    /// Runs `script` with a scope over this bridge's browser.
    pub fn run_script<R>(
        &mut self,
        gpu: &mut B,
        script: impl for<'a> FnOnce(&mut Scope<'a, B>) -> R,
    ) -> R {
        let mut scope = Scope::new(&mut self.browser, gpu);
        script(&mut scope)
    }

    /// Handles one native event, then runs queued tasks.
    pub fn handle(&mut self, event: NativeEvent, gpu: &mut B) -> HostControl {
        log::trace!("native event {:?} ({:#x})", event.kind(), event.kind() as u32);

        let control = match event {
            NativeEvent::Started { width, height, scale_factor } => {
                self.on_started(gpu, width, height, scale_factor)
            }
            NativeEvent::Quit => {
                log::info!("window closed");
                HostControl::Exit(0)
            }
            NativeEvent::Resized { width, height, scale_factor } => {
                self.on_resized(gpu, width, height, scale_factor);
                HostControl::Continue
            }
            NativeEvent::KeyDown { key, .. } => self.on_key(key),
            NativeEvent::DrawReady => self.on_draw_ready(gpu),
            NativeEvent::FocusLost => {
                // Releases land in another window; nothing stays held.
                self.pointer.release_all();
                HostControl::Continue
            }
            ref pointer if pointer.is_pointer() => {
                self.on_pointer(gpu, pointer);
                HostControl::Continue
            }
            _ => HostControl::Continue,
        };
        self.state = BridgeState::Idle;

        if control == HostControl::Continue {
            self.browser.run_tasks(gpu);
        }
        control
    }

    fn on_started(&mut self, gpu: &mut B, width: u32, height: u32, scale_factor: f64) -> HostControl {
        self.browser.set_window_size(width, height, scale_factor);
        log::debug!("started at {width}x{height} (scale {scale_factor})");

        let Some(setup) = self.setup.take() else {
            return HostControl::Continue;
        };
        match self.run_script(gpu, setup) {
            Ok(()) => HostControl::Continue,
            Err(e) => {
                log::error!("setup script failed: {e:#}");
                HostControl::Exit(1)
            }
        }
    }

    fn on_resized(&mut self, gpu: &mut B, width: u32, height: u32, scale_factor: f64) {
        self.browser.set_window_size(width, height, scale_factor);
        self.browser.resize_gpu_canvas(gpu, width, height);
        self.pending_resize = true;
        log::debug!("resized to {width}x{height} (scale {scale_factor})");
    }

    fn on_key(&mut self, key: Key) -> HostControl {
        if self.options.quit_keys.contains(&key) {
            log::info!("quit key {key:?}");
            HostControl::Exit(0)
        } else if self.options.force_exit_keys.contains(&key) {
            log::info!("force-exit key {key:?}");
            HostControl::Exit(1)
        } else {
            HostControl::Continue
        }
    }

    fn on_pointer(&mut self, gpu: &mut B, event: &NativeEvent) {
        let Some(sample) = self.pointer.apply(event) else {
            return;
        };
        let Some(canvas) = self.browser.gpu_canvas_element() else {
            return;
        };
        self.state = BridgeState::Dispatching;

        let target = EventTarget::Element(canvas);
        let pointer = PointerEventData::from(&sample);
        let (primary, legacy, detail) = match event {
            NativeEvent::PointerDown { .. } => ("pointerdown", "mousedown", EventDetail::Pointer(pointer)),
            NativeEvent::PointerUp { .. } => ("pointerup", "mouseup", EventDetail::Pointer(pointer)),
            NativeEvent::PointerMoved { .. } => ("pointermove", "mousemove", EventDetail::Pointer(pointer)),
            NativeEvent::Wheel { delta, .. } => {
                // Native wheel deltas point the other way from DOM deltas.
                let (delta_x, delta_y, delta_mode) = match *delta {
                    MouseWheelDelta::Line { x, y } => (-x as f64, -y as f64, DOM_DELTA_LINE),
                    MouseWheelDelta::Pixel { x, y } => (-x as f64, -y as f64, DOM_DELTA_PIXEL),
                };
                let wheel = WheelEventData {
                    pointer,
                    delta_x,
                    delta_y,
                    delta_z: 0.0,
                    delta_mode,
                };
                ("wheel", "mousewheel", EventDetail::Wheel(wheel))
            }
            _ => return,
        };

        let now = self.browser.performance_now();
        let mut scope = Scope::new(&mut self.browser, gpu);
        for event_type in [primary, legacy] {
            let event = Event::new(event_type, target, detail.clone()).at(now);
            scope.dispatch_event(&event);
        }
    }

    fn on_draw_ready(&mut self, gpu: &mut B) -> HostControl {
        if !self.browser.has_frame_callbacks() {
            return HostControl::Continue;
        }
        if self.browser.gpu_canvas_is_empty() {
            // Minimized: nothing can be acquired, so callbacks and any resize
            // wait for a drawable size.
            log::trace!("skipping tick, gpu canvas has no area");
            return HostControl::Continue;
        }

        self.state = BridgeState::Draining;
        let validate = self.options.validation_scopes;
        if validate {
            gpu.push_validation_scope();
        }

        let frame = self.browser.tick_clock();

        if std::mem::take(&mut self.pending_resize) {
            let window = self.browser.window();
            let detail = EventDetail::Resize {
                inner_width: window.inner_width(),
                inner_height: window.inner_height(),
                device_pixel_ratio: window.device_pixel_ratio(),
            };
            let event = Event::new("resize", EventTarget::Window, detail).at(frame.timestamp_ms);
            Scope::new(&mut self.browser, gpu).dispatch_event(&event);
        }

        let batch = self.browser.take_frame_batch();
        log::trace!("frame {}: {} callbacks", frame.frame_index, batch.len());
        for callback in batch {
            let mut scope = Scope::new(&mut self.browser, gpu);
            if let Err(e) = callback(&mut scope, frame.timestamp_ms) {
                log::error!("animation frame callback failed: {e:#}");
                if validate {
                    if let Some(message) = gpu.pop_validation_scope() {
                        log::error!("GPU validation error in frame {}: {message}", frame.frame_index);
                    }
                }
                return HostControl::Exit(1);
            }
        }

        self.state = BridgeState::Presenting;
        if self.browser.take_present_pending() {
            self.browser.flush_overlay(gpu);
            if gpu.present() {
                self.frames_presented += 1;
            }
        }

        if validate {
            if let Some(message) = gpu.pop_validation_scope() {
                log::error!("GPU validation error in frame {}: {message}", frame.frame_index);
                return HostControl::Exit(1);
            }
        }
        HostControl::Continue
    }
}

impl<B: GpuBackend> Host<B> for EventBridge<B> {
    fn on_native_event(&mut self, event: NativeEvent, gpu: &mut B) -> HostControl {
        self.handle(event, gpu)
    }
}

impl<B: GpuBackend> std::fmt::Debug for EventBridge<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBridge")
            .field("state", &self.state)
            .field("pending_resize", &self.pending_resize)
            .field("frames_presented", &self.frames_presented)
            .field("browser", &self.browser)
            .finish_non_exhaustive()
    }
}
