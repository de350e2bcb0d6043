use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{Host, HostControl};
use crate::device::{GpuInit, WgpuBackend};
use crate::input::NativeEvent;
use crate::input::platform::PlatformInput;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// Sleep after each draw tick so back-to-back redraws cannot starve the
    /// native event source. Zero disables it.
    pub frame_yield: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "tabless".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            frame_yield: Duration::ZERO,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs the event loop until the host asks to exit or the window closes.
    ///
    /// Returns the exit code chosen by the host. Window or GPU setup failures
    /// are returned as errors.
    pub fn run<H>(config: RuntimeConfig, gpu_init: GpuInit, host: H) -> Result<i32>
    where
        H: Host<WgpuBackend> + 'static,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, host);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.setup_error.take() {
            return Err(err);
        }
        Ok(state.exit_code.unwrap_or(0))
    }
}

struct WindowEntry {
    window: Arc<Window>,
    gpu: WgpuBackend,
    input: PlatformInput,
}

struct AppState<H> {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    host: H,

    entry: Option<WindowEntry>,
    exit_code: Option<i32>,
    setup_error: Option<anyhow::Error>,
}

impl<H> AppState<H>
where
    H: Host<WgpuBackend>,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, host: H) -> Self {
        Self {
            config,
            gpu_init,
            host,
            entry: None,
            exit_code: None,
            setup_error: None,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(WgpuBackend::new(window.clone(), self.gpu_init.clone()))
            .context("GPU initialization failed")?;

        self.entry = Some(WindowEntry {
            window,
            gpu,
            input: PlatformInput::default(),
        });
        Ok(())
    }

    /// Hands one event to the host and applies its verdict.
    fn dispatch(&mut self, event_loop: &ActiveEventLoop, event: NativeEvent) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        if let HostControl::Exit(code) = self.host.on_native_event(event, &mut entry.gpu) {
            log::info!("host requested exit with code {code}");
            self.exit_code = Some(code);
            event_loop.exit();
        }
    }
}

impl<H> ApplicationHandler for AppState<H>
where
    H: Host<WgpuBackend>,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("startup failed: {e:#}");
            self.setup_error = Some(e);
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_ref() else {
            return;
        };
        let size = entry.window.inner_size();
        let started = NativeEvent::Started {
            width: size.width,
            height: size.height,
            scale_factor: entry.window.scale_factor(),
        };
        entry.window.request_redraw();
        self.dispatch(event_loop, started);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_code.is_some() {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Browsers tick animation frames continuously while the page is visible.
        if let Some(entry) = &self.entry {
            entry.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_code.is_some() {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let Some(native) = entry.input.translate(&entry.window, &event) else {
            return;
        };
        let is_draw = native == NativeEvent::DrawReady;

        self.dispatch(event_loop, native);

        if is_draw && !self.config.frame_yield.is_zero() {
            std::thread::sleep(self.config.frame_yield);
        }
    }
}
