//! tabless browser host: just enough of a browser for graphics demo code.
//!
//! Client code sees a [`Browser`] (document, window, `requestAnimationFrame`,
//! canvas contexts, image loading) and, inside frame callbacks and event
//! listeners, a [`Scope`] that adds the shimmed GPU device. The [`EventBridge`]
//! drives all of it from native events delivered by
//! `tabless_engine::window::Runtime`.
//!
//! ```rust,ignore
//! use tabless_browser::prelude::*;
//!
//! let bridge = EventBridge::new(Browser::with_loader(LoaderConfig::from_env()), BridgeOptions::from_env())
//!     .with_setup(|scope| {
//!         let canvas = scope.browser.create_element("canvas")?;
//!         scope.browser.get_context(canvas, "webgpu")?;
//!         let format = scope.gpu().preferred_format();
//!         scope.canvas_context()?.configure(CanvasConfiguration::new(format));
//!         scope.browser.request_animation_frame(|scope, _t| {
//!             let _texture = scope.canvas_context()?.get_current_texture()?;
//!             Ok(())
//!         });
//!         Ok(())
//!     });
//! ```

pub mod bridge;
pub mod browser;
pub mod canvas;
pub mod config;
pub mod decode;
pub mod dom;
pub mod error;
pub mod loader;
pub mod scheduler;
pub mod shims;

pub use bridge::{BridgeState, EventBridge};
pub use browser::{Browser, CanvasContext, ExternalImage, RenderingContext, Scope, WindowState};
pub use error::{HostError, Result};

/// Everything demo code usually needs.
pub mod prelude {
    pub use crate::bridge::{BridgeState, EventBridge};
    pub use crate::browser::{Browser, CanvasContext, ExternalImage, RenderingContext, Scope};
    pub use crate::canvas::{CanvasConfiguration, ImageData, RasterSurface};
    pub use crate::config::{BridgeOptions, LoaderConfig};
    pub use crate::decode::DecodedImage;
    pub use crate::dom::{ElementId, Event, EventDetail};
    pub use crate::error::HostError;
    pub use crate::scheduler::{FrameCallback, FrameHandle};
    pub use crate::shims::{CopyDestination, GpuShims, ImageSource, RawImage};
}
