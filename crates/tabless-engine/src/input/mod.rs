//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! The runtime translates platform events into [`NativeEvent`]s; the browser
//! host turns those into DOM events.

mod native;
pub(crate) mod platform;
mod state;
mod types;

pub use native::{EventKind, NativeEvent};
pub use state::{PointerSample, PointerState};
pub use types::{Key, Modifiers, MouseButton, MouseWheelDelta};
