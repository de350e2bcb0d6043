//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, wires them to the GPU backend and
//! feeds native events to a [`Host`](crate::core::Host).

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
