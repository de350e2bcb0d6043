//! tabless engine crate.
//!
//! This crate owns the platform + GPU runtime pieces the browser host sits on:
//! the winit event loop, the wgpu surface backend, the native event model and
//! frame timing.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
