//! Time subsystem.
//!
//! Provides the clock behind `performance.now()` and the timestamps handed to
//! animation-frame callbacks.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
