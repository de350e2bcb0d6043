//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the runtime (platform loop)
//! and the host layer that consumes native events.

mod app;

pub use app::{Host, HostControl};
