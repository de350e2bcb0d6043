//! GPU device + surface management.
//!
//! This module is responsible for:
//! - the `GpuBackend` seam the browser host talks to
//! - creating the wgpu Instance/Adapter/Device/Queue behind that seam
//! - configuring, acquiring and presenting the window surface

mod backend;
mod error;
mod gpu;
mod init;
mod surface;

pub use backend::GpuBackend;
pub use error::{AcquireError, SurfaceErrorAction};
pub use gpu::WgpuBackend;
pub use init::GpuInit;
pub use surface::{choose_alpha_mode, choose_surface_format};
