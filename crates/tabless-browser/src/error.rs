use tabless_engine::device::AcquireError;

use crate::dom::ElementId;
use crate::loader::LoadError;

/// Errors surfaced to client code.
///
/// Each of these is a contract violation from the client's point of view and
/// there is no degraded behaviour to fall back to.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),

    #[error("a webgpu canvas context already exists; only one GPU canvas is supported")]
    TooManyGpuCanvases,

    #[error("{0} is not supported on this canvas")]
    UnsupportedOperation(&'static str),

    #[error("unsupported canvas context type {0:?}")]
    UnsupportedContext(String),

    #[error("unknown image format")]
    UnknownImageFormat,

    #[error("unsupported image source: {0}")]
    UnsupportedImageSource(String),

    #[error("no element {0}")]
    NoSuchElement(ElementId),

    #[error("cannot append {child} to {parent}: it would become its own ancestor")]
    HierarchyRequest { parent: ElementId, child: ElementId },

    #[error("element {0} is not {1}")]
    WrongElementKind(ElementId, &'static str),

    #[error("no webgpu canvas context exists")]
    NoGpuCanvas,

    #[error("webgpu canvas context is not configured")]
    NotConfigured,

    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error(transparent)]
    Surface(#[from] AcquireError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type Result<T, E = HostError> = std::result::Result<T, E>;
