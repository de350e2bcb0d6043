/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; acquisition may be retried.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate.
    Fatal,
}

/// Failure to obtain the frame's target texture.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("surface is not configured")]
    Unconfigured,

    #[error("surface texture unavailable this frame: {0}")]
    Skipped(String),

    #[error("surface failed fatally: {0}")]
    Fatal(String),
}
