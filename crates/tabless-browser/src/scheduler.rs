//! `requestAnimationFrame` queue.

use tabless_engine::device::GpuBackend;

use crate::browser::Scope;

/// Value returned by `request_animation_frame`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameHandle(pub u64);

/// A queued animation-frame callback. Receives the frame scope and the
/// frame timestamp in milliseconds.
pub type FrameCallback<B> = Box<dyn for<'a> FnOnce(&mut Scope<'a, B>, f64) -> anyhow::Result<()>>;

/// Callbacks waiting for the next draw-ready tick.
pub struct FrameScheduler<B: GpuBackend> {
    queue: Vec<FrameCallback<B>>,
    next_handle: u64,
}

impl<B: GpuBackend> Default for FrameScheduler<B> {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            next_handle: 1,
        }
    }
}

impl<B: GpuBackend> FrameScheduler<B> {
    pub fn request(&mut self, callback: FrameCallback<B>) -> FrameHandle {
        let handle = FrameHandle(self.next_handle);
        self.next_handle += 1;
        self.queue.push(callback);
        handle
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Takes every queued callback, leaving an empty queue for callbacks
    /// registered while the batch runs.
    pub fn take_batch(&mut self) -> Vec<FrameCallback<B>> {
        std::mem::take(&mut self.queue)
    }
}

impl<B: GpuBackend> std::fmt::Debug for FrameScheduler<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("queued", &self.queue.len())
            .field("next_handle", &self.next_handle)
            .finish()
    }
}
