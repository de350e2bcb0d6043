use crate::device::GpuBackend;
use crate::input::NativeEvent;

/// Control directive returned by host callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum HostControl {
    Continue,
    /// Stop the event loop and leave the process with this exit code.
    Exit(i32),
}

/// Contract implemented by the layer driven by the native event pump.
///
/// The runtime owns the GPU backend and lends it for the duration of each
/// event; hosts never keep it.
pub trait Host<B: GpuBackend> {
    /// Called for every native event, in arrival order, on the loop thread.
    fn on_native_event(&mut self, event: NativeEvent, gpu: &mut B) -> HostControl;
}
