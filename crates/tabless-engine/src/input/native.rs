use super::types::{Key, Modifiers, MouseButton, MouseWheelDelta};

/// Stable integer tag of each native event kind.
///
/// Values follow the classic SDL event numbering so traces recorded from
/// other hosts line up.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum EventKind {
    Quit = 0x100,
    Started = 0x101,
    WindowResized = 0x200,
    WindowFocusLost = 0x202,
    KeyDown = 0x300,
    MouseMotion = 0x400,
    MouseButtonDown = 0x401,
    MouseButtonUp = 0x402,
    MouseWheel = 0x403,
    DrawReady = 0x8000,
}

/// Native window/input events delivered to the host, one at a time.
///
/// Coordinates are logical pixels relative to the window's client area;
/// sizes are physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    /// Window and GPU device exist; sent once before anything else.
    Started {
        width: u32,
        height: u32,
        scale_factor: f64,
    },

    /// Window close requested.
    Quit,

    Resized {
        width: u32,
        height: u32,
        scale_factor: f64,
    },

    KeyDown {
        key: Key,
        modifiers: Modifiers,
        repeat: bool,
    },

    PointerMoved {
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerDown {
        button: MouseButton,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    PointerUp {
        button: MouseButton,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    Wheel {
        delta: MouseWheelDelta,
        x: f32,
        y: f32,
        modifiers: Modifiers,
    },

    /// The window stopped receiving keyboard and pointer input.
    FocusLost,

    /// The window is ready to draw a new frame.
    DrawReady,
}

impl NativeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NativeEvent::Started { .. } => EventKind::Started,
            NativeEvent::Quit => EventKind::Quit,
            NativeEvent::Resized { .. } => EventKind::WindowResized,
            NativeEvent::KeyDown { .. } => EventKind::KeyDown,
            NativeEvent::PointerMoved { .. } => EventKind::MouseMotion,
            NativeEvent::PointerDown { .. } => EventKind::MouseButtonDown,
            NativeEvent::PointerUp { .. } => EventKind::MouseButtonUp,
            NativeEvent::Wheel { .. } => EventKind::MouseWheel,
            NativeEvent::FocusLost => EventKind::WindowFocusLost,
            NativeEvent::DrawReady => EventKind::DrawReady,
        }
    }

    /// True for the pointer family (motion, buttons, wheel).
    pub fn is_pointer(&self) -> bool {
        matches!(
            self.kind(),
            EventKind::MouseMotion
                | EventKind::MouseButtonDown
                | EventKind::MouseButtonUp
                | EventKind::MouseWheel
        )
    }
}
