use super::native::NativeEvent;
use super::types::Modifiers;

/// Pointer values derived from one native pointer event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub y: f32,
    /// Delta from the previous known pointer position (`movementX/Y`).
    pub movement_x: f32,
    pub movement_y: f32,
    /// `MouseEvent.button`; `-1` for motion and wheel, like browsers report.
    pub button: i16,
    /// `MouseEvent.buttons` after this event.
    pub buttons: u16,
    pub modifiers: Modifiers,
}

/// Last known pointer position and pressed-button mask.
///
/// The first event after construction reports zero movement.
#[derive(Debug, Default)]
pub struct PointerState {
    /// Pointer position in logical pixels.
    pub position: Option<(f32, f32)>,

    /// Currently held buttons, `MouseEvent.buttons` layout.
    pub buttons: u16,

    pub modifiers: Modifiers,
}

impl PointerState {
    /// Applies a native pointer event and returns the sample to publish.
    ///
    /// Non-pointer events leave the state untouched and return `None`.
    pub fn apply(&mut self, ev: &NativeEvent) -> Option<PointerSample> {
        let (x, y, modifiers, button) = match ev {
            NativeEvent::PointerMoved { x, y, modifiers } => (*x, *y, *modifiers, -1),
            NativeEvent::PointerDown { button, x, y, modifiers } => {
                self.buttons |= button.buttons_bit();
                (*x, *y, *modifiers, button.dom_button())
            }
            NativeEvent::PointerUp { button, x, y, modifiers } => {
                self.buttons &= !button.buttons_bit();
                (*x, *y, *modifiers, button.dom_button())
            }
            NativeEvent::Wheel { x, y, modifiers, .. } => (*x, *y, *modifiers, -1),
            _ => return None,
        };

        let (px, py) = self.position.unwrap_or((x, y));
        self.position = Some((x, y));
        self.modifiers = modifiers;

        Some(PointerSample {
            x,
            y,
            movement_x: x - px,
            movement_y: y - py,
            button,
            buttons: self.buttons,
            modifiers,
        })
    }

    /// Clears held buttons when focus is lost mid-press.
    pub fn release_all(&mut self) {
        self.buttons = 0;
    }
}
