use std::fmt;

/// Keyboard key identifier.
///
/// Only what the host reacts to is named. Printable keys carry their
/// lowercase character; everything else keeps the platform scancode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Space,
    Character(char),
    /// Platform-dependent key not represented here.
    Unknown(u32),
}

/// Mouse button identifier.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl MouseButton {
    /// `MouseEvent.button` value.
    pub fn dom_button(self) -> i16 {
        match self {
            MouseButton::Left => 0,
            MouseButton::Middle => 1,
            MouseButton::Right => 2,
            MouseButton::Back => 3,
            MouseButton::Forward => 4,
            MouseButton::Other(v) => v.min(i16::MAX as u16) as i16,
        }
    }

    /// Bit of this button in `MouseEvent.buttons`.
    pub fn buttons_bit(self) -> u16 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Right => 2,
            MouseButton::Middle => 4,
            MouseButton::Back => 8,
            MouseButton::Forward => 16,
            MouseButton::Other(_) => 0,
        }
    }
}

/// Modifier keys state.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Mouse wheel delta, in the platform's sign convention (positive `y` scrolls up).
///
/// `Line` corresponds to "scroll lines" style input; `Pixel` is high precision.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MouseWheelDelta {
    Line { x: f32, y: f32 },
    Pixel { x: f32, y: f32 },
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Character(c) => write!(f, "{c}"),
            other => write!(f, "{:?}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_button_numbering_matches_browsers() {
        assert_eq!(MouseButton::Left.dom_button(), 0);
        assert_eq!(MouseButton::Middle.dom_button(), 1);
        assert_eq!(MouseButton::Right.dom_button(), 2);
    }

    #[test]
    fn buttons_bits_are_distinct() {
        let bits = [
            MouseButton::Left,
            MouseButton::Right,
            MouseButton::Middle,
            MouseButton::Back,
            MouseButton::Forward,
        ]
        .map(MouseButton::buttons_bit);
        assert_eq!(bits.iter().fold(0, |acc, b| acc | b), 0b11111);
    }
}
