use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as LogicalKey, ModifiersState, NamedKey, PhysicalKey};
use winit::window::Window;

use super::native::NativeEvent;
use super::types::{Key, Modifiers, MouseButton, MouseWheelDelta};

/// Translates winit window events into [`NativeEvent`]s.
///
/// winit reports button and wheel events without a position, so the last
/// cursor position and modifier state are tracked here.
#[derive(Debug, Default)]
pub(crate) struct PlatformInput {
    cursor: (f32, f32),
    modifiers: Modifiers,
}

impl PlatformInput {
    pub(crate) fn translate(&mut self, window: &Window, event: &WindowEvent) -> Option<NativeEvent> {
        match event {
            WindowEvent::CloseRequested => Some(NativeEvent::Quit),

            WindowEvent::Resized(size) => Some(NativeEvent::Resized {
                width: size.width,
                height: size.height,
                scale_factor: window.scale_factor(),
            }),

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let size = window.inner_size();
                Some(NativeEvent::Resized {
                    width: size.width,
                    height: size.height,
                    scale_factor: *scale_factor,
                })
            }

            WindowEvent::RedrawRequested => Some(NativeEvent::DrawReady),

            WindowEvent::Focused(false) => Some(NativeEvent::FocusLost),

            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = map_modifiers(m.state());
                None
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = to_logical_f32(window, *position);
                let (x, y) = self.cursor;
                Some(NativeEvent::PointerMoved { x, y, modifiers: self.modifiers })
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_mouse_button(*button);
                let (x, y) = self.cursor;
                let modifiers = self.modifiers;
                Some(match state {
                    ElementState::Pressed => NativeEvent::PointerDown { button, x, y, modifiers },
                    ElementState::Released => NativeEvent::PointerUp { button, x, y, modifiers },
                })
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => MouseWheelDelta::Line { x: *x, y: *y },
                    MouseScrollDelta::PixelDelta(p) => {
                        let (x, y) = to_logical_f32(window, *p);
                        MouseWheelDelta::Pixel { x, y }
                    }
                };
                let (x, y) = self.cursor;
                Some(NativeEvent::Wheel { delta, x, y, modifiers: self.modifiers })
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                Some(NativeEvent::KeyDown {
                    key: map_key(&event.logical_key, event.physical_key),
                    modifiers: self.modifiers,
                    repeat: event.repeat,
                })
            }

            other => {
                log::trace!("untranslated window event: {other:?}");
                None
            }
        }
    }
}

fn to_logical_f32(window: &Window, pos: PhysicalPosition<f64>) -> (f32, f32) {
    let scale = window.scale_factor();
    let logical = pos.to_logical::<f64>(scale);
    (logical.x as f32, logical.y as f32)
}

fn map_modifiers(m: ModifiersState) -> Modifiers {
    Modifiers {
        shift: m.shift_key(),
        ctrl: m.control_key(),
        alt: m.alt_key(),
        meta: m.super_key(),
    }
}

fn map_mouse_button(b: WinitMouseButton) -> MouseButton {
    match b {
        WinitMouseButton::Left => MouseButton::Left,
        WinitMouseButton::Right => MouseButton::Right,
        WinitMouseButton::Middle => MouseButton::Middle,
        WinitMouseButton::Back => MouseButton::Back,
        WinitMouseButton::Forward => MouseButton::Forward,
        WinitMouseButton::Other(v) => MouseButton::Other(v),
    }
}

fn map_key(logical: &LogicalKey, physical: PhysicalKey) -> Key {
    match logical {
        LogicalKey::Named(NamedKey::Escape) => Key::Escape,
        LogicalKey::Named(NamedKey::Enter) => Key::Enter,
        LogicalKey::Named(NamedKey::Space) => Key::Space,
        LogicalKey::Character(s) => match s.chars().next() {
            Some(c) => Key::Character(c.to_ascii_lowercase()),
            None => Key::Unknown(0),
        },
        _ => match physical {
            PhysicalKey::Code(code) => Key::Unknown(code as u32),
            // NativeKeyCode has no stable numeric.
            PhysicalKey::Unidentified(_) => Key::Unknown(0),
        },
    }
}
