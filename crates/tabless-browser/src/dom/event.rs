use std::collections::HashMap;
use std::fmt;

use tabless_engine::input::PointerSample;

use crate::browser::Scope;

use super::ElementId;

/// `WheelEvent.deltaMode` values.
pub const DOM_DELTA_PIXEL: u32 = 0;
pub const DOM_DELTA_LINE: u32 = 1;

/// Where an event is dispatched.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EventTarget {
    Window,
    Element(ElementId),
}

/// Fields shared by `PointerEvent` and `MouseEvent`.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEventData {
    pub client_x: f64,
    pub client_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub movement_x: f64,
    pub movement_y: f64,
    pub button: i16,
    pub buttons: u16,
    pub pointer_id: i32,
    pub pointer_type: &'static str,
    pub is_primary: bool,
    pub shift_key: bool,
    pub ctrl_key: bool,
    pub alt_key: bool,
    pub meta_key: bool,
}

impl From<&PointerSample> for PointerEventData {
    fn from(s: &PointerSample) -> Self {
        // The GPU canvas covers the whole client area, so offsets equal client coords.
        Self {
            client_x: s.x as f64,
            client_y: s.y as f64,
            offset_x: s.x as f64,
            offset_y: s.y as f64,
            movement_x: s.movement_x as f64,
            movement_y: s.movement_y as f64,
            button: s.button,
            buttons: s.buttons,
            pointer_id: 1,
            pointer_type: "mouse",
            is_primary: true,
            shift_key: s.modifiers.shift,
            ctrl_key: s.modifiers.ctrl,
            alt_key: s.modifiers.alt,
            meta_key: s.modifiers.meta,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WheelEventData {
    pub pointer: PointerEventData,
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
    pub delta_mode: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    None,
    Pointer(PointerEventData),
    Wheel(WheelEventData),
    Resize {
        inner_width: f64,
        inner_height: f64,
        device_pixel_ratio: f64,
    },
}

/// A synthetic DOM event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub target: EventTarget,
    pub detail: EventDetail,
    /// Milliseconds since the browser context started.
    pub time_stamp: f64,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: EventTarget, detail: EventDetail) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            detail,
            time_stamp: 0.0,
        }
    }

    pub fn at(mut self, time_stamp: f64) -> Self {
        self.time_stamp = time_stamp;
        self
    }

    /// Pointer fields of pointer, mouse and wheel events.
    pub fn pointer(&self) -> Option<&PointerEventData> {
        match &self.detail {
            EventDetail::Pointer(p) => Some(p),
            EventDetail::Wheel(w) => Some(&w.pointer),
            _ => None,
        }
    }

    pub fn wheel(&self) -> Option<&WheelEventData> {
        match &self.detail {
            EventDetail::Wheel(w) => Some(w),
            _ => None,
        }
    }
}

/// An event handler. Runs with the same scope as animation-frame callbacks;
/// an error is logged and later handlers still run.
pub type Listener<B> =
    Box<dyn for<'a> FnMut(&mut Scope<'a, B>, &Event) -> anyhow::Result<()>>;

/// Handlers of the window and every element, keyed by target and event type.
///
/// Handlers for one key run in registration order.
pub struct Listeners<L> {
    by_key: HashMap<(EventTarget, String), Vec<L>>,
}

impl<L> Default for Listeners<L> {
    fn default() -> Self {
        Self { by_key: HashMap::new() }
    }
}

impl<L> Listeners<L> {
    pub fn add(&mut self, target: EventTarget, event_type: impl Into<String>, listener: L) {
        self.by_key
            .entry((target, event_type.into()))
            .or_default()
            .push(listener);
    }

    pub fn count(&self, target: EventTarget, event_type: &str) -> usize {
        self.by_key
            .get(&(target, event_type.to_string()))
            .map_or(0, Vec::len)
    }

    /// Removes the handlers for one dispatch; hand them back with [`Self::restore`].
    pub(crate) fn take(&mut self, target: EventTarget, event_type: &str) -> Vec<L> {
        self.by_key
            .remove(&(target, event_type.to_string()))
            .unwrap_or_default()
    }

    /// Puts dispatched handlers back, ahead of any registered while they ran.
    pub(crate) fn restore(&mut self, target: EventTarget, event_type: &str, mut handlers: Vec<L>) {
        let key = (target, event_type.to_string());
        if let Some(added) = self.by_key.remove(&key) {
            handlers.extend(added);
        }
        if !handlers.is_empty() {
            self.by_key.insert(key, handlers);
        }
    }
}

impl<L> fmt::Debug for Listeners<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for ((target, ty), handlers) in &self.by_key {
            map.entry(&format_args!("{target:?} {ty}"), &handlers.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn restore_keeps_registration_order() {
        let mut listeners = Listeners::default();
        for n in 0..3 {
            listeners.add(EventTarget::Window, "resize", n);
        }

        let taken = listeners.take(EventTarget::Window, "resize");
        assert_eq!(listeners.count(EventTarget::Window, "resize"), 0);
        listeners.add(EventTarget::Window, "resize", 3);
        listeners.restore(EventTarget::Window, "resize", taken);

        assert_eq!(listeners.take(EventTarget::Window, "resize"), vec![0, 1, 2, 3]);
    }

    #[test]
    fn keys_are_per_target_and_type() {
        let mut listeners = Listeners::default();
        let canvas = EventTarget::Element(ElementId(4));
        listeners.add(canvas, "pointermove", ());
        listeners.add(EventTarget::Window, "pointermove", ());
        listeners.add(canvas, "wheel", ());

        assert_eq!(listeners.count(canvas, "pointermove"), 1);
        assert_eq!(listeners.count(EventTarget::Element(ElementId(5)), "pointermove"), 0);
        assert!(listeners.take(canvas, "click").is_empty());
        listeners.restore(canvas, "click", Vec::new());
        assert_eq!(listeners.count(canvas, "click"), 0);
    }
}
