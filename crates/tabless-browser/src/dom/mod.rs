//! Synthetic DOM.
//!
//! A shallow element arena with the node types graphics code touches:
//! canvases, images and generic containers. Events fire on the target only;
//! there is no capture or bubbling phase.

mod document;
mod element;
mod event;

pub use document::Document;
pub use element::{Element, ElementId, ElementKind, ImageElement, SUPPORTED_CONTAINERS};
pub use event::{
    Event, EventDetail, EventTarget, Listener, Listeners, PointerEventData, WheelEventData,
    DOM_DELTA_LINE, DOM_DELTA_PIXEL,
};
