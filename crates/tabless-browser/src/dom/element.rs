use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::canvas::CanvasElement;
use crate::decode::DecodedImage;

/// Tags accepted as generic containers.
pub const SUPPORTED_CONTAINERS: &[&str] = &[
    "a", "body", "button", "code", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "head",
    "header", "html", "label", "li", "main", "nav", "p", "pre", "script", "section", "span",
    "style", "ul",
];

/// Handle of an element in its [`Document`](super::Document).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An `img` element.
///
/// Each `src` assignment bumps `generation`; a load that finishes for an
/// older generation is discarded.
#[derive(Debug, Default)]
pub struct ImageElement {
    pub(crate) src: Option<String>,
    pub(crate) generation: u64,
    pub(crate) decoded: Option<Rc<DecodedImage>>,
    pub(crate) failed: bool,
}

impl ImageElement {
    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `HTMLImageElement.complete`: no load is outstanding.
    pub fn complete(&self) -> bool {
        self.src.is_none() || self.decoded.is_some() || self.failed
    }

    pub fn natural_width(&self) -> u32 {
        self.decoded.as_ref().map_or(0, |d| d.width)
    }

    pub fn natural_height(&self) -> u32 {
        self.decoded.as_ref().map_or(0, |d| d.height)
    }

    pub fn decoded(&self) -> Option<&Rc<DecodedImage>> {
        self.decoded.as_ref()
    }

    /// Starts a new load; returns its generation.
    pub(crate) fn begin_load(&mut self, src: String) -> u64 {
        self.src = Some(src);
        self.generation += 1;
        self.decoded = None;
        self.failed = false;
        self.generation
    }
}

#[derive(Debug)]
pub enum ElementKind {
    Container,
    Canvas(CanvasElement),
    Image(ImageElement),
}

/// One node of the synthetic document.
#[derive(Debug)]
pub struct Element {
    pub(crate) tag: String,
    pub(crate) id: Option<String>,
    pub(crate) kind: ElementKind,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) style: BTreeMap<String, String>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

impl Element {
    pub(crate) fn new(tag: String, kind: ElementKind) -> Self {
        Self {
            tag,
            id: None,
            kind,
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Lowercase tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn set_style(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.style.insert(property.into(), value.into());
    }

    /// Accepted and discarded; the host renders no markup.
    pub fn set_inner_html(&mut self, _html: &str) {}

    /// Accepted and discarded; the host renders no text.
    pub fn set_inner_text(&mut self, _text: &str) {}

    pub fn as_canvas(&self) -> Option<&CanvasElement> {
        match &self.kind {
            ElementKind::Canvas(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_canvas_mut(&mut self) -> Option<&mut CanvasElement> {
        match &mut self.kind {
            ElementKind::Canvas(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageElement> {
        match &self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageElement> {
        match &mut self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }
}
