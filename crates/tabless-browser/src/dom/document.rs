use std::collections::HashMap;

use crate::canvas::CanvasElement;
use crate::error::{HostError, Result};

use super::element::{Element, ElementId, ElementKind, ImageElement, SUPPORTED_CONTAINERS};

/// The process-wide document.
///
/// Elements live in an arena and are never freed; demo pages create a handful
/// of nodes at startup and keep them.
#[derive(Debug)]
pub struct Document {
    elements: Vec<Element>,
    by_id: HashMap<String, ElementId>,
    html: ElementId,
    head: ElementId,
    body: ElementId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document with `html`, `head` and `body` in place.
    pub fn new() -> Self {
        let mut doc = Self {
            elements: Vec::new(),
            by_id: HashMap::new(),
            html: ElementId(0),
            head: ElementId(0),
            body: ElementId(0),
        };
        doc.html = doc.insert(Element::new("html".into(), ElementKind::Container));
        doc.head = doc.insert(Element::new("head".into(), ElementKind::Container));
        doc.body = doc.insert(Element::new("body".into(), ElementKind::Container));
        let (html, head, body) = (doc.html, doc.head, doc.body);
        doc.attach(html, head);
        doc.attach(html, body);
        doc
    }

    pub fn document_element(&self) -> ElementId {
        self.html
    }

    pub fn head(&self) -> ElementId {
        self.head
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Number of elements ever created.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// `document.createElement(tag)`.
    pub fn create_element(&mut self, tag: &str) -> Result<ElementId> {
        let tag = tag.to_ascii_lowercase();
        let kind = match tag.as_str() {
            "canvas" => ElementKind::Canvas(CanvasElement::default()),
            "img" => ElementKind::Image(ImageElement::default()),
            t if SUPPORTED_CONTAINERS.contains(&t) => ElementKind::Container,
            _ => return Err(HostError::UnsupportedElement(tag)),
        };
        let id = self.insert(Element::new(tag, kind));
        log::trace!("created element {id}");
        Ok(id)
    }

    /// `document.createElementNS(ns, tag)`; the namespace is not modelled.
    pub fn create_element_ns(&mut self, namespace: &str, tag: &str) -> Result<ElementId> {
        log::trace!("createElementNS({namespace:?}, {tag:?})");
        self.create_element(tag)
    }

    /// `document.getElementById(id)`.
    ///
    /// Unknown ids get an empty `div` placeholder registered under that id, so
    /// repeated lookups return the same element.
    pub fn get_element_by_id(&mut self, id: &str) -> ElementId {
        if let Some(found) = self.by_id.get(id) {
            return *found;
        }
        let placeholder = self.insert(Element::new("div".into(), ElementKind::Container));
        self.elements[placeholder.0 as usize].id = Some(id.to_string());
        self.by_id.insert(id.to_string(), placeholder);
        log::debug!("getElementById({id:?}) created placeholder {placeholder}");
        placeholder
    }

    /// Looks up an id without creating a placeholder.
    pub fn find_element_by_id(&self, id: &str) -> Option<ElementId> {
        self.by_id.get(id).copied()
    }

    pub fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements
            .get(id.0 as usize)
            .ok_or(HostError::NoSuchElement(id))
    }

    pub fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements
            .get_mut(id.0 as usize)
            .ok_or(HostError::NoSuchElement(id))
    }

    /// Sets the element's `id`, keeping the id index in sync.
    pub fn set_element_id(&mut self, element: ElementId, id: &str) -> Result<()> {
        let el = self.element_mut(element)?;
        let old = el.id.replace(id.to_string());
        if let Some(old) = old {
            if self.by_id.get(&old) == Some(&element) {
                self.by_id.remove(&old);
            }
        }
        self.by_id.insert(id.to_string(), element);
        Ok(())
    }

    /// `element.setAttribute(name, value)`.
    ///
    /// `id` goes through the id index. `width`/`height` on a canvas resize it,
    /// as the matching properties do.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        if name == "id" {
            self.set_element_id(element, value)?;
        }

        let el = self.element_mut(element)?;
        if let (Some(canvas), "width" | "height") = (el.as_canvas_mut(), name.as_str()) {
            if let Ok(v) = value.trim().parse::<u32>() {
                let (w, h) = canvas.size();
                match name.as_str() {
                    "width" => canvas.set_size(v, h),
                    _ => canvas.set_size(w, v),
                }
            }
        }
        el.attributes.insert(name, value.to_string());
        Ok(())
    }

    /// `parent.appendChild(child)`; moves the child if it already has a parent.
    ///
    /// Fails with [`HostError::HierarchyRequest`] when `child` is `parent` or
    /// one of its ancestors.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.element(child)?;
        let mut node = Some(parent);
        while let Some(id) = node {
            if id == child {
                return Err(HostError::HierarchyRequest { parent, child });
            }
            node = self.element(id)?.parent;
        }
        if let Some(old) = self.element(child)?.parent {
            self.detach(old, child);
        }
        self.attach(parent, child);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        if self.element(child)?.parent != Some(parent) {
            return Err(HostError::NoSuchElement(child));
        }
        self.detach(parent, child);
        Ok(())
    }

    pub fn canvas(&self, id: ElementId) -> Result<&CanvasElement> {
        self.element(id)?
            .as_canvas()
            .ok_or(HostError::WrongElementKind(id, "a canvas"))
    }

    pub fn canvas_mut(&mut self, id: ElementId) -> Result<&mut CanvasElement> {
        self.element_mut(id)?
            .as_canvas_mut()
            .ok_or(HostError::WrongElementKind(id, "a canvas"))
    }

    pub fn image(&self, id: ElementId) -> Result<&ImageElement> {
        self.element(id)?
            .as_image()
            .ok_or(HostError::WrongElementKind(id, "an image"))
    }

    pub fn image_mut(&mut self, id: ElementId) -> Result<&mut ImageElement> {
        self.element_mut(id)?
            .as_image_mut()
            .ok_or(HostError::WrongElementKind(id, "an image"))
    }

    fn insert(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.elements.push(element);
        id
    }

    fn attach(&mut self, parent: ElementId, child: ElementId) {
        self.elements[child.0 as usize].parent = Some(parent);
        self.elements[parent.0 as usize].children.push(child);
    }

    fn detach(&mut self, parent: ElementId, child: ElementId) {
        self.elements[parent.0 as usize].children.retain(|c| *c != child);
        self.elements[child.0 as usize].parent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::MAX_CANVAS_DIMENSION;

    #[test]
    fn creates_supported_tags_case_insensitively() {
        let mut doc = Document::new();
        let canvas = doc.create_element("CANVAS").unwrap();
        let img = doc.create_element("img").unwrap();
        let div = doc.create_element("div").unwrap();
        assert!(doc.element(canvas).unwrap().as_canvas().is_some());
        assert!(doc.element(img).unwrap().as_image().is_some());
        assert_eq!(doc.element(div).unwrap().tag(), "div");
    }

    #[test]
    fn unsupported_tag_is_rejected() {
        let mut doc = Document::new();
        let err = doc.create_element("video").unwrap_err();
        assert!(matches!(err, HostError::UnsupportedElement(t) if t == "video"));
    }

    #[test]
    fn namespace_variant_ignores_namespace() {
        let mut doc = Document::new();
        let canvas = doc
            .create_element_ns("http://www.w3.org/1999/xhtml", "canvas")
            .unwrap();
        assert!(doc.canvas(canvas).is_ok());
    }

    #[test]
    fn missing_id_yields_stable_placeholder() {
        let mut doc = Document::new();
        let a = doc.get_element_by_id("info");
        let b = doc.get_element_by_id("info");
        assert_eq!(a, b);
        let el = doc.element(a).unwrap();
        assert_eq!(el.tag(), "div");
        assert_eq!(el.id(), Some("info"));
        assert!(el.children().is_empty());
    }

    #[test]
    fn set_attribute_id_is_found_by_lookup() {
        let mut doc = Document::new();
        let canvas = doc.create_element("canvas").unwrap();
        doc.set_attribute(canvas, "id", "view").unwrap();
        assert_eq!(doc.get_element_by_id("view"), canvas);
        assert_eq!(doc.element(canvas).unwrap().get_attribute("id"), Some("view"));
    }

    #[test]
    fn canvas_size_attributes_resize() {
        let mut doc = Document::new();
        let canvas = doc.create_element("canvas").unwrap();
        assert_eq!(doc.canvas(canvas).unwrap().size(), (300, 150));
        doc.set_attribute(canvas, "width", "640").unwrap();
        doc.set_attribute(canvas, "height", "480").unwrap();
        assert_eq!(doc.canvas(canvas).unwrap().size(), (640, 480));
    }

    #[test]
    fn append_child_moves_between_parents() {
        let mut doc = Document::new();
        let a = doc.create_element("div").unwrap();
        let child = doc.create_element("span").unwrap();
        doc.append_child(a, child).unwrap();
        doc.append_child(doc.body(), child).unwrap();
        assert!(doc.element(a).unwrap().children().is_empty());
        assert_eq!(doc.element(child).unwrap().parent(), Some(doc.body()));
    }

    #[test]
    fn inner_html_is_accepted_and_ignored() {
        let mut doc = Document::new();
        let div = doc.create_element("div").unwrap();
        let el = doc.element_mut(div).unwrap();
        el.set_inner_html("<b>fps</b>");
        el.set_inner_text("fps: 60");
        assert!(el.children().is_empty());
    }

    #[test]
    fn append_child_rejects_cycles() {
        let mut doc = Document::new();
        let outer = doc.create_element("div").unwrap();
        let inner = doc.create_element("div").unwrap();
        doc.append_child(doc.body(), outer).unwrap();
        doc.append_child(outer, inner).unwrap();

        let err = doc.append_child(inner, outer).unwrap_err();
        assert!(matches!(
            err,
            HostError::HierarchyRequest { parent, child } if parent == inner && child == outer
        ));
        assert!(matches!(
            doc.append_child(inner, inner),
            Err(HostError::HierarchyRequest { .. })
        ));
        let html = doc.document_element();
        assert!(doc.append_child(inner, html).is_err());

        assert_eq!(doc.element(outer).unwrap().parent(), Some(doc.body()));
        assert_eq!(doc.element(inner).unwrap().parent(), Some(outer));
    }

    #[test]
    fn huge_size_attribute_is_clamped() {
        let mut doc = Document::new();
        let canvas = doc.create_element("canvas").unwrap();
        doc.set_attribute(canvas, "width", "1000000").unwrap();
        assert_eq!(doc.canvas(canvas).unwrap().size(), (MAX_CANVAS_DIMENSION, 150));
        assert_eq!(doc.element(canvas).unwrap().get_attribute("width"), Some("1000000"));
    }
}
