use crate::cascade::{ElementStyles, StyleDeclaration, Stylesheet, parse_inline_style};
use crate::debug::{DebugLogger, Field};
use crate::element::ElementKind;
use crate::error::{Result, SvgError};
use crate::font_family::parse_font_family;
use crate::sizing::DocumentSizing;
use crate::stroke::{DashArray, parse_dash_array};
use crate::transform::transform_attribute;
use crate::units::PixelContext;
use crate::viewport::ViewportPlacement;
use roxmltree::{Document, Node, NodeId};
use std::collections::HashMap;

/// A parsed SVG with its sizing, stylesheet and element index resolved.
///
/// Produced by [`crate::SvgGeometry::prepare`]. Lookups take a [`Node`] or
/// [`NodeId`] from [`SvgDocument::document`].
#[derive(Debug)]
pub struct SvgDocument<'input> {
    pub(crate) doc: Document<'input>,
    pub(crate) sizing: DocumentSizing,
    pub(crate) font_size: f64,
    pub(crate) stylesheet: Stylesheet,
    pub(crate) element_styles: ElementStyles,
    pub(crate) ids: HashMap<String, NodeId>,
    pub(crate) kinds: HashMap<NodeId, ElementKind>,
    pub(crate) warnings: Vec<String>,
    pub(crate) debug: Option<DebugLogger>,
}

impl<'input> SvgDocument<'input> {
    pub fn document(&self) -> &Document<'input> {
        &self.doc
    }

    pub fn root(&self) -> Node<'_, 'input> {
        self.doc.root_element()
    }

    pub fn sizing(&self) -> &DocumentSizing {
        &self.sizing
    }

    /// Like [`SvgDocument::sizing`], but fails when the document has no
    /// drawable area.
    pub fn require_valid_sizing(&self) -> Result<&DocumentSizing> {
        if self.sizing.is_invalid() {
            return Err(SvgError::InvalidSizing {
                width: self.sizing.output_width,
                height: self.sizing.output_height,
            });
        }
        Ok(&self.sizing)
    }

    /// Length resolution against the outermost viewport.
    pub fn pixel_context(&self) -> PixelContext {
        PixelContext::for_document(&self.sizing, self.font_size)
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn element_styles(&self) -> &ElementStyles {
        &self.element_styles
    }

    /// First element carrying `id` (surrounding whitespace ignored).
    pub fn element_by_id(&self, id: &str) -> Option<Node<'_, 'input>> {
        let node_id = *self.ids.get(id.trim())?;
        self.doc.get_node(node_id)
    }

    pub fn element_kind(&self, node: NodeId) -> ElementKind {
        self.kinds
            .get(&node)
            .copied()
            .unwrap_or(ElementKind::Unknown)
    }

    /// Stylesheet declarations followed by the element's `style` attribute.
    pub fn computed_declarations(&self, node: NodeId) -> Vec<StyleDeclaration> {
        let mut declarations = self.element_styles.get(node).to_vec();
        if let Some(style) = self.doc.get_node(node).and_then(|n| n.attribute("style")) {
            declarations.extend(parse_inline_style(style));
        }
        declarations
    }

    /// Cascaded value of one property: the last `!important` declaration,
    /// else the last declaration, else the presentation attribute.
    pub fn property(&self, node: NodeId, name: &str) -> Option<String> {
        let declarations = self.computed_declarations(node);
        let named: Vec<&StyleDeclaration> =
            declarations.iter().filter(|d| d.name == name).collect();
        let chosen = named.iter().rev().find(|d| d.important).or(named.last());
        if let Some(decl) = chosen {
            return Some(decl.value.clone());
        }
        self.doc
            .get_node(node)?
            .attribute(name)
            .map(str::to_string)
    }

    /// The element's `transform` as a matrix; `None` when absent or identity.
    pub fn element_transform(&mut self, node: NodeId) -> Option<[f64; 6]> {
        let ctx = self.pixel_context();
        let value = self.doc.get_node(node)?.attribute("transform");
        let before = self.warnings.len();
        let matrix = transform_attribute(value, &ctx, &mut self.warnings);
        self.record_warnings(before);
        matrix
    }

    /// Resolved `stroke-dasharray`; [`DashArray::Inherit`] when unset.
    pub fn dash_array(&mut self, node: NodeId) -> DashArray {
        let Some(value) = self.property(node, "stroke-dasharray") else {
            return DashArray::Inherit;
        };
        let ctx = self.pixel_context();
        let before = self.warnings.len();
        let dashes = parse_dash_array(&value, &ctx, &mut self.warnings);
        self.record_warnings(before);
        dashes
    }

    pub fn font_families(&self, node: NodeId) -> Vec<String> {
        self.property(node, "font-family")
            .map(|value| parse_font_family(&value))
            .unwrap_or_default()
    }

    /// Placement of a nested `<svg>`; `None` for the root or other elements.
    pub fn viewport_placement(&self, node: NodeId) -> Option<ViewportPlacement> {
        let element = self.doc.get_node(node)?;
        if element == self.root() || self.element_kind(node) != ElementKind::Svg {
            return None;
        }
        let parent = self.enclosing_viewport(element)?;
        let ctx = PixelContext::new(&parent, &self.sizing, self.font_size);
        Some(ViewportPlacement::for_element(element, &parent, &ctx))
    }

    fn enclosing_viewport(&self, element: Node<'_, 'input>) -> Option<DocumentSizing> {
        let ancestor = element
            .ancestors()
            .skip(1)
            .find(|n| n.is_element() && self.element_kind(n.id()) == ElementKind::Svg)?;
        if ancestor == self.root() {
            return Some(self.sizing.clone());
        }
        self.viewport_placement(ancestor.id())
            .map(|placement| placement.sizing)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn push_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        let before = self.warnings.len();
        self.warnings.push(message);
        self.record_warnings(before);
    }

    fn record_warnings(&self, from: usize) {
        let Some(debug) = &self.debug else {
            return;
        };
        if from >= self.warnings.len() {
            return;
        }
        for message in &self.warnings[from..] {
            debug.event("svg.warning", &[("message", Field::Str(message))]);
        }
        debug.increment("svg.warnings", (self.warnings.len() - from) as u64);
    }
}
