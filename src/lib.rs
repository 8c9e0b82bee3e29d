mod arc;
mod aspect_ratio;
mod cascade;
mod debug;
mod document;
mod element;
mod error;
mod font_family;
mod query;
mod selector;
mod sizing;
mod stroke;
mod transform;
mod types;
mod units;
mod viewport;

pub use arc::{ArcPath, BezierSegment, approximation_error, arc_to_bezier, endpoint_arc_to_bezier};
pub use aspect_ratio::{Alignment, AspectRatio, AspectRatioSpec, AxisAlign, MeetOrSlice};
pub use cascade::{
    ElementStyles, RuleEntry, StyleDeclaration, Stylesheet, parse_inline_style, style_element_text,
};
pub use debug::{DebugLogger, Field};
pub use document::SvgDocument;
pub use element::{ElementKind, ElementRole};
pub use error::{Result, SvgError};
pub use font_family::parse_font_family;
pub use query::{Axis, Position, Predicate, Query, Step};
pub use selector::{
    AttributeOperator, AttributeSelector, Combinator, SelectorPart, Specificity, parse_selector,
    specificity,
};
pub use sizing::DocumentSizing;
pub use stroke::{DashArray, parse_dash_array};
pub use transform::{Matrix, parse_transform, transform_attribute};
pub use types::{Point, Size, ViewBox};
pub use units::{DEFAULT_FONT_SIZE, Length, LengthUnit, PixelContext, leading_number, to_pixels};
pub use viewport::ViewportPlacement;

use roxmltree::{Document, NodeId, ParsingOptions};
use std::collections::HashMap;
use std::path::PathBuf;

/// Prepares SVG documents for drawing: sizing, stylesheet cascade and
/// element index. Configure with [`SvgGeometry::builder`].
#[derive(Debug, Clone)]
pub struct SvgGeometry {
    bounds: Size,
    requested_width: Option<f64>,
    requested_height: Option<f64>,
    font_size: f64,
    debug: Option<DebugLogger>,
}

impl SvgGeometry {
    pub fn builder() -> SvgGeometryBuilder {
        SvgGeometryBuilder::new()
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    /// Parses `svg` and resolves everything a renderer needs before walking
    /// the element tree. Fails only when the markup is not an SVG document;
    /// unusable sizing is reported by [`SvgDocument::require_valid_sizing`].
    pub fn prepare<'input>(&self, svg: &'input str) -> Result<SvgDocument<'input>> {
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };
        let doc = Document::parse_with_options(svg, options)?;
        let root = doc.root_element();
        if root.tag_name().name() != "svg" {
            return Err(SvgError::InvalidSvgData(format!(
                "root element is <{}>, expected <svg>",
                root.tag_name().name()
            )));
        }

        let mut sizing = DocumentSizing::from_element(self.bounds, root);
        sizing.requested_width = self.requested_width;
        sizing.requested_height = self.requested_height;
        sizing.calculate();
        self.log_sizing(&sizing);

        let stylesheet = Stylesheet::from_document(&doc, self.debug.as_ref());
        let element_styles = stylesheet.associate(&doc);

        let mut ids: HashMap<String, NodeId> = HashMap::new();
        let mut kinds: HashMap<NodeId, ElementKind> = HashMap::new();
        for node in doc.descendants().filter(|n| n.is_element()) {
            kinds.insert(node.id(), ElementKind::from_tag(node.tag_name().name()));
            if let Some(id) = node.attribute("id").map(str::trim).filter(|id| !id.is_empty()) {
                ids.entry(id.to_string()).or_insert(node.id());
            }
        }

        self.emit_debug_summary("prepare");

        Ok(SvgDocument {
            doc,
            sizing,
            font_size: self.font_size,
            stylesheet,
            element_styles,
            ids,
            kinds,
            warnings: Vec::new(),
            debug: self.debug.clone(),
        })
    }

    /// [`SvgGeometry::prepare`] over many inputs on the rayon pool. Results
    /// come back in input order.
    pub fn prepare_many_parallel<'input>(
        &self,
        svgs: &[&'input str],
    ) -> Vec<Result<SvgDocument<'input>>> {
        use rayon::prelude::*;

        let mut results: Vec<(usize, Result<SvgDocument<'input>>)> = svgs
            .par_iter()
            .enumerate()
            .map(|(idx, svg)| (idx, self.prepare(*svg)))
            .collect();
        results.sort_by_key(|(idx, _)| *idx);
        results.into_iter().map(|(_, result)| result).collect()
    }

    fn log_sizing(&self, sizing: &DocumentSizing) {
        let Some(logger) = &self.debug else {
            return;
        };
        logger.event(
            "svg.sizing",
            &[
                ("valid", Field::Bool(!sizing.is_invalid())),
                ("output_width", Field::Num(sizing.output_width)),
                ("output_height", Field::Num(sizing.output_height)),
                ("viewport_width", Field::Num(sizing.viewport_width)),
                ("viewport_height", Field::Num(sizing.viewport_height)),
                ("x_scale", Field::Num(sizing.x_scale)),
                ("y_scale", Field::Num(sizing.y_scale)),
                ("x_offset", Field::Num(sizing.x_offset)),
                ("y_offset", Field::Num(sizing.y_offset)),
            ],
        );
    }

    fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = &self.debug {
            logger.emit_summary(context);
            logger.flush();
        }
    }
}

#[derive(Debug, Clone)]
pub struct SvgGeometryBuilder {
    bounds: Size,
    requested_width: Option<f64>,
    requested_height: Option<f64>,
    font_size: f64,
    debug_path: Option<PathBuf>,
}

impl SvgGeometryBuilder {
    pub fn new() -> Self {
        Self {
            bounds: Size::letter(),
            requested_width: None,
            requested_height: None,
            font_size: DEFAULT_FONT_SIZE,
            debug_path: None,
        }
    }

    /// Container the document is placed into. Also the reference for
    /// percentage `width`/`height` on the root element.
    pub fn bounds(mut self, bounds: Size) -> Self {
        self.bounds = bounds;
        self
    }

    /// Forces the output width; the height follows the document's ratio.
    pub fn requested_width(mut self, width: f64) -> Self {
        self.requested_width = Some(width);
        self
    }

    /// Forces the output height. Ignored for scaling when a width is also
    /// requested.
    pub fn requested_height(mut self, height: f64) -> Self {
        self.requested_height = Some(height);
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<SvgGeometry> {
        if !self.bounds.width.is_finite()
            || !self.bounds.height.is_finite()
            || !self.bounds.is_positive()
        {
            return Err(SvgError::InvalidConfiguration(format!(
                "bounds must be positive and finite, got {}x{}",
                self.bounds.width, self.bounds.height
            )));
        }
        for (name, value) in [
            ("requested_width", self.requested_width),
            ("requested_height", self.requested_height),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(SvgError::InvalidConfiguration(format!(
                    "{name} must be finite"
                )));
            }
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(SvgError::InvalidConfiguration(
                "font_size must be > 0".to_string(),
            ));
        }

        let debug = match self.debug_path {
            Some(path) => Some(DebugLogger::new(path)?),
            None => None,
        };

        Ok(SvgGeometry {
            bounds: self.bounds,
            requested_width: self.requested_width,
            requested_height: self.requested_height,
            font_size: self.font_size,
            debug,
        })
    }
}

impl Default for SvgGeometryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
