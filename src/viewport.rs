use crate::sizing::DocumentSizing;
use crate::types::Size;
use crate::units::PixelContext;

/// Placement of a nested `<svg>` inside its parent viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportPlacement {
    /// Offset of the viewport's top-left corner in parent user units.
    pub x: f64,
    pub y: f64,
    /// Sizing of the nested viewport, using the parent viewport as bounds.
    pub sizing: DocumentSizing,
}

impl ViewportPlacement {
    /// Resolves `x`, `y`, `width`, `height`, `viewBox` and
    /// `preserveAspectRatio` of a nested `<svg>` against the parent viewport.
    pub fn for_element(
        node: roxmltree::Node<'_, '_>,
        parent: &DocumentSizing,
        parent_ctx: &PixelContext,
    ) -> Self {
        let bounds = Size::new(parent.viewport_width, parent.viewport_height);
        let mut sizing = DocumentSizing::from_element(bounds, node);
        sizing.calculate();

        Self {
            x: parent_ctx.x_pixels(node.attribute("x").unwrap_or("0")),
            y: parent_ctx.y_pixels(node.attribute("y").unwrap_or("0")),
            sizing,
        }
    }

    pub fn is_renderable(&self) -> bool {
        !self.sizing.is_invalid()
    }

    /// Clip rectangle as `[x, y, width, height]`, top-left anchored, in the
    /// space after the placement translation.
    pub fn clip_rect(&self) -> [f64; 4] {
        [0.0, 0.0, self.sizing.output_width, self.sizing.output_height]
    }

    /// Matrices to apply in order: the placement translation (omitted at the
    /// origin), the viewBox scale, then the viewBox offset. The clip rectangle
    /// goes between the first and second.
    pub fn transforms(&self) -> Vec<[f64; 6]> {
        let mut out = Vec::with_capacity(3);
        if self.x != 0.0 || self.y != 0.0 {
            out.push([1.0, 0.0, 0.0, 1.0, self.x, -self.y]);
        }
        out.push([self.sizing.x_scale, 0.0, 0.0, self.sizing.y_scale, 0.0, 0.0]);
        out.push([
            1.0,
            0.0,
            0.0,
            1.0,
            -self.sizing.x_offset,
            self.sizing.y_offset,
        ]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Matrix;

    fn parent() -> DocumentSizing {
        let mut sizing = DocumentSizing::new(Size::new(1000.0, 1000.0));
        sizing.set_from_attributes(Some("400"), Some("300"), Some("0 0 200 150"), None);
        sizing.calculate();
        sizing
    }

    fn placement(svg: &str) -> ViewportPlacement {
        let doc = roxmltree::Document::parse(svg).unwrap();
        let parent = parent();
        let ctx = PixelContext::for_document(&parent, 16.0);
        ViewportPlacement::for_element(doc.root_element(), &parent, &ctx)
    }

    #[test]
    fn nested_viewport_uses_parent_viewport_as_bounds() {
        let placement = placement(
            r#"<svg xmlns="http://www.w3.org/2000/svg" x="10" y="50%" width="50%" height="30" viewBox="0 0 20 10"/>"#,
        );
        assert!(placement.is_renderable());
        assert_eq!(placement.x, 10.0);
        assert_eq!(placement.y, 75.0);
        assert_eq!(placement.sizing.output_width, 100.0);
        assert_eq!(placement.sizing.output_height, 30.0);
        assert_eq!(placement.clip_rect(), [0.0, 0.0, 100.0, 30.0]);

        let transforms = placement.transforms();
        assert_eq!(transforms.len(), 3);
        assert_eq!(transforms[0], [1.0, 0.0, 0.0, 1.0, 10.0, -75.0]);
        assert_eq!(transforms[1][0], placement.sizing.x_scale);
        assert_eq!(transforms[1][3], placement.sizing.y_scale);

        // The 20x10 view box is centred in the 100x30 box at scale 3.
        let combined = transforms
            .iter()
            .fold(Matrix::IDENTITY, |m, t| m.mul(Matrix::from_tuple(*t)));
        let (x, y) = combined.apply(0.0, 0.0);
        assert!((x - 30.0).abs() < 1e-9 && (y + 75.0).abs() < 1e-9, "{x} {y}");
    }

    #[test]
    fn translation_is_omitted_at_origin() {
        let placement =
            placement(r#"<svg xmlns="http://www.w3.org/2000/svg" width="20" height="20"/>"#);
        assert_eq!(
            placement.transforms(),
            vec![
                [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
                [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            ]
        );
    }

    #[test]
    fn zero_size_is_not_renderable() {
        let placement =
            placement(r#"<svg xmlns="http://www.w3.org/2000/svg" width="0" height="20"/>"#);
        assert!(!placement.is_renderable());
    }
}
