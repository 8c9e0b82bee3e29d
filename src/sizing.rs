use crate::aspect_ratio::AspectRatioSpec;
use crate::types::{Size, ViewBox};
use crate::units::Length;

/// Scale factors and offsets mapping an SVG's user space onto its output box.
///
/// Inputs are the declared `width`/`height`, `viewBox` and
/// `preserveAspectRatio` attributes plus optional caller overrides; the
/// result fields are filled in by [`DocumentSizing::calculate`]. The bounds
/// are the container the document is placed into and serve as the default
/// output size and as the reference for percentage dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSizing {
    pub bounds: Size,
    pub document_width: Option<Length>,
    pub document_height: Option<Length>,
    pub view_box: Option<ViewBox>,
    pub preserve_aspect_ratio: AspectRatioSpec,
    pub requested_width: Option<f64>,
    pub requested_height: Option<f64>,

    pub x_offset: f64,
    pub y_offset: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub output_width: f64,
    pub output_height: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Reference length for non-directional percentages (SVG 1.1 §7.10).
    /// Only set when the sizing is valid.
    pub viewport_diagonal: Option<f64>,
    invalid: bool,
}

impl DocumentSizing {
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            document_width: None,
            document_height: None,
            view_box: None,
            preserve_aspect_ratio: AspectRatioSpec::default(),
            requested_width: None,
            requested_height: None,
            x_offset: 0.0,
            y_offset: 0.0,
            x_scale: 1.0,
            y_scale: 1.0,
            output_width: 0.0,
            output_height: 0.0,
            viewport_width: 0.0,
            viewport_height: 0.0,
            viewport_diagonal: None,
            invalid: true,
        }
    }

    /// Reads `width`, `height`, `viewBox` and `preserveAspectRatio` from an
    /// `<svg>` element.
    pub fn from_element(bounds: Size, node: roxmltree::Node<'_, '_>) -> Self {
        let mut sizing = Self::new(bounds);
        sizing.set_from_attributes(
            node.attribute("width"),
            node.attribute("height"),
            node.attribute("viewBox"),
            node.attribute("preserveAspectRatio"),
        );
        sizing
    }

    pub fn set_from_attributes(
        &mut self,
        width: Option<&str>,
        height: Option<&str>,
        view_box: Option<&str>,
        preserve_aspect_ratio: Option<&str>,
    ) {
        self.document_width = width.map(Length::parse);
        self.document_height = height.map(Length::parse);
        self.view_box = view_box.and_then(ViewBox::parse);
        self.preserve_aspect_ratio =
            AspectRatioSpec::parse(preserve_aspect_ratio.unwrap_or(AspectRatioSpec::DEFAULT));
    }

    /// Derives every result field from the inputs.
    ///
    /// Returns `None` when the result is unusable: a non-positive output or
    /// viewport dimension, or a non-positive requested dimension. In that case
    /// no requested-size rescale is attempted and the caller must not render
    /// the viewport.
    pub fn calculate(&mut self) -> Option<&Self> {
        self.x_offset = 0.0;
        self.y_offset = 0.0;
        self.x_scale = 1.0;
        self.y_scale = 1.0;
        self.viewport_diagonal = None;

        let container_width = self.requested_width.unwrap_or(self.bounds.width);
        let container_height = self.requested_height.unwrap_or(self.bounds.height);

        let mut output_width = self
            .document_width
            .or(self.requested_width.map(Length::number))
            .map(|len| len.to_pixels(Some(container_width), crate::units::DEFAULT_FONT_SIZE));
        let mut output_height = self
            .document_height
            .or(self.requested_height.map(Length::number))
            .map(|len| len.to_pixels(Some(container_height), crate::units::DEFAULT_FONT_SIZE));

        if let Some(view_box) = self.view_box {
            self.x_offset = view_box.min_x;
            self.y_offset = view_box.min_y;
            self.viewport_width = view_box.width;
            self.viewport_height = view_box.height;

            if view_box.has_positive_size() {
                let (w, h) = match (output_width, output_height) {
                    (Some(w), Some(h)) => (w, h),
                    (Some(w), None) => (w, w * view_box.height / view_box.width),
                    (None, Some(h)) => (h * view_box.width / view_box.height, h),
                    // Neither dimension given: use the whole width and let
                    // the view box ratio pick the height.
                    (None, None) => (
                        container_width,
                        container_width * view_box.height / view_box.width,
                    ),
                };
                output_width = Some(w);
                output_height = Some(h);

                let aspect = self.preserve_aspect_ratio.resolve(
                    Size::new(w, h),
                    Size::new(view_box.width, view_box.height),
                );
                self.x_scale = aspect.width / view_box.width;
                self.y_scale = aspect.height / view_box.height;
                self.x_offset -= aspect.x / self.x_scale;
                self.y_offset -= aspect.y / self.y_scale;
            }
        } else {
            let w = output_width.unwrap_or(container_width);
            let h = output_height.unwrap_or(container_height);
            output_width = Some(w);
            output_height = Some(h);
            self.viewport_width = w;
            self.viewport_height = h;
        }

        self.output_width = output_width.unwrap_or(0.0);
        self.output_height = output_height.unwrap_or(0.0);

        self.invalid = self.check_invalid();
        if self.invalid {
            log::debug!(
                "svg sizing invalid: output {}x{}, viewport {}x{}",
                self.output_width,
                self.output_height,
                self.viewport_width,
                self.viewport_height
            );
            return None;
        }

        self.viewport_diagonal = Some(
            libm::sqrt(
                self.viewport_width * self.viewport_width
                    + self.viewport_height * self.viewport_height,
            ) / libm::sqrt(2.0),
        );

        if let Some(requested_width) = self.requested_width {
            let scale = requested_width / self.output_width;
            self.output_width = requested_width;
            self.output_height *= scale;
            self.x_scale *= scale;
            self.y_scale *= scale;
        } else if let Some(requested_height) = self.requested_height {
            let scale = requested_height / self.output_height;
            self.output_height = requested_height;
            self.output_width *= scale;
            self.x_scale *= scale;
            self.y_scale *= scale;
        }

        log::debug!(
            "svg sizing: output {}x{}, scale {}x{}, offset {},{}",
            self.output_width,
            self.output_height,
            self.x_scale,
            self.y_scale,
            self.x_offset,
            self.y_offset
        );
        Some(self)
    }

    fn check_invalid(&self) -> bool {
        let not_positive = |v: f64| !(v > 0.0) || !v.is_finite();
        not_positive(self.viewport_width)
            || not_positive(self.viewport_height)
            || not_positive(self.output_width)
            || not_positive(self.output_height)
            || self.requested_width.is_some_and(not_positive)
            || self.requested_height.is_some_and(not_positive)
    }

    /// True until a `calculate` call succeeds.
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    pub fn output_size(&self) -> Size {
        Size::new(self.output_width, self.output_height)
    }

    pub fn viewport_size(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing() -> DocumentSizing {
        let mut sizing = DocumentSizing::new(Size::new(1200.0, 800.0));
        sizing.set_from_attributes(
            Some("150"),
            Some("200"),
            Some("0 -30 300 800"),
            Some("xMaxYMid meet"),
        );
        sizing
    }

    fn bare(view_box: Option<&str>) -> DocumentSizing {
        let mut sizing = DocumentSizing::new(Size::new(1200.0, 800.0));
        sizing.set_from_attributes(None, None, view_box, None);
        sizing
    }

    #[test]
    fn calculates_scale_and_offsets_from_view_box() {
        let mut sizing = sizing();
        assert!(sizing.calculate().is_some());
        assert_eq!(sizing.x_offset, -75.0 / 0.25);
        assert_eq!(sizing.y_offset, -30.0);
        assert_eq!(sizing.x_scale, 0.25);
        assert_eq!(sizing.y_scale, 0.25);
        assert_eq!(sizing.viewport_width, 300.0);
        assert_eq!(sizing.viewport_height, 800.0);
        assert_eq!(sizing.output_width, 150.0);
        assert_eq!(sizing.output_height, 200.0);
        assert!(!sizing.is_invalid());
    }

    #[test]
    fn rescales_to_requested_width() {
        let mut sizing = sizing();
        sizing.requested_width = Some(75.0);
        sizing.calculate();
        assert_eq!(sizing.x_scale, 0.125);
        assert_eq!(sizing.y_scale, 0.125);
        assert_eq!(sizing.viewport_width, 300.0);
        assert_eq!(sizing.output_width, 75.0);
        assert_eq!(sizing.output_height, 100.0);
    }

    #[test]
    fn rescales_to_requested_height() {
        let mut sizing = sizing();
        sizing.requested_height = Some(100.0);
        sizing.calculate();
        assert_eq!(sizing.x_scale, 0.125);
        assert_eq!(sizing.y_scale, 0.125);
        assert_eq!(sizing.viewport_height, 800.0);
        assert_eq!(sizing.output_width, 75.0);
        assert_eq!(sizing.output_height, 100.0);
    }

    #[test]
    fn percentage_dimensions_use_the_bounds() {
        let mut sizing = sizing();
        sizing.document_width = Some(Length::parse("50%"));
        sizing.document_height = Some(Length::parse("50%"));
        sizing.calculate();
        assert_eq!(sizing.output_width, 600.0);
        assert_eq!(sizing.output_height, 400.0);
    }

    #[test]
    fn view_box_without_dimensions_fills_the_width() {
        let mut sizing = bare(Some("0 0 100 200"));
        sizing.calculate();
        assert_eq!(sizing.viewport_width, 100.0);
        assert_eq!(sizing.viewport_height, 200.0);
        assert_eq!(sizing.output_width, 1200.0);
        assert_eq!(sizing.output_height, 2400.0);
    }

    #[test]
    fn requested_dimensions_without_view_box() {
        let mut sizing = bare(None);
        sizing.requested_width = Some(550.0);
        sizing.requested_height = Some(400.0);
        sizing.calculate();
        assert_eq!(sizing.viewport_width, 550.0);
        assert_eq!(sizing.viewport_height, 400.0);
        assert_eq!(sizing.output_width, 550.0);
        assert_eq!(sizing.output_height, 400.0);
    }

    #[test]
    fn requested_dimensions_with_view_box() {
        let mut sizing = bare(Some("0 0 100 200"));
        sizing.requested_width = Some(550.0);
        sizing.requested_height = Some(400.0);
        sizing.calculate();
        assert_eq!(sizing.viewport_width, 100.0);
        assert_eq!(sizing.viewport_height, 200.0);
        assert_eq!(sizing.output_width, 550.0);
        assert_eq!(sizing.output_height, 400.0);
    }

    #[test]
    fn one_requested_dimension_back_fills_from_view_box_ratio() {
        let mut by_width = bare(Some("0 0 100 200"));
        by_width.requested_width = Some(550.0);
        by_width.calculate();
        assert_eq!(by_width.output_width, 550.0);
        assert_eq!(by_width.output_height, 1100.0);

        let mut by_height = bare(Some("0 0 100 200"));
        by_height.requested_height = Some(400.0);
        by_height.calculate();
        assert_eq!(by_height.output_width, 200.0);
        assert_eq!(by_height.output_height, 400.0);
    }

    #[test]
    fn defaults_to_the_bounds() {
        let mut sizing = bare(None);
        sizing.calculate();
        assert_eq!(sizing.output_width, 1200.0);
        assert_eq!(sizing.output_height, 800.0);
        let diagonal = sizing.viewport_diagonal.expect("diagonal");
        let expected = (1200.0f64 * 1200.0 + 800.0 * 800.0).sqrt() / 2.0f64.sqrt();
        assert!((diagonal - expected).abs() < 1e-9);
    }

    #[test]
    fn non_positive_dimensions_are_invalid() {
        let mut zero_width = sizing();
        zero_width.document_width = Some(Length::number(0.0));
        assert!(zero_width.calculate().is_none());
        assert!(zero_width.is_invalid());
        assert!(zero_width.viewport_diagonal.is_none());

        let mut empty_view_box = bare(Some("0 0 0 100"));
        assert!(empty_view_box.calculate().is_none());

        let mut negative_request = bare(None);
        negative_request.requested_width = Some(-5.0);
        assert!(negative_request.calculate().is_none());
        assert!(negative_request.output_width.is_finite());
    }

    #[test]
    fn invalid_input_never_reports_nan_as_valid() {
        let mut sizing = bare(Some("0 0 100 200"));
        sizing.document_height = Some(Length::parse("0"));
        sizing.document_width = Some(Length::parse("0"));
        assert!(sizing.calculate().is_none());
        assert!(sizing.is_invalid());
    }
}
