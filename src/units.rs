use crate::sizing::DocumentSizing;
use std::fmt;

/// Font size used for `em`/`ex` when nothing else is known (CSS `medium`).
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

const POINTS_PER_INCH: f64 = 72.0;
const POINTS_PER_CM: f64 = 72.0 / 2.54;
const POINTS_PER_MM: f64 = 72.0 / 25.4;
// SVG 1.1 coords.html: 1pc = 15px.
const PIXELS_PER_PICA: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    None,
    Px,
    Pt,
    Em,
    Ex,
    In,
    Cm,
    Mm,
    Pc,
    Percent,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::None => "",
            LengthUnit::Px => "px",
            LengthUnit::Pt => "pt",
            LengthUnit::Em => "em",
            LengthUnit::Ex => "ex",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Pc => "pc",
            LengthUnit::Percent => "%",
        }
    }
}

/// A parsed length: numeric coefficient plus unit tag.
///
/// Parsing never fails. The coefficient is the leading numeric prefix of the
/// input and anything the unit detection does not recognise is ignored, which
/// keeps real-world malformed attributes renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    pub fn number(value: f64) -> Self {
        Self {
            value,
            unit: LengthUnit::None,
        }
    }

    pub fn parse(input: &str) -> Self {
        let value = leading_number(input);
        Self {
            value,
            unit: detect_unit(input),
        }
    }

    /// Resolves to points. `axis_length` is the reference for `%`; a
    /// percentage without one resolves to zero.
    pub fn to_pixels(self, axis_length: Option<f64>, font_size: f64) -> f64 {
        let v = self.value;
        match self.unit {
            LengthUnit::None | LengthUnit::Px | LengthUnit::Pt => v,
            LengthUnit::Em => v * font_size,
            // No x-height metrics are available; CSS allows half an em.
            LengthUnit::Ex => v * (font_size / 2.0),
            LengthUnit::Pc => v * PIXELS_PER_PICA,
            LengthUnit::In => v * POINTS_PER_INCH,
            LengthUnit::Cm => v * POINTS_PER_CM,
            LengthUnit::Mm => v * POINTS_PER_MM,
            LengthUnit::Percent => match axis_length {
                Some(axis) => v * axis / 100.0,
                None => {
                    log::debug!("percentage length {v}% resolved without an axis length");
                    0.0
                }
            },
        }
    }
}

impl From<f64> for Length {
    fn from(value: f64) -> Self {
        Length::number(value)
    }
}

impl From<&str> for Length {
    fn from(value: &str) -> Self {
        Length::parse(value)
    }
}

impl From<&String> for Length {
    fn from(value: &String) -> Self {
        Length::parse(value)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Free-function form of [`Length::to_pixels`].
pub fn to_pixels(value: impl Into<Length>, axis_length: Option<f64>, font_size: f64) -> f64 {
    value.into().to_pixels(axis_length, font_size)
}

fn detect_unit(input: &str) -> LengthUnit {
    let s = input.trim_end_matches(['\n', '\r']);
    let bytes = s.as_bytes();
    if bytes.len() >= 3 && bytes[bytes.len() - 3].is_ascii_digit() {
        let unit = match &s[s.len() - 2..] {
            "em" => Some(LengthUnit::Em),
            "ex" => Some(LengthUnit::Ex),
            "pc" => Some(LengthUnit::Pc),
            "cm" => Some(LengthUnit::Cm),
            "mm" => Some(LengthUnit::Mm),
            "in" => Some(LengthUnit::In),
            "px" => Some(LengthUnit::Px),
            "pt" => Some(LengthUnit::Pt),
            _ => None,
        };
        if let Some(unit) = unit {
            return unit;
        }
    }
    if s.ends_with('%') {
        return LengthUnit::Percent;
    }
    LengthUnit::None
}

/// Parses the longest numeric prefix of `input`, ignoring leading
/// whitespace. Returns `0.0` when there is no number at all.
pub fn leading_number(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0usize;
    if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut has_digits = i > int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start {
            has_digits = true;
            i = j;
        }
    }
    if !has_digits {
        return 0.0;
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < bytes.len() && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    s[..i].parse::<f64>().unwrap_or(0.0)
}

/// Length resolution bound to the current viewport and font size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelContext {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub viewport_diagonal: f64,
    /// Output height of the outermost document; `y` flips against it.
    pub document_height: f64,
    pub font_size: f64,
}

impl PixelContext {
    pub fn new(viewport: &DocumentSizing, document: &DocumentSizing, font_size: f64) -> Self {
        Self {
            viewport_width: viewport.viewport_width,
            viewport_height: viewport.viewport_height,
            viewport_diagonal: viewport.viewport_diagonal.unwrap_or(0.0),
            document_height: document.output_height,
            font_size,
        }
    }

    /// Context for the outermost document, which is its own viewport.
    pub fn for_document(sizing: &DocumentSizing, font_size: f64) -> Self {
        Self::new(sizing, sizing, font_size)
    }

    pub fn with_viewport(self, viewport: &DocumentSizing) -> Self {
        Self {
            viewport_width: viewport.viewport_width,
            viewport_height: viewport.viewport_height,
            viewport_diagonal: viewport.viewport_diagonal.unwrap_or(0.0),
            ..self
        }
    }

    pub fn with_font_size(self, font_size: f64) -> Self {
        Self { font_size, ..self }
    }

    /// Non-directional length; percentages refer to the viewport diagonal.
    pub fn pixels(&self, value: impl Into<Length>) -> f64 {
        value
            .into()
            .to_pixels(Some(self.viewport_diagonal), self.font_size)
    }

    pub fn x_pixels(&self, value: impl Into<Length>) -> f64 {
        value
            .into()
            .to_pixels(Some(self.viewport_width), self.font_size)
    }

    pub fn y_pixels(&self, value: impl Into<Length>) -> f64 {
        value
            .into()
            .to_pixels(Some(self.viewport_height), self.font_size)
    }

    pub fn x(&self, value: impl Into<Length>) -> f64 {
        self.x_pixels(value)
    }

    /// Converts to the y-up target space.
    pub fn y(&self, value: impl Into<Length>) -> f64 {
        self.document_height - self.y_pixels(value)
    }
}
