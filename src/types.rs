#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn letter() -> Self {
        // 8.5in x 11in at 72pt/in.
        Self {
            width: 612.0,
            height: 792.0,
        }
    }

    pub fn is_positive(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A `viewBox` rectangle in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    /// Parses the four comma/whitespace separated numbers of a `viewBox`.
    ///
    /// Each value goes through the lenient numeric prefix parse, so trailing
    /// garbage is ignored and missing values read as zero.
    pub fn parse(input: &str) -> Option<Self> {
        let values: Vec<f64> = split_comma_wsp(input)
            .map(crate::units::leading_number)
            .collect();
        if values.is_empty() {
            return None;
        }
        let at = |i: usize| values.get(i).copied().unwrap_or(0.0);
        Some(Self {
            min_x: at(0),
            min_y: at(1),
            width: at(2),
            height: at(3),
        })
    }

    pub fn has_positive_size(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Splits on SVG's comma-whitespace separator.
pub(crate) fn split_comma_wsp(input: &str) -> impl Iterator<Item = &str> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
}
