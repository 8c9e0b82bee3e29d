/// Element types, resolved once per element when a document is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Svg,
    Group,
    Symbol,
    Defs,
    Anchor,
    Switch,
    ClipPath,
    Text,
    Line,
    Polyline,
    Polygon,
    Circle,
    Ellipse,
    Rect,
    Path,
    Use,
    Image,
    LinearGradient,
    RadialGradient,
    Marker,
    /// Pre-parsed into the stylesheet.
    Style,
    /// Metadata and features that produce no drawing (`title`, `desc`,
    /// `metadata`, `foreignObject`, `font-face`, `filter`).
    Ignored,
    Unknown,
}

/// How a renderer treats an element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRole {
    /// Establishes a new viewport.
    Viewport,
    Container,
    Shape,
    Text,
    Reference,
    PaintServer,
    Skip,
}

impl ElementKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "svg" => ElementKind::Svg,
            "g" => ElementKind::Group,
            "symbol" => ElementKind::Symbol,
            "defs" => ElementKind::Defs,
            "a" => ElementKind::Anchor,
            "switch" => ElementKind::Switch,
            "clipPath" => ElementKind::ClipPath,
            "text" => ElementKind::Text,
            "line" => ElementKind::Line,
            "polyline" => ElementKind::Polyline,
            "polygon" => ElementKind::Polygon,
            "circle" => ElementKind::Circle,
            "ellipse" => ElementKind::Ellipse,
            "rect" => ElementKind::Rect,
            "path" => ElementKind::Path,
            "use" => ElementKind::Use,
            "image" => ElementKind::Image,
            "linearGradient" => ElementKind::LinearGradient,
            "radialGradient" => ElementKind::RadialGradient,
            "marker" => ElementKind::Marker,
            "style" => ElementKind::Style,
            "title" | "desc" | "metadata" | "foreignObject" | "font-face" | "filter" => {
                ElementKind::Ignored
            }
            _ => ElementKind::Unknown,
        }
    }

    pub fn role(self) -> ElementRole {
        match self {
            ElementKind::Svg => ElementRole::Viewport,
            ElementKind::Group
            | ElementKind::Symbol
            | ElementKind::Defs
            | ElementKind::Anchor
            | ElementKind::Switch
            | ElementKind::ClipPath
            | ElementKind::Marker => ElementRole::Container,
            ElementKind::Line
            | ElementKind::Polyline
            | ElementKind::Polygon
            | ElementKind::Circle
            | ElementKind::Ellipse
            | ElementKind::Rect
            | ElementKind::Path => ElementRole::Shape,
            ElementKind::Text => ElementRole::Text,
            ElementKind::Use | ElementKind::Image => ElementRole::Reference,
            ElementKind::LinearGradient | ElementKind::RadialGradient => ElementRole::PaintServer,
            ElementKind::Style | ElementKind::Ignored | ElementKind::Unknown => ElementRole::Skip,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self.role(), ElementRole::Viewport | ElementRole::Container)
    }
}
