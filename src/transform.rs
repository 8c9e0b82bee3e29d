use crate::units::{Length, PixelContext};

/// Affine matrix in PDF order: `[a b 0; c d 0; e f 1]`, stored as the six
/// free coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn from_tuple([a, b, c, d, e, f]: [f64; 6]) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn mul(self, other: Self) -> Self {
        // [self] * [other]
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn to_tuple(self) -> [f64; 6] {
        [self.a, self.b, self.c, self.d, self.e, self.f]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// SVG rotates clockwise in y-down space; in the y-up target that is a
// counter-clockwise rotation, so the sine terms swap sides.
fn rotation(degrees: f64) -> Matrix {
    let rad = degrees.to_radians();
    let (s, c) = (libm::sin(rad), libm::cos(rad));
    Matrix {
        a: c,
        b: -s,
        c: s,
        d: c,
        e: 0.0,
        f: 0.0,
    }
}

/// Parses an SVG `transform` list into one matrix in the y-up target space.
///
/// Functions are applied left to right by right-multiplication. Unknown
/// functions and bad arities push a warning and leave the matrix unchanged.
pub fn parse_transform(input: &str, ctx: &PixelContext, warnings: &mut Vec<String>) -> Matrix {
    let mut matrix = Matrix::IDENTITY;

    for (name, args) in method_calls(input) {
        let number = |i: usize| args.get(i).map_or(0.0, |a| crate::units::leading_number(a));
        let length = |i: usize| Length::number(number(i));

        let step = match name {
            "translate" => Matrix::translate(ctx.x_pixels(length(0)), -ctx.y_pixels(length(1))),
            "translateX" => Matrix::translate(ctx.x_pixels(length(0)), 0.0),
            "translateY" => Matrix::translate(0.0, -ctx.y_pixels(length(0))),
            "rotate" => match args.len() {
                1 => rotation(number(0)),
                3 => {
                    let cx = ctx.x_pixels(length(1));
                    let cy = ctx.y_pixels(length(2));
                    Matrix::translate(cx, -cy)
                        .mul(rotation(number(0)))
                        .mul(Matrix::translate(-cx, cy))
                }
                _ => {
                    warn(warnings, "transform 'rotate' must have either one or three arguments".into());
                    continue;
                }
            },
            "scale" => {
                let sx = number(0);
                let sy = if args.len() > 1 { number(1) } else { sx };
                Matrix::scale(sx, sy)
            }
            "skewX" => Matrix {
                c: -libm::tan(number(0).to_radians()),
                ..Matrix::IDENTITY
            },
            "skewY" => Matrix {
                b: -libm::tan(number(0).to_radians()),
                ..Matrix::IDENTITY
            },
            "matrix" => {
                if args.len() != 6 {
                    warn(warnings, "transform 'matrix' must have six arguments".into());
                    continue;
                }
                Matrix {
                    a: number(0),
                    b: -number(1),
                    c: -number(2),
                    d: number(3),
                    e: number(4),
                    f: -number(5),
                }
            }
            other => {
                warn(
                    warnings,
                    format!("Unknown/unsupported transformation '{other}'; ignoring"),
                );
                continue;
            }
        };
        matrix = matrix.mul(step);
    }

    matrix
}

/// Resolves an optional `transform` attribute; `None` when it is absent or
/// reduces to the identity.
pub fn transform_attribute(
    value: Option<&str>,
    ctx: &PixelContext,
    warnings: &mut Vec<String>,
) -> Option<[f64; 6]> {
    let matrix = parse_transform(value?, ctx, warnings);
    (!matrix.is_identity()).then(|| matrix.to_tuple())
}

fn warn(warnings: &mut Vec<String>, message: String) {
    log::warn!("{message}");
    warnings.push(message);
}

/// Scans `name(args)` calls. Names are word characters immediately before
/// the parenthesis and the argument text must be non-empty; anything else
/// between calls is skipped.
fn method_calls(input: &str) -> Vec<(&str, Vec<&str>)> {
    let mut calls = Vec::new();
    let mut rest = input;

    while let Some(open) = rest.find('(') {
        let head = &rest[..open];
        let name_start = head
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .map_or(0, |i| i + 1);
        let name = &head[name_start..];
        let after = &rest[open + 1..];
        let Some(close) = after.find(')') else {
            break;
        };
        let body = &after[..close];
        if !name.is_empty() && !body.is_empty() {
            calls.push((name, split_arguments(body)));
            rest = &after[close + 1..];
        } else {
            rest = after;
        }
    }

    calls
}

/// Splits call arguments. A separator is one comma or one run of
/// whitespace (with any whitespace around a comma), so `30,,5` keeps an
/// empty middle argument. Trailing empty arguments are dropped.
fn split_arguments(body: &str) -> Vec<&str> {
    let mut args = Vec::new();
    let mut rest = body.trim();
    while !rest.is_empty() {
        let Some(i) = rest.find(|c: char| c == ',' || c.is_whitespace()) else {
            args.push(rest);
            break;
        };
        args.push(&rest[..i]);
        let separator = rest[i..].trim_start();
        rest = separator.strip_prefix(',').unwrap_or(separator).trim_start();
    }
    while args.last() == Some(&"") {
        args.pop();
    }
    args
}
