//! Elliptical arcs as cubic Bézier curves.
//!
//! Follows L. Maisonobe, "Drawing an elliptical arc using polylines,
//! quadratic or cubic Bézier curves" (spaceroots.org, 2003). Each sub-arc
//! spans at most 90 degrees of the parametric angle.

use crate::types::Point;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

const MAX_SUBDIVISIONS: u32 = 1024;
const FLOAT_ERROR_DELTA: f64 = 1e-10;

/// One cubic segment; the start point is the previous segment's `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierSegment {
    pub end: Point,
    pub control1: Point,
    pub control2: Point,
}

/// Result of converting a path `A` command.
#[derive(Debug, Clone, PartialEq)]
pub enum ArcPath {
    /// Start and end coincide; the segment draws nothing.
    Omitted,
    /// A zero radius degrades the arc to a straight line to this point.
    Line(Point),
    Curves(Vec<BezierSegment>),
}

struct Ellipse {
    cx: f64,
    cy: f64,
    a: f64,
    b: f64,
    cos_theta: f64,
    sin_theta: f64,
}

impl Ellipse {
    fn point(&self, eta: f64) -> Point {
        let (s, c) = (libm::sin(eta), libm::cos(eta));
        Point::new(
            self.cx + self.a * self.cos_theta * c - self.b * self.sin_theta * s,
            self.cy + self.a * self.sin_theta * c + self.b * self.cos_theta * s,
        )
    }

    fn derivative(&self, eta: f64) -> Point {
        let (s, c) = (libm::sin(eta), libm::cos(eta));
        Point::new(
            -self.a * self.cos_theta * s - self.b * self.sin_theta * c,
            -self.a * self.sin_theta * s + self.b * self.cos_theta * c,
        )
    }
}

/// Approximates the arc of the ellipse centred on `(cx, cy)` with radii `a`
/// and `b`, rotated by `theta` radians, from parametric angle `lambda1` to
/// `lambda2`.
pub fn arc_to_bezier(
    cx: f64,
    cy: f64,
    a: f64,
    b: f64,
    lambda1: f64,
    lambda2: f64,
    theta: f64,
) -> Vec<BezierSegment> {
    let ellipse = Ellipse {
        cx,
        cy,
        a,
        b,
        cos_theta: libm::cos(theta),
        sin_theta: libm::sin(theta),
    };

    let mut iterations = 1u32;
    let mut d_lambda = lambda2 - lambda1;
    while iterations < MAX_SUBDIVISIONS && d_lambda.abs() > FRAC_PI_2 {
        iterations *= 2;
        d_lambda = (lambda2 - lambda1) / f64::from(iterations);
    }

    (0..iterations)
        .map(|i| {
            let start = lambda1 + f64::from(i) * d_lambda;
            let (eta1, eta2) = eta_from_lambda(a, b, start, start + d_lambda);
            let d_eta = eta2 - eta1;
            let tan_half = libm::tan(d_eta / 2.0);
            let alpha = libm::sin(d_eta) * ((libm::sqrt(4.0 + 3.0 * tan_half * tan_half) - 1.0) / 3.0);

            if log::log_enabled!(log::Level::Trace) {
                log::trace!(
                    "arc segment {i}: estimated error {}",
                    approximation_error(a, b, eta1, eta2)
                );
            }

            let p1 = ellipse.point(eta1);
            let p2 = ellipse.point(eta2);
            let d1 = ellipse.derivative(eta1);
            let d2 = ellipse.derivative(eta2);
            BezierSegment {
                end: p2,
                control1: Point::new(p1.x + alpha * d1.x, p1.y + alpha * d1.y),
                control2: Point::new(p2.x - alpha * d2.x, p2.y - alpha * d2.y),
            }
        })
        .collect()
}

// Keeps eta1 <= eta2 <= eta1 + 2π.
fn eta_from_lambda(a: f64, b: f64, lambda1: f64, lambda2: f64) -> (f64, f64) {
    let eta1 = libm::atan2(libm::sin(lambda1) / b, libm::cos(lambda1) / a);
    let mut eta2 = libm::atan2(libm::sin(lambda2) / b, libm::cos(lambda2) / a);
    eta2 -= TAU * libm::floor((eta2 - eta1) / TAU);
    if lambda2 - lambda1 > PI && eta2 - eta1 < PI {
        eta2 += TAU;
    }
    (eta1, eta2)
}

// Rational approximation coefficients for b/a < 0.25 ...
const ERROR_COEFFICIENTS_A: [[[f64; 4]; 4]; 2] = [
    [
        [3.85268, -21.229, -0.330434, 0.0127842],
        [-1.61486, 0.706564, 0.225945, 0.263682],
        [-0.910164, 0.388383, 0.00551445, 0.00671814],
        [-0.630184, 0.192402, 0.0098871, 0.0102527],
    ],
    [
        [-0.162211, 9.94329, 0.13723, 0.0124084],
        [-0.253135, 0.00187735, 0.0230286, 0.01264],
        [-0.0695069, -0.0437594, 0.0120636, 0.0163087],
        [-0.0328856, -0.00926032, -0.00173573, 0.00527385],
    ],
];

// ... and for b/a >= 0.25.
const ERROR_COEFFICIENTS_B: [[[f64; 4]; 4]; 2] = [
    [
        [0.0899116, -19.2349, -4.11711, 0.183362],
        [0.138148, -1.45804, 1.32044, 1.38474],
        [0.230903, -0.450262, 0.219963, 0.414038],
        [0.0590565, -0.101062, 0.0430592, 0.0204699],
    ],
    [
        [0.0164649, 9.89394, 0.0919496, 0.00760802],
        [0.0191603, -0.0322058, 0.0134667, -0.0825018],
        [0.0156192, -0.017535, 0.00326508, -0.228157],
        [-0.0236752, 0.0405821, -0.0173086, 0.176187],
    ],
];

/// Upper bound estimate of the distance between the cubic approximation and
/// the true arc between eccentric angles `eta1` and `eta2`.
///
/// Only used for diagnostics; subdivision is fixed at 90 degrees.
pub fn approximation_error(a: f64, b: f64, eta1: f64, eta2: f64) -> f64 {
    let ratio = b / a;
    let table = if ratio < 0.25 {
        &ERROR_COEFFICIENTS_A
    } else {
        &ERROR_COEFFICIENTS_B
    };

    let c = |i: usize| -> f64 {
        table[i]
            .iter()
            .enumerate()
            .map(|(j, coef)| {
                ((coef[0] * ratio * ratio + coef[1] * ratio + coef[2]) / (ratio + coef[3]))
                    * libm::cos(j as f64 * (eta1 + eta2))
            })
            .sum()
    };

    ((0.001 * ratio * ratio + 4.98 * ratio + 0.207) / (ratio + 0.0067))
        * a
        * libm::exp(c(0) + c(1) * (eta2 - eta1))
}

/// Converts a path arc from endpoint to centre parameterisation
/// (SVG 1.1 F.6.5) and approximates it with cubic curves.
///
/// `phi_degrees` is the x-axis rotation. Radii are made absolute and scaled
/// up when too small to span the endpoints (F.6.6).
pub fn endpoint_arc_to_bezier(
    from: Point,
    rx: f64,
    ry: f64,
    phi_degrees: f64,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> ArcPath {
    let (x1, y1, x2, y2) = (from.x, from.y, to.x, to.y);
    let mut rx = rx.abs();
    let mut ry = ry.abs();
    let phi = phi_degrees.rem_euclid(360.0).to_radians();

    if within_float_delta(x1, x2) && within_float_delta(y1, y2) {
        return ArcPath::Omitted;
    }
    if within_float_delta(rx, 0.0) || within_float_delta(ry, 0.0) {
        return ArcPath::Line(to);
    }

    let (sin_phi, cos_phi) = (libm::sin(phi), libm::cos(phi));

    // F.6.5.1
    let xp1 = cos_phi * ((x1 - x2) / 2.0) + sin_phi * ((y1 - y2) / 2.0);
    let yp1 = -sin_phi * ((x1 - x2) / 2.0) + cos_phi * ((y1 - y2) / 2.0);

    // F.6.6.2
    let hat = xp1 * xp1 / (rx * rx) + yp1 * yp1 / (ry * ry);
    if hat > 1.0 {
        rx *= libm::sqrt(hat);
        ry *= libm::sqrt(hat);
    }

    // F.6.5.2
    let r2x = rx * rx;
    let r2y = ry * ry;
    let square = (r2x * r2y - r2x * yp1 * yp1 - r2y * xp1 * xp1) / (r2x * yp1 * yp1 + r2y * xp1 * xp1);
    let mut base = libm::sqrt(square.max(0.0));
    if large_arc == sweep {
        base = -base;
    }
    let cpx = base * rx * yp1 / ry;
    let cpy = base * -ry * xp1 / rx;

    // F.6.5.3
    let cx = cos_phi * cpx - sin_phi * cpy + (x1 + x2) / 2.0;
    let cy = sin_phi * cpx + cos_phi * cpy + (y1 + y2) / 2.0;

    // F.6.5.5
    let ux = (xp1 - cpx) / rx;
    let uy = (yp1 - cpy) / ry;
    let mut theta1 = libm::acos((ux / libm::hypot(ux, uy)).clamp(-1.0, 1.0));
    if uy < 0.0 {
        theta1 = -theta1;
    }

    // F.6.5.6
    let vx = (-xp1 - cpx) / rx;
    let vy = (-yp1 - cpy) / ry;
    let cosine = (ux * vx + uy * vy) / (libm::hypot(ux, uy) * libm::hypot(vx, vy));
    let mut d_theta = libm::acos(cosine.clamp(-1.0, 1.0)).rem_euclid(TAU);
    if ux * vy - uy * vx < 0.0 {
        d_theta = -d_theta;
    }
    if !sweep && d_theta > 0.0 {
        d_theta -= TAU;
    } else if sweep && d_theta < 0.0 {
        d_theta += TAU;
    }

    ArcPath::Curves(arc_to_bezier(cx, cy, rx, ry, theta1, theta1 + d_theta, phi))
}

fn within_float_delta(a: f64, b: f64) -> bool {
    (a - b).abs() < FLOAT_ERROR_DELTA
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    const EPS: f64 = 1e-9;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS
    }

    fn on_ellipse(p: Point, cx: f64, cy: f64, a: f64, b: f64, theta: f64) -> bool {
        let (dx, dy) = (p.x - cx, p.y - cy);
        let x = dx * theta.cos() + dy * theta.sin();
        let y = -dx * theta.sin() + dy * theta.cos();
        ((x / a).powi(2) + (y / b).powi(2) - 1.0).abs() < 1e-9
    }

    #[test]
    fn quarter_circle_is_one_segment() {
        let segments = arc_to_bezier(0.0, 0.0, 1.0, 1.0, 0.0, FRAC_PI_2, 0.0);
        assert_eq!(segments.len(), 1);
        let alpha = (7f64.sqrt() - 1.0) / 3.0;
        let s = segments[0];
        assert!(close(s.end, Point::new(0.0, 1.0)));
        assert!(close(s.control1, Point::new(1.0, alpha)));
        assert!(close(s.control2, Point::new(alpha, 1.0)));
    }

    #[test]
    fn arcs_up_to_ninety_degrees_are_not_subdivided() {
        for sweep in [0.1, 0.5, 1.0, FRAC_PI_2, -FRAC_PI_2] {
            assert_eq!(arc_to_bezier(3.0, 4.0, 5.0, 2.0, 0.3, 0.3 + sweep, 0.2).len(), 1);
        }
    }

    #[test]
    fn full_ellipse_uses_a_power_of_two_of_at_least_four() {
        let segments = arc_to_bezier(10.0, 20.0, 8.0, 3.0, 0.0, TAU, 0.4);
        assert_eq!(segments.len(), 4);
        let n = arc_to_bezier(0.0, 0.0, 1.0, 1.0, 0.0, 5.0 * TAU, 0.0).len();
        assert!(n >= 4 && n.is_power_of_two());
    }

    #[test]
    fn segment_ends_lie_on_the_ellipse() {
        let (cx, cy, a, b, theta) = (10.0, 20.0, 8.0, 3.0, 0.4);
        for segment in arc_to_bezier(cx, cy, a, b, 0.2, 4.0, theta) {
            assert!(on_ellipse(segment.end, cx, cy, a, b, theta));
        }
    }

    #[test]
    fn error_estimate_is_positive_for_both_tables() {
        for (a, b) in [(10.0, 1.0), (10.0, 5.0)] {
            let err = approximation_error(a, b, 0.0, FRAC_PI_2);
            assert!(err.is_finite() && err > 0.0, "{a} {b} -> {err}");
            assert!(err < a, "{a} {b} -> {err}");
            assert!(approximation_error(a, b, 0.0, FRAC_PI_4) < err);
        }
    }

    #[test]
    fn endpoint_semicircle_ends_at_the_target() {
        let ArcPath::Curves(segments) = endpoint_arc_to_bezier(
            Point::new(0.0, 0.0),
            1.0,
            1.0,
            0.0,
            false,
            true,
            Point::new(2.0, 0.0),
        ) else {
            panic!("expected curves");
        };
        assert_eq!(segments.len(), 2);
        let last = segments.last().expect("segment");
        assert!(close(last.end, Point::new(2.0, 0.0)));
        for segment in &segments {
            assert!(on_ellipse(segment.end, 1.0, 0.0, 1.0, 1.0, 0.0));
        }
    }

    #[test]
    fn small_radii_are_scaled_up_to_reach_the_endpoint() {
        let ArcPath::Curves(segments) = endpoint_arc_to_bezier(
            Point::new(0.0, 0.0),
            0.5,
            0.5,
            0.0,
            false,
            true,
            Point::new(4.0, 0.0),
        ) else {
            panic!("expected curves");
        };
        let last = segments.last().expect("segment");
        assert!(close(last.end, Point::new(4.0, 0.0)));
    }

    #[test]
    fn degenerate_endpoint_arcs() {
        let p = Point::new(3.0, 3.0);
        assert_eq!(
            endpoint_arc_to_bezier(p, 5.0, 5.0, 0.0, false, false, p),
            ArcPath::Omitted
        );
        let to = Point::new(6.0, 1.0);
        assert_eq!(
            endpoint_arc_to_bezier(p, 0.0, 5.0, 0.0, false, false, to),
            ArcPath::Line(to)
        );
    }
}
