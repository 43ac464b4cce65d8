//! Tolerance-aware geometric predicates.
//!
//! Every geometric decision in this crate goes through a [`GeometryTolerance`]. There
//! are no global epsilons: each calculator is handed the tolerance it should use.

use std::f64::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

use crate::geom::{signed_doubled_triangle_area, Point};

/// Which way a triangle turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// The triangle turns left.
    Counterclockwise,
    /// The triangle turns right.
    Clockwise,
    /// The triangle's area is within the distance epsilon of zero.
    Collinear,
}

/// The tolerances used by geometric predicates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryTolerance {
    /// Below this, distances (and doubled triangle areas) count as zero.
    pub distance_epsilon: f64,
    /// Slack for angle snapping, projections, and angular ordering of vectors.
    pub tolerance: f64,
    /// Parameter slack when intersecting a ray with a chord.
    pub intersection_epsilon: f64,
}

impl Default for GeometryTolerance {
    fn default() -> Self {
        GeometryTolerance {
            distance_epsilon: 1e-6,
            tolerance: 1e-8,
            intersection_epsilon: 1e-4,
        }
    }
}

impl GeometryTolerance {
    /// The square of the distance epsilon.
    pub fn square_of_distance_epsilon(&self) -> f64 {
        self.distance_epsilon * self.distance_epsilon
    }

    /// Are `a` and `b` within the distance epsilon of one another?
    pub fn close(&self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.distance_epsilon
    }

    /// Are the two points close in both coordinates?
    pub fn close_points(&self, a: Point, b: Point) -> bool {
        self.close(a.x, b.x) && self.close(a.y, b.y)
    }

    /// Classifies the turn `a -> b -> c`.
    pub fn orientation(&self, a: Point, b: Point, c: Point) -> Orientation {
        let area = signed_doubled_triangle_area(a, b, c);
        if area > self.distance_epsilon {
            Orientation::Counterclockwise
        } else if area < -self.distance_epsilon {
            Orientation::Clockwise
        } else {
            Orientation::Collinear
        }
    }

    /// The counterclockwise angle in `[0, 2π)` from the vector `side0` to `side1`.
    ///
    /// Angles within the tolerance of a multiple of π/2 are snapped to it.
    pub fn angle_between(&self, side0: Point, side1: Point) -> f64 {
        let cos = side0.dot(side1);
        let sin = side0.cross(side1);
        let tol = self.tolerance;

        if cos.abs() < tol {
            if sin.abs() < tol {
                return 0.0;
            }
            return if sin < -tol { 3.0 * FRAC_PI_2 } else { FRAC_PI_2 };
        }
        if sin.abs() < tol {
            return if cos < -tol { PI } else { 0.0 };
        }

        let angle = sin.atan2(cos);
        if sin < -tol {
            angle + 2.0 * PI
        } else {
            angle
        }
    }

    /// The counterclockwise angle at `center` from `a` to `c`.
    pub fn angle(&self, a: Point, center: Point, c: Point) -> f64 {
        self.angle_between(a - center, c - center)
    }

    /// Does the perpendicular from `p` land on the segment `[start, end]`?
    pub fn can_project(&self, p: Point, start: Point, end: Point) -> bool {
        let dir = end - start;
        (p - start).dot(dir) >= 0.0 && (p - end).dot(dir) <= 0.0
    }

    /// The point of the segment `[start, end]` closest to `p`.
    pub fn closest_point_on_segment(&self, p: Point, start: Point, end: Point) -> Point {
        let dir = end - start;
        let along = (p - start).dot(dir);
        if along <= self.tolerance {
            return start;
        }
        let len_sq = dir.dot(dir);
        if len_sq <= along + self.tolerance {
            return end;
        }
        start + dir * (along / len_sq)
    }

    /// The distance from `p` to the segment `[start, end]`.
    pub fn distance_to_segment(&self, p: Point, start: Point, end: Point) -> f64 {
        (p - self.closest_point_on_segment(p, start, end)).length()
    }

    /// Is `p` to the left of the line through `l0` and `l1`, or on it?
    ///
    /// This is an exact test.
    pub fn left_of_line_or_on_line(&self, p: Point, l0: Point, l1: Point) -> bool {
        signed_doubled_triangle_area(p, l0, l1) >= 0.0
    }

    /// Is `p` to the right of the line through `l0` and `l1`, or on it?
    ///
    /// This is an exact test.
    pub fn right_of_line_or_on_line(&self, p: Point, l0: Point, l1: Point) -> bool {
        signed_doubled_triangle_area(l0, l1, p) <= 0.0
    }
}

/// The closest points between the segments `[p0, p1]` and `[q0, q1]`, as parameters.
///
/// Returns `(s, t)` such that `p0 + s (p1 - p0)` and `q0 + t (q1 - q0)` are closest.
/// Both parameters are in `[0, 1]`, and a parameter that is clamped to an end of its
/// segment is exactly `0.0` or `1.0`.
pub fn closest_parameters_between_segments(
    p0: Point,
    p1: Point,
    q0: Point,
    q1: Point,
) -> (f64, f64) {
    let u = p1 - p0;
    let v = q1 - q0;
    let w = p0 - q0;
    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w);
    let e = v.dot(w);
    let denom = a * c - b * b;

    let (mut s_num, mut s_denom, mut t_num, t_denom) = if denom <= f64::EPSILON * a * c {
        // Parallel (or degenerate) segments: pin the first one at its start.
        (0.0, 1.0, e, c)
    } else {
        let s_num = b * e - c * d;
        if s_num <= 0.0 {
            (0.0, denom, e, c)
        } else if s_num >= denom {
            (denom, denom, e + b, c)
        } else {
            (s_num, denom, a * e - b * d, denom)
        }
    };

    if t_num <= 0.0 {
        t_num = 0.0;
        s_num = clamp_ratio(-d, a, &mut s_denom);
    } else if t_num >= t_denom {
        t_num = t_denom;
        s_num = clamp_ratio(b - d, a, &mut s_denom);
    }

    let s = ratio(s_num, s_denom);
    let t = ratio(t_num, t_denom);
    (s, t)
}

// Clamps `num / denom` to [0, 1] by adjusting the numerator, replacing the
// denominator by `denom`.
fn clamp_ratio(num: f64, denom: f64, out_denom: &mut f64) -> f64 {
    *out_denom = denom;
    if num <= 0.0 {
        0.0
    } else if num >= denom {
        denom
    } else {
        num
    }
}

fn ratio(num: f64, denom: f64) -> f64 {
    if num == 0.0 || denom == 0.0 {
        0.0
    } else if num == denom {
        1.0
    } else {
        (num / denom).clamp(0.0, 1.0)
    }
}
