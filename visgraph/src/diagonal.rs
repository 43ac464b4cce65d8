//! Tangents between obstacles, and the diagonals they bound.
//!
//! A sweep around one obstacle P looks at two tangents per other obstacle Q: a low
//! one and a high one, which are met in that order as the sweep ray turns. Between
//! them, the chord joining their endpoints on Q (the diagonal) is a candidate
//! occluder for everything behind it.

use std::cmp::Ordering;

use crate::{
    geom::Point,
    rb_tree::NodeId,
    tolerance::{GeometryTolerance, Orientation},
};

/// Indexes a tangent within one sweep.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct TangentIdx(pub(crate) usize);

impl std::fmt::Debug for TangentIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t_{}", self.0)
    }
}

/// Indexes a diagonal within one sweep.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct DiagonalIdx(pub(crate) usize);

impl std::fmt::Debug for DiagonalIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d_{}", self.0)
    }
}

/// A segment from a vertex of the swept obstacle to a vertex of another one.
#[derive(Clone, Debug)]
pub(crate) struct Tangent {
    pub start: Point,
    pub end: Point,
    /// Low tangents open their diagonal, high ones close it.
    pub is_low: bool,
    /// Does this tangent pass between the two obstacles?
    pub separating_polygons: bool,
    /// The other tangent of the same pair of obstacles.
    pub comp: TangentIdx,
    /// Set while this tangent's diagonal is active.
    pub diagonal: Option<DiagonalIdx>,
}

impl Tangent {
    pub fn is_high(&self) -> bool {
        !self.is_low
    }

    pub fn direction(&self) -> Point {
        self.end - self.start
    }
}

/// The chord between the far endpoints of a low and a high tangent.
#[derive(Clone, Debug)]
pub(crate) struct Diagonal {
    pub low: TangentIdx,
    pub high: TangentIdx,
    pub start: Point,
    pub end: Point,
    /// Where this diagonal lives in the active tree, if it's there.
    pub node: Option<NodeId>,
}

impl Diagonal {
    pub fn new(low: TangentIdx, high: TangentIdx, start: Point, end: Point) -> Self {
        Diagonal {
            low,
            high,
            start,
            end,
            node: None,
        }
    }
}

/// Does the ray from `pivot` through `point_on_ray` cross the chord `[start, end]`?
///
/// Only chords that the ray meets going from their start side to their end side
/// (counterclockwise, as seen from the pivot) count.
pub(crate) fn ray_intersects_diagonal(
    tol: &GeometryTolerance,
    pivot: Point,
    point_on_ray: Point,
    start: Point,
    end: Point,
) -> bool {
    tol.orientation(pivot, start, end) == Orientation::Counterclockwise
        && tol.orientation(pivot, point_on_ray, start) != Orientation::Counterclockwise
        && tol.orientation(pivot, point_on_ray, end) != Orientation::Clockwise
}

/// Where the line through `pivot` and `point_on_ray` meets the chord `[start, end]`.
///
/// The ray must cross the chord; the result is clamped to the chord.
pub(crate) fn intersect_diagonal_with_ray(
    tol: &GeometryTolerance,
    pivot: Point,
    point_on_ray: Point,
    start: Point,
    end: Point,
) -> Point {
    let ray = point_on_ray - pivot;
    let chord = end - start;
    let denom = ray.cross(chord);
    if denom == 0.0 {
        return start;
    }
    let t = (start - pivot).cross(ray) / denom;
    debug_assert!(
        t >= -tol.intersection_epsilon && t <= 1.0 + tol.intersection_epsilon,
        "ray misses the chord (t = {t})"
    );
    start + chord * t.clamp(0.0, 1.0)
}

/// Orders an item lying on the current sweep ray at `x` against an active chord.
///
/// The item comes first if `x` is strictly on the near side of the chord. There is
/// no `Equal`: ties go after the existing chord.
pub(crate) fn compare_with_chord(
    tol: &GeometryTolerance,
    x: Point,
    start: Point,
    end: Point,
) -> Ordering {
    if tol.orientation(x, start, end) == Orientation::Counterclockwise {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn ray_crossings() {
        let tol = GeometryTolerance::default();
        let pivot = p(0.0, 0.0);
        // A vertical chord to the right, running upwards.
        let (s, e) = (p(2.0, -1.0), p(2.0, 1.0));
        assert!(ray_intersects_diagonal(&tol, pivot, p(1.0, 0.0), s, e));
        // The ray through the chord's start still counts.
        assert!(ray_intersects_diagonal(&tol, pivot, p(2.0, -1.0), s, e));
        assert!(!ray_intersects_diagonal(&tol, pivot, p(1.0, 1.0), s, e));
        assert!(!ray_intersects_diagonal(&tol, pivot, p(-1.0, 0.0), s, e));
        // Running downwards, the chord is met clockwise.
        assert!(!ray_intersects_diagonal(&tol, pivot, p(1.0, 0.0), e, s));
    }

    #[test]
    fn ray_intersection_point() {
        let tol = GeometryTolerance::default();
        let x = intersect_diagonal_with_ray(
            &tol,
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, -1.0),
            p(2.0, 1.0),
        );
        assert_eq!(x, p(2.0, 0.0));

        let x = intersect_diagonal_with_ray(
            &tol,
            p(1.0, 1.0),
            p(2.0, 2.0),
            p(4.0, 0.0),
            p(0.0, 4.0),
        );
        assert_eq!(x, p(2.0, 2.0));
    }

    #[test]
    fn chord_order() {
        let tol = GeometryTolerance::default();
        let (s, e) = (p(2.0, -1.0), p(2.0, 1.0));
        assert_eq!(compare_with_chord(&tol, p(1.0, 0.0), s, e), Ordering::Less);
        assert_eq!(compare_with_chord(&tol, p(3.0, 0.0), s, e), Ordering::Greater);
        assert_eq!(compare_with_chord(&tol, p(2.0, 0.0), s, e), Ordering::Greater);
    }
}
