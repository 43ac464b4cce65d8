use std::f64::consts::{FRAC_PI_2, PI};

use ordered_float::OrderedFloat;

use crate::{
    geom::{Point, Polyline},
    sequence::BimodalSequence,
    tangent_pair::TangentPair,
    tolerance::GeometryTolerance,
};

/// A read-only, cyclically indexed view of a convex, clockwise obstacle boundary.
///
/// Indices passed to a `Polygon` may exceed the number of vertices; they are taken
/// modulo the vertex count.
#[derive(Clone, Debug)]
pub struct Polygon<'a> {
    polyline: &'a Polyline,
    tol: GeometryTolerance,
}

impl<'a> Polygon<'a> {
    /// Views a polyline as a polygon.
    ///
    /// The polyline must be non-empty, convex and clockwise.
    pub fn new(polyline: &'a Polyline, tol: GeometryTolerance) -> Self {
        assert!(!polyline.is_empty());
        Polygon { polyline, tol }
    }

    /// The underlying polyline.
    pub fn polyline(&self) -> &'a Polyline {
        self.polyline
    }

    /// The tolerance this polygon was built with.
    pub fn tolerance(&self) -> GeometryTolerance {
        self.tol
    }

    /// The number of vertices.
    pub fn len(&self) -> usize {
        self.polyline.len()
    }

    /// Always false: polygons have at least one vertex.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Reduces a (possibly negative) index to `0..len`.
    pub fn module(&self, i: isize) -> usize {
        i.rem_euclid(self.len() as isize) as usize
    }

    /// The index after `i`, going clockwise.
    pub fn next(&self, i: usize) -> usize {
        (i + 1) % self.len()
    }

    /// The index before `i`, going clockwise.
    pub fn prev(&self, i: usize) -> usize {
        (i % self.len() + self.len() - 1) % self.len()
    }

    /// The vertex at index `i`.
    pub fn pnt(&self, i: usize) -> Point {
        self.polyline.point(i)
    }

    /// The middle of the clockwise chunk running from `p1` to `p2`.
    pub fn median(&self, p1: usize, p2: usize) -> usize {
        debug_assert_ne!(p1, p2);
        if p2 > p1 {
            (p1 + p2) / 2
        } else {
            ((p1 + p2 + self.len()) / 2) % self.len()
        }
    }

    /// Finds the vertex furthest from the bisector line on this polygon's side.
    ///
    /// The search runs over the clockwise chunk from `p2` to `p1`, which is the part of
    /// the boundary facing away from the other polygon.
    pub fn find_the_furthest_vertex_from_bisector(
        &self,
        mut p1: usize,
        mut p2: usize,
        bisector_pivot: Point,
        bisector_ray: Point,
    ) -> usize {
        let mut direction_to_the_hill = bisector_ray.rotate(FRAC_PI_2);
        if (self.pnt(0) - bisector_pivot).dot(direction_to_the_hill) < 0.0 {
            direction_to_the_hill = -direction_to_the_hill;
        }
        p1 %= self.len();
        p2 %= self.len();
        if p1 == p2 {
            p2 = self.next(p1);
        }
        for _ in 0..2 * self.len() + 2 {
            let m = self.median(p2, p1);
            let mp = self.pnt(m);
            if (self.pnt(self.next(m)) - mp).dot(direction_to_the_hill) >= 0.0 {
                p2 = self.next(m);
            } else if (self.pnt(self.prev(m)) - mp).dot(direction_to_the_hill) >= 0.0 {
                p1 = self.prev(m);
            } else {
                p1 = m;
                p2 = m;
            }
            if p1 == p2 {
                return p1;
            }
        }

        tracing::debug!("bisection for the furthest vertex did not settle, scanning");
        let height =
            |i: usize| OrderedFloat((self.pnt(i) - bisector_pivot).dot(direction_to_the_hill));
        (0..self.len()).max_by_key(|&i| height(i)).unwrap_or(0)
    }

    /// Returns the indices of the left and right tangent points as seen from `point`.
    ///
    /// The left tangent point is the one with the largest turning angle, measured
    /// counterclockwise from the first vertex; the right one has the smallest.
    /// Takes logarithmic time.
    pub fn tangent_points(&self, point: Point) -> (usize, usize) {
        let first = self.pnt(0);
        let tol = self.tol;
        let seq = BimodalSequence::new(
            |i| {
                let d = tol.angle(first, point, self.pnt(i));
                if d < PI {
                    d
                } else {
                    d - 2.0 * PI
                }
            },
            self.len(),
        );
        (seq.find_maximum(), seq.find_minimum())
    }

    /// The distance between two disjoint convex polygons, and the closest points.
    ///
    /// Returns `(distance, point_on_a, point_on_b)`.
    pub fn distance(a: &Polygon<'_>, b: &Polygon<'_>) -> (f64, Point, Point) {
        let (p, q) = TangentPair::new(a, b).find_closest_points();
        ((p - q).length(), p, q)
    }

    /// The distance from `point` to the boundary of this polygon.
    pub fn distance_to_point(&self, point: Point) -> f64 {
        self.polyline
            .sides()
            .map(|(s, e)| self.tol.distance_to_segment(point, s, e))
            .fold(f64::INFINITY, f64::min)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A clockwise regular polygon.
    pub fn regular(center: Point, radius: f64, n: usize, phase: f64) -> Polyline {
        Polyline::new((0..n).map(|i| {
            let angle = phase - 2.0 * PI * i as f64 / n as f64;
            center + Point::new(angle.cos(), angle.sin()) * radius
        }))
    }

    #[test]
    fn modular_indexing() {
        let line = regular(Point::new(0.0, 0.0), 1.0, 5, 0.0);
        let poly = Polygon::new(&line, GeometryTolerance::default());
        assert_eq!(poly.module(-1), 4);
        assert_eq!(poly.module(7), 2);
        assert_eq!(poly.next(4), 0);
        assert_eq!(poly.prev(0), 4);
        assert_eq!(poly.median(1, 3), 2);
        assert_eq!(poly.median(3, 1), 4);
        assert_eq!(poly.median(4, 1), 0);
    }

    #[test]
    fn tangent_points_of_square() {
        // Clockwise unit square.
        let line = Polyline::new([(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let poly = Polygon::new(&line, GeometryTolerance::default());

        // Looking left from the right, the bottom right corner is on our left.
        assert_eq!(poly.tangent_points(Point::new(5.0, 0.5)), (3, 2));
        // Seen from below and to the left.
        assert_eq!(poly.tangent_points(Point::new(-1.0, -2.0)), (1, 3));
    }

    #[test]
    fn tangent_points_are_supporting() {
        let tol = GeometryTolerance::default();
        let line = regular(Point::new(0.0, 0.0), 1.0, 17, 0.3);
        let poly = Polygon::new(&line, tol);
        for k in 0..32 {
            let angle = k as f64 * 0.2;
            let from = Point::new(angle.cos(), angle.sin()) * 3.0;
            let (left, right) = poly.tangent_points(from);
            for i in 0..poly.len() {
                // Everything is to the right of the ray towards the left tangent point,
                // and to the left of the ray towards the right tangent point.
                assert!(
                    crate::geom::signed_doubled_triangle_area(from, poly.pnt(left), poly.pnt(i))
                        <= 1e-12
                );
                assert!(
                    crate::geom::signed_doubled_triangle_area(from, poly.pnt(right), poly.pnt(i))
                        >= -1e-12
                );
            }
        }
    }

    #[test]
    fn furthest_vertex() {
        let line = regular(Point::new(0.0, 0.0), 1.0, 8, 0.0);
        let poly = Polygon::new(&line, GeometryTolerance::default());
        // A vertical bisector at x = 2: the furthest vertex is the leftmost one.
        let furthest = poly.find_the_furthest_vertex_from_bisector(
            0,
            0,
            Point::new(2.0, 0.0),
            Point::new(0.0, 1.0),
        );
        assert_eq!(poly.pnt(furthest), poly.pnt(4));
    }

    #[test]
    fn distance_to_point() {
        let line = Polyline::new([(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]);
        let poly = Polygon::new(&line, GeometryTolerance::default());
        assert_eq!(poly.distance_to_point(Point::new(3.0, 0.5)), 2.0);
        assert_eq!(poly.distance_to_point(Point::new(0.5, 0.25)), 0.25);
    }
}
