//! Exact geometric predicates, using rational arithmetic, for testing.
//!
//! These are the brute-force oracles that the sweeps get checked against: they look
//! at every candidate segment and test it against every obstacle, with no rounding.

use std::collections::BTreeSet;

use malachite::Rational;

use crate::geom::{cyclic_pairs, PointKey, Polyline};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: Rational,
    pub y: Rational,
}

impl Point {
    // TryInto so that we can use floats (panicking on infinities and nans).
    pub fn new(x: impl TryInto<Rational>, y: impl TryInto<Rational>) -> Point {
        Point {
            x: x.try_into().ok().unwrap(),
            y: y.try_into().ok().unwrap(),
        }
    }
}

impl From<crate::Point> for Point {
    fn from(p: crate::Point) -> Self {
        Point::new(p.x, p.y)
    }
}

impl<'a> std::ops::Sub<&'a Point> for &'a Point {
    type Output = Vector;

    fn sub(self, rhs: &'a Point) -> Vector {
        Vector {
            x: &self.x - &rhs.x,
            y: &self.y - &rhs.y,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vector {
    pub x: Rational,
    pub y: Rational,
}

impl Vector {
    pub fn cross(&self, other: &Vector) -> Rational {
        &self.x * &other.y - &self.y * &other.x
    }
}

/// Twice the signed area of `abc`.
pub fn area(a: &Point, b: &Point, c: &Point) -> Rational {
    (b - a).cross(&(c - a))
}

/// A convex, clockwise polygon with exact coordinates.
#[derive(Clone, Debug)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl From<&Polyline> for Polygon {
    fn from(p: &Polyline) -> Self {
        Polygon {
            points: p.points().iter().map(|&q| q.into()).collect(),
        }
    }
}

impl Polygon {
    /// Does the line through `a` and `b` have the whole polygon on one side?
    pub fn supported_by(&self, a: &Point, b: &Point) -> bool {
        let areas: Vec<Rational> = self.points.iter().map(|p| area(a, b, p)).collect();
        areas.iter().all(|x| *x >= 0) || areas.iter().all(|x| *x <= 0)
    }

    /// Does the segment from `a` to `b` pass through the interior of the polygon?
    ///
    /// Touching the boundary doesn't count.
    pub fn crossed_by(&self, a: &Point, b: &Point) -> bool {
        // Clip the segment against each side in turn. Clockwise means the interior
        // is strictly to the right of every side.
        let d = b - a;
        let mut t0 = Rational::from(0);
        let mut t1 = Rational::from(1);
        for (p0, p1) in cyclic_pairs(&self.points) {
            let e = p1 - p0;
            let num = e.cross(&(a - p0));
            let den = e.cross(&d);
            if den == 0 {
                if num >= 0 {
                    return false;
                }
                continue;
            }
            let t = -num / &den;
            if den < 0 {
                if t > t0 {
                    t0 = t;
                }
            } else if t < t1 {
                t1 = t;
            }
            if t0 >= t1 {
                return false;
            }
        }
        t0 < t1
    }

    /// Is `q` strictly inside the polygon?
    pub fn contains(&self, q: &Point) -> bool {
        cyclic_pairs(&self.points).all(|(p0, p1)| area(p0, p1, q) < 0)
    }

    /// The polygon scaled about its vertex centroid by `1 - shrink`.
    pub fn shrunk(&self, shrink: &Rational) -> Polygon {
        let n = Rational::from(self.points.len());
        let mut cx = Rational::from(0);
        let mut cy = Rational::from(0);
        for p in &self.points {
            cx += &p.x;
            cy += &p.y;
        }
        let c = Point {
            x: cx / &n,
            y: cy / &n,
        };
        let scale = Rational::from(1) - shrink;
        Polygon {
            points: self
                .points
                .iter()
                .map(|p| Point {
                    x: &c.x + (&p.x - &c.x) * &scale,
                    y: &c.y + (&p.y - &c.y) * &scale,
                })
                .collect(),
        }
    }
}

fn ordered(a: crate::Point, b: crate::Point) -> (PointKey, PointKey) {
    if a.key() <= b.key() {
        (a.key(), b.key())
    } else {
        (b.key(), a.key())
    }
}

/// All the common tangents of two holes that don't pass through any hole.
///
/// Each segment is given by its (ordered) endpoints.
pub fn visible_tangents(holes: &[Polyline]) -> BTreeSet<(PointKey, PointKey)> {
    let exact: Vec<Polygon> = holes.iter().map(Polygon::from).collect();
    let mut ret = BTreeSet::new();
    for (i, p) in holes.iter().enumerate() {
        for (j, q) in holes.iter().enumerate().skip(i + 1) {
            for &a in p.points() {
                for &b in q.points() {
                    let (ea, eb) = (Point::from(a), Point::from(b));
                    if exact[i].supported_by(&ea, &eb)
                        && exact[j].supported_by(&ea, &eb)
                        && !exact.iter().any(|h| h.crossed_by(&ea, &eb))
                    {
                        ret.insert(ordered(a, b));
                    }
                }
            }
        }
    }
    ret
}

/// All the hole vertices that `q` can see.
pub fn visible_vertices(q: crate::Point, holes: &[Polyline]) -> BTreeSet<PointKey> {
    let exact: Vec<Polygon> = holes.iter().map(Polygon::from).collect();
    let eq = Point::from(q);
    holes
        .iter()
        .flat_map(|h| h.points().iter().copied())
        .filter(|&v| {
            let ev = Point::from(v);
            !exact.iter().any(|h| h.crossed_by(&eq, &ev))
        })
        .map(|v| v.key())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon {
            points: vec![
                Point::new(0, 0),
                Point::new(0, 1),
                Point::new(1, 1),
                Point::new(1, 0),
            ],
        }
    }

    #[test]
    fn crossing() {
        let sq = square();
        let p = |x: f64, y: f64| Point::new(x, y);
        assert!(sq.crossed_by(&p(-1.0, 0.5), &p(2.0, 0.5)));
        assert!(sq.crossed_by(&p(0.5, 0.5), &p(0.5, 0.75)));
        // Along a side, or through a corner.
        assert!(!sq.crossed_by(&p(-1.0, 0.0), &p(2.0, 0.0)));
        assert!(!sq.crossed_by(&p(-1.0, 1.0), &p(1.0, -1.0)));
        // Stops at the boundary.
        assert!(!sq.crossed_by(&p(-1.0, 0.5), &p(0.0, 0.5)));
        assert!(sq.crossed_by(&p(-1.0, 0.5), &p(0.01, 0.5)));
    }

    #[test]
    fn support_and_containment() {
        let sq = square();
        assert!(sq.supported_by(&Point::new(0, 0), &Point::new(3, 0)));
        assert!(!sq.supported_by(&Point::new(0, 0), &Point::new(3, 1)));
        assert!(sq.contains(&Point::new(0.5, 0.5)));
        assert!(!sq.contains(&Point::new(1, 0.5)));

        let small = sq.shrunk(&Rational::try_from(0.5).unwrap());
        assert_eq!(small.points[0], Point::new(0.25, 0.25));
    }

    #[test]
    fn two_squares() {
        let holes = [
            Polyline::new([(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0)]),
            Polyline::new([(3.0, 0.0), (3.0, 1.0), (4.0, 1.0), (4.0, 0.0)]),
        ];
        // The outer tangents run along the squares' sides, so they're found from
        // every corner on those sides.
        let tangents = visible_tangents(&holes);
        assert_eq!(tangents.len(), 10);

        let seen = visible_vertices(crate::Point::new(-2.0, 0.5), &holes);
        assert_eq!(seen.len(), 2);
    }
}
