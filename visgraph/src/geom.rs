use std::cmp::Ordering;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A point (or a vector) in the plane.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Creates a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// The dot product, treating both points as vectors.
    pub fn dot(&self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The z-component of the cross product, treating both points as vectors.
    pub fn cross(&self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Euclidean length, treating this point as a vector.
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Rotates this vector counterclockwise by `angle` radians.
    pub fn rotate(&self, angle: f64) -> Point {
        let (sin, cos) = angle.sin_cos();
        Point {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// The point `(1 - t) * self + t * other`.
    pub fn affine(&self, other: Point, t: f64) -> Point {
        Point {
            x: (1.0 - t) * self.x + t * other.x,
            y: (1.0 - t) * self.y + t * other.y,
        }
    }

    /// A totally ordered, hashable key for this point, ordered by `x` and then by `y`.
    pub fn key(&self) -> PointKey {
        PointKey {
            x: OrderedFloat(self.x),
            y: OrderedFloat(self.y),
        }
    }

    pub(crate) fn coord(&self) -> robust::Coord<f64> {
        robust::Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Twice the signed area of the triangle `abc`: positive if `abc` turns counterclockwise.
///
/// The sign of the result is exact.
pub fn signed_doubled_triangle_area(a: Point, b: Point, c: Point) -> f64 {
    robust::orient2d(a.coord(), b.coord(), c.coord())
}

/// Orders two vectors by their counterclockwise angle from the positive x axis.
///
/// Vectors in the upper half-plane (including the positive and negative x axis)
/// come before vectors in the lower half-plane. Within a half-plane the order
/// is by angle; vectors pointing in the same direction are ordered by length.
/// The comparison uses exact orientation signs, so it is a total order.
pub fn compare_vectors_by_angle_to_x_axis(a: Point, b: Point) -> Ordering {
    let a_upper = a.y >= 0.0;
    let b_upper = b.y >= 0.0;
    if a_upper != b_upper {
        return if a_upper {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }

    let turn = signed_doubled_triangle_area(Point::default(), a, b);
    if turn > 0.0 {
        return Ordering::Less;
    }
    if turn < 0.0 {
        return Ordering::Greater;
    }

    // The vectors are parallel. On the x axis they can still point in opposite
    // directions.
    match (a.x >= 0.0, b.x >= 0.0) {
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    a.x.abs()
        .total_cmp(&b.x.abs())
        .then(a.y.abs().total_cmp(&b.y.abs()))
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl std::ops::Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl std::ops::Div<f64> for Point {
    type Output = Point;

    fn div(self, rhs: f64) -> Point {
        Point {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

/// The exact coordinates of a [`Point`], usable as a map key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointKey {
    x: OrderedFloat<f64>,
    y: OrderedFloat<f64>,
}

impl PointKey {
    /// The point this key was made from.
    pub fn point(&self) -> Point {
        Point::new(self.x.into_inner(), self.y.into_inner())
    }
}

impl std::fmt::Debug for PointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.point().fmt(f)
    }
}

/// A closed polyline: the last point connects back to the first.
///
/// Obstacles are given as closed polylines; the visibility code expects them to be
/// convex and (after [`orient_holes_clockwise`](crate::orient_holes_clockwise))
/// clockwise.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Creates a closed polyline from its points.
    pub fn new(points: impl IntoIterator<Item = impl Into<Point>>) -> Self {
        Polyline {
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    /// The number of points (which is also the number of sides).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Is this polyline empty?
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All the points, in order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The point at index `i`, taken cyclically.
    pub fn point(&self, i: usize) -> Point {
        self.points[i % self.points.len()]
    }

    /// The index following `i` along the polyline.
    pub fn next(&self, i: usize) -> usize {
        (i + 1) % self.points.len()
    }

    /// The index preceding `i` along the polyline.
    pub fn prev(&self, i: usize) -> usize {
        (i + self.points.len() - 1) % self.points.len()
    }

    /// The same polyline, traversed in the opposite direction.
    pub fn reversed(&self) -> Polyline {
        Polyline {
            points: self.points.iter().rev().copied().collect(),
        }
    }

    /// Iterates over the sides as `(start, end)` pairs, including the closing side.
    pub fn sides(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        cyclic_pairs(&self.points).map(|(a, b)| (*a, *b))
    }
}

/// Iterates over all pairs of consecutive elements, including the wrap-around pair.
pub(crate) fn cyclic_pairs<T>(xs: &[T]) -> impl Iterator<Item = (&T, &T)> {
    xs.windows(2)
        .map(|pair| (&pair[0], &pair[1]))
        .chain(xs.last().zip(xs.first()))
}
