//! Proptest strategies for obstacle sets.
//!
//! There are two kinds of inputs here: generic ones (randomly placed regular polygons,
//! which are almost surely free of collinearities) and degenerate ones (obstacles
//! lined up on a grid, so that tangents run along sides and through far corners),
//! with tiny perturbations applied to their vertices.

use std::f64::consts::PI;

use proptest::{arbitrary::any, prop_oneof, sample::subsequence, strategy::Strategy};

use crate::geom::{Point, Polyline};
use crate::polygon::tests::regular;

/// The side of a grid cell. Each generated obstacle lives in its own cell.
pub const CELL: f64 = 10.0;

#[derive(Clone, Copy, Debug)]
pub enum FloatPerturbation {
    /// Perturb by between -128 and 127 ulps.
    Ulp(i8),
    /// Perturb by a bounded additive amount.
    Eps(f64),
}

impl FloatPerturbation {
    pub fn apply(&self, f: f64) -> f64 {
        match self {
            FloatPerturbation::Ulp(n) => {
                let mut x = f;
                for _ in 0..n.unsigned_abs() {
                    x = if *n > 0 { next_up(x) } else { next_down(x) };
                }
                x
            }
            FloatPerturbation::Eps(e) => f + e,
        }
    }
}

fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        x
    } else if x == 0.0 {
        f64::from_bits(1)
    } else if x > 0.0 {
        f64::from_bits(x.to_bits() + 1)
    } else {
        f64::from_bits(x.to_bits() - 1)
    }
}

fn next_down(x: f64) -> f64 {
    -next_up(-x)
}

#[derive(Clone, Copy, Debug)]
pub struct PointPerturbation {
    pub x: FloatPerturbation,
    pub y: FloatPerturbation,
}

impl PointPerturbation {
    pub fn apply(&self, p: Point) -> Point {
        Point::new(self.x.apply(p.x), self.y.apply(p.y))
    }
}

/// A chain of vertex perturbations applied to one of the base cases.
#[derive(Clone, Debug)]
pub enum Perturbation {
    Base {
        idx: usize,
    },
    Point {
        perturbation: PointPerturbation,
        obstacle: usize,
        vertex: usize,
        next: Box<Perturbation>,
    },
}

pub fn float_perturbation(eps: f64) -> impl Strategy<Value = FloatPerturbation> {
    prop_oneof![
        any::<i8>().prop_map(FloatPerturbation::Ulp),
        (-eps..=eps).prop_map(FloatPerturbation::Eps)
    ]
}

pub fn point_perturbation(eps: f64) -> impl Strategy<Value = PointPerturbation> {
    (float_perturbation(eps), float_perturbation(eps)).prop_map(|(x, y)| PointPerturbation { x, y })
}

pub fn perturbation(eps: f64) -> impl Strategy<Value = Perturbation> {
    let leaf = any::<usize>().prop_map(|idx| Perturbation::Base { idx });
    leaf.prop_recursive(4, 16, 1, move |inner| {
        (
            point_perturbation(eps),
            any::<usize>(),
            any::<usize>(),
            inner,
        )
            .prop_map(|(perturbation, obstacle, vertex, next)| Perturbation::Point {
                perturbation,
                obstacle,
                vertex,
                next: Box::new(next),
            })
    })
}

fn index<T>(arr: &[T], idx: usize) -> &T {
    &arr[idx % arr.len()]
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polyline {
    Polyline::new([(x0, y0), (x0, y1), (x1, y1), (x1, y0)])
}

/// Obstacle sets with lots of coincidences: shared supporting lines, tangents
/// through the corners of third obstacles, and so on.
pub fn degenerate_cases() -> Vec<Vec<Polyline>> {
    let diamond = |x: f64, y: f64| regular(Point::new(x, y), 1.0, 4, 0.0);
    vec![
        vec![rect(0.0, 0.0, 1.0, 1.0), rect(3.0, 0.0, 4.0, 1.0), rect(6.0, 0.0, 7.0, 1.0)],
        vec![rect(0.0, 0.0, 1.0, 1.0), rect(3.0, -1.0, 4.0, 2.0), rect(6.0, 0.0, 7.0, 1.0)],
        vec![
            rect(0.0, 0.0, 1.0, 1.0),
            rect(3.0, 0.0, 4.0, 1.0),
            rect(0.0, 3.0, 1.0, 4.0),
            rect(3.0, 3.0, 4.0, 4.0),
        ],
        vec![diamond(0.0, 0.0), diamond(4.0, 0.0), diamond(8.0, 0.0), diamond(4.0, 4.0)],
    ]
}

pub fn realize_perturbation(base_cases: &[Vec<Polyline>], pert: &Perturbation) -> Vec<Polyline> {
    match pert {
        Perturbation::Base { idx } => index(base_cases, *idx).to_owned(),
        Perturbation::Point {
            perturbation,
            obstacle,
            vertex,
            next,
        } => {
            let mut obstacles = realize_perturbation(base_cases, next);
            let k = *obstacle % obstacles.len();
            let poly = &obstacles[k];
            let v = *vertex % poly.len();
            let points = poly
                .points()
                .iter()
                .enumerate()
                .map(|(i, &p)| if i == v { perturbation.apply(p) } else { p });
            obstacles[k] = Polyline::new(points);
            obstacles
        }
    }
}

/// A clockwise regular polygon somewhere near the middle of grid cell `cell`.
fn obstacle_in_cell(cell: usize, columns: usize) -> impl Strategy<Value = Polyline> {
    let (col, row) = ((cell % columns) as f64, (cell / columns) as f64);
    (-2.0..2.0, -2.0..2.0, 0.5..2.5, 3usize..=8, 0.0..2.0 * PI).prop_map(
        move |(dx, dy, radius, n, phase)| {
            let center = Point::new(col * CELL + dx, row * CELL + dy);
            regular(center, radius, n, phase)
        },
    )
}

/// Between two and five disjoint regular polygons, in general position.
pub fn obstacles() -> impl Strategy<Value = Vec<Polyline>> {
    subsequence((0..9).collect::<Vec<usize>>(), 2..=5)
        .prop_flat_map(|cells| cells.into_iter().map(|c| obstacle_in_cell(c, 3)).collect::<Vec<_>>())
}

/// A point anywhere in (or just around) the grid used by [`obstacles`].
pub fn free_point() -> impl Strategy<Value = Point> {
    (-5.0..3.0 * CELL - 5.0, -5.0..3.0 * CELL - 5.0).prop_map(|(x, y)| Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ulps() {
        assert_eq!(FloatPerturbation::Ulp(0).apply(1.0), 1.0);
        assert_eq!(FloatPerturbation::Ulp(1).apply(1.0), 1.0 + f64::EPSILON);
        assert_eq!(FloatPerturbation::Ulp(-2).apply(0.0), -f64::from_bits(2));
        assert_eq!(FloatPerturbation::Ulp(3).apply(-f64::from_bits(1)), f64::from_bits(2));
        assert_eq!(FloatPerturbation::Eps(0.5).apply(1.0), 1.5);
    }
}
