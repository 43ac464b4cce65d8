//! Visibility edges between obstacles.
//!
//! Two obstacles can only see each other along their common tangents, so these are
//! the only candidate edges. For each obstacle P we sweep a ray around it, meeting
//! the tangents to every other obstacle in angular order. The chords between the
//! far ends of the tangents to an obstacle Q block everything behind Q, so we keep
//! the chords crossing the ray in a tree ordered by distance along the ray. A
//! tangent is visible exactly when its own chord is the nearest one.

use crate::{
    diagonal::{
        compare_with_chord, intersect_diagonal_with_ray, ray_intersects_diagonal, Diagonal,
        DiagonalIdx, Tangent, TangentIdx,
    },
    error::VisibilityError,
    geom::{compare_vectors_by_angle_to_x_axis, Point, Polyline},
    graph::{EdgeKind, VisibilityGraph},
    polygon::Polygon,
    rb_tree::RbTree,
    tangent_pair::TangentPair,
    tolerance::GeometryTolerance,
};

/// Adds all the unobstructed tangent edges between the holes to the graph.
///
/// The holes must be disjoint, convex, clockwise and non-empty.
pub fn add_tangent_visibility_edges_to_graph(
    holes: &[Polyline],
    graph: &mut VisibilityGraph,
    tol: GeometryTolerance,
) -> Result<(), VisibilityError> {
    if holes.len() > 1 {
        for use_left_p_tangents in [true, false] {
            TangentVisibilityGraphCalculator::new(holes, tol, use_left_p_tangents)
                .calculate_and_add_edges(graph)?;
        }
    }
    Ok(())
}

/// Computes one family of tangent edges between all pairs of holes.
///
/// Each pair of holes has four common tangents. Sweeping around a hole P we look at
/// either the two tangents that have P on their left, or the two that have P on
/// their right; running both families from every hole finds all visible tangents.
#[derive(Clone, Debug)]
pub struct TangentVisibilityGraphCalculator<'a> {
    polygons: Vec<Polygon<'a>>,
    use_left_p_tangents: bool,
}

impl<'a> TangentVisibilityGraphCalculator<'a> {
    /// Prepares a calculator for one family of tangents.
    pub fn new(holes: &'a [Polyline], tol: GeometryTolerance, use_left_p_tangents: bool) -> Self {
        TangentVisibilityGraphCalculator {
            polygons: holes.iter().map(|h| Polygon::new(h, tol)).collect(),
            use_left_p_tangents,
        }
    }

    /// Sweeps around every hole, adding the visible tangents to the graph.
    pub fn calculate_and_add_edges(&self, graph: &mut VisibilityGraph) -> Result<(), VisibilityError> {
        for (i, current) in self.polygons.iter().enumerate() {
            let others = self
                .polygons
                .iter()
                .filter(|q| !std::ptr::eq(q.polyline(), current.polyline()));
            let sweep = DiagonalSweep::new(current, others, self.use_left_p_tangents);
            let visible = sweep.run(graph)?;
            tracing::debug!(
                polygon = i,
                left = self.use_left_p_tangents,
                visible,
                "swept tangents"
            );
        }
        Ok(())
    }
}

/// Adds tangent edges for newly inserted obstacles, leaving the rest of the graph alone.
///
/// Only sweeps around the added polygons, but against all the obstacles (the other
/// added ones and the existing ones).
#[derive(Clone, Debug)]
pub struct InteractiveTangentVisibilityGraphCalculator<'a> {
    polygons: Vec<Polygon<'a>>,
    added_polygons: Vec<Polygon<'a>>,
}

impl<'a> InteractiveTangentVisibilityGraphCalculator<'a> {
    /// Prepares to add tangents from `added` to everything in `added` and `holes`.
    pub fn new(holes: &'a [Polyline], added: &'a [Polyline], tol: GeometryTolerance) -> Self {
        InteractiveTangentVisibilityGraphCalculator {
            polygons: holes.iter().map(|h| Polygon::new(h, tol)).collect(),
            added_polygons: added.iter().map(|h| Polygon::new(h, tol)).collect(),
        }
    }

    /// Adds the tangent edges from `added` to the graph.
    pub fn add_polygons(
        holes: &[Polyline],
        added: &[Polyline],
        graph: &mut VisibilityGraph,
        tol: GeometryTolerance,
    ) -> Result<(), VisibilityError> {
        InteractiveTangentVisibilityGraphCalculator::new(holes, added, tol).run(graph)
    }

    /// Runs both tangent families.
    pub fn run(&self, graph: &mut VisibilityGraph) -> Result<(), VisibilityError> {
        self.calculate_and_add_edges(graph, true)?;
        self.calculate_and_add_edges(graph, false)
    }

    fn all_obstacles(&self) -> impl Iterator<Item = &Polygon<'a>> + '_ {
        self.added_polygons.iter().chain(&self.polygons)
    }

    fn calculate_and_add_edges(
        &self,
        graph: &mut VisibilityGraph,
        use_left_p_tangents: bool,
    ) -> Result<(), VisibilityError> {
        for (i, current) in self.added_polygons.iter().enumerate() {
            let others = self
                .all_obstacles()
                .filter(|q| !std::ptr::eq(q.polyline(), current.polyline()));
            let sweep = DiagonalSweep::new(current, others, use_left_p_tangents);
            let visible = sweep.run(graph)?;
            tracing::debug!(
                added_polygon = i,
                left = use_left_p_tangents,
                visible,
                "swept tangents"
            );
        }
        Ok(())
    }
}

/// The state of a sweep around one polygon.
struct DiagonalSweep {
    tangents: Vec<Tangent>,
    diagonals: Vec<Diagonal>,
    active: RbTree<DiagonalIdx>,
    tol: GeometryTolerance,
}

impl DiagonalSweep {
    fn new<'a, 'p>(
        current: &Polygon<'a>,
        others: impl IntoIterator<Item = &'p Polygon<'a>>,
        use_left_p_tangents: bool,
    ) -> Self
    where
        'a: 'p,
    {
        let mut sweep = DiagonalSweep {
            tangents: Vec::new(),
            diagonals: Vec::new(),
            active: RbTree::new(),
            tol: current.tolerance(),
        };
        for q in others {
            let mut pair = TangentPair::new(current, q);
            let (low, high) = if use_left_p_tangents {
                pair.calculate_left_tangents()
            } else {
                pair.calculate_right_tangents()
            };
            sweep.add_tangents(
                (current.pnt(low.0), q.pnt(low.1)),
                (current.pnt(high.0), q.pnt(high.1)),
                use_left_p_tangents,
            );
        }
        sweep
    }

    fn add_tangents(&mut self, low: (Point, Point), high: (Point, Point), use_left_p_tangents: bool) {
        let low_idx = TangentIdx(self.tangents.len());
        let high_idx = TangentIdx(low_idx.0 + 1);
        self.tangents.push(Tangent {
            start: low.0,
            end: low.1,
            is_low: true,
            separating_polygons: !use_left_p_tangents,
            comp: high_idx,
            diagonal: None,
        });
        self.tangents.push(Tangent {
            start: high.0,
            end: high.1,
            is_low: false,
            separating_polygons: use_left_p_tangents,
            comp: low_idx,
            diagonal: None,
        });
        self.diagonals
            .push(Diagonal::new(low_idx, high_idx, low.1, high.1));
    }

    /// Runs the sweep, returning the number of visible tangents.
    fn run(mut self, graph: &mut VisibilityGraph) -> Result<usize, VisibilityError> {
        let mut order: Vec<TangentIdx> = (0..self.tangents.len()).map(TangentIdx).collect();
        order.sort_by(|a, b| {
            compare_vectors_by_angle_to_x_axis(
                self.tangents[a.0].direction(),
                self.tangents[b.0].direction(),
            )
        });
        let Some(&first) = order.first() else {
            return Ok(0);
        };

        self.init_active_diagonals(first);
        let mut visible = 0;
        for t in order {
            if self.process(t, graph)? {
                visible += 1;
            }
        }
        Ok(visible)
    }

    /// Activates every diagonal crossed by the first tangent's ray.
    fn init_active_diagonals(&mut self, first: TangentIdx) {
        let pivot = self.tangents[first.0].start;
        let on_ray = self.tangents[first.0].end;
        for d in (0..self.diagonals.len()).map(DiagonalIdx) {
            let (start, end) = (self.diagonals[d.0].start, self.diagonals[d.0].end);
            if ray_intersects_diagonal(&self.tol, pivot, on_ray, start, end) {
                let x = intersect_diagonal_with_ray(&self.tol, pivot, on_ray, start, end);
                self.insert_active_diagonal(d, x);
            }
        }
    }

    fn process(&mut self, t: TangentIdx, graph: &mut VisibilityGraph) -> Result<bool, VisibilityError> {
        let tangent = &self.tangents[t.0];
        let (start, end, is_high, comp) = (tangent.start, tangent.end, tangent.is_high(), tangent.comp);
        let diagonal = tangent.diagonal;
        tracing::trace!(
            ?t,
            ?start,
            ?end,
            low = !is_high,
            separating = tangent.separating_polygons,
            "processing tangent"
        );

        let visible = if let Some(d) = diagonal {
            let visible = self.is_minimum(d);
            if is_high {
                self.remove_diagonal(d);
            }
            visible
        } else if !is_high {
            let d = DiagonalIdx(self.diagonals.len());
            self.diagonals
                .push(Diagonal::new(t, comp, end, self.tangents[comp.0].end));
            self.insert_active_diagonal(d, end);
            self.is_minimum(d)
        } else {
            false
        };

        if visible {
            graph.add_edge_with(start, end, EdgeKind::Regular)?;
        }
        Ok(visible)
    }

    fn is_minimum(&self, d: DiagonalIdx) -> bool {
        let node = self.diagonals[d.0].node;
        node.is_some() && node == self.active.minimum()
    }

    /// Inserts a diagonal, positioning it by a point `x` where it meets the sweep ray.
    fn insert_active_diagonal(&mut self, d: DiagonalIdx, x: Point) {
        let tol = self.tol;
        let diagonals = &self.diagonals;
        let node = self.active.insert_by(d, |_, other| {
            let other = &diagonals[other.0];
            compare_with_chord(&tol, x, other.start, other.end)
        });
        tracing::trace!(?d, ?node, "activated diagonal");

        let diagonal = &mut self.diagonals[d.0];
        diagonal.node = Some(node);
        let (low, high) = (diagonal.low, diagonal.high);
        self.tangents[low.0].diagonal = Some(d);
        self.tangents[high.0].diagonal = Some(d);
    }

    fn remove_diagonal(&mut self, d: DiagonalIdx) {
        let diagonal = &mut self.diagonals[d.0];
        if let Some(node) = diagonal.node.take() {
            self.active.remove(node);
        }
        let (low, high) = (diagonal.low, diagonal.high);
        self.tangents[low.0].diagonal = None;
        self.tangents[high.0].diagonal = None;
        tracing::trace!(?d, "deactivated diagonal");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use malachite::Rational;
    use proptest::prelude::*;

    use super::*;
    use crate::{
        exact,
        perturbation::{self, degenerate_cases, realize_perturbation},
        polygon::tests::regular,
    };

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn regular_edges(graph: &VisibilityGraph) -> Vec<(Point, Point)> {
        let mut edges: Vec<_> = graph
            .edges()
            .filter(|&e| graph[e].kind() == EdgeKind::Regular)
            .map(|e| {
                let (a, b) = (graph[e].source_point(), graph[e].target_point());
                if a.key() <= b.key() {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect();
        edges.sort_by_key(|(a, b)| (a.key(), b.key()));
        edges
    }

    fn unit_square(x: f64, y: f64) -> Polyline {
        Polyline::new([(x, y), (x, y + 1.0), (x + 1.0, y + 1.0), (x + 1.0, y)])
    }

    #[test]
    fn two_squares() {
        let holes = [unit_square(0.0, 0.0), unit_square(3.0, 0.0)];
        let mut graph = VisibilityGraph::new();
        add_tangent_visibility_edges_to_graph(&holes, &mut graph, GeometryTolerance::default())
            .unwrap();
        assert_eq!(
            regular_edges(&graph),
            vec![
                (p(1.0, 0.0), p(3.0, 0.0)),
                (p(1.0, 0.0), p(3.0, 1.0)),
                (p(1.0, 1.0), p(3.0, 0.0)),
                (p(1.0, 1.0), p(3.0, 1.0)),
            ]
        );
    }

    #[test]
    fn middle_obstacle_blocks() {
        let holes = [
            unit_square(0.0, 0.0),
            Polyline::new([(3.0, -1.0), (3.0, 2.0), (4.0, 2.0), (4.0, -1.0)]),
            unit_square(6.0, 0.0),
        ];
        let mut graph = VisibilityGraph::new();
        add_tangent_visibility_edges_to_graph(&holes, &mut graph, GeometryTolerance::default())
            .unwrap();
        assert_eq!(
            regular_edges(&graph),
            vec![
                (p(0.0, 0.0), p(3.0, -1.0)),
                (p(0.0, 1.0), p(3.0, 2.0)),
                (p(1.0, 0.0), p(3.0, 2.0)),
                (p(1.0, 1.0), p(3.0, -1.0)),
                (p(4.0, -1.0), p(6.0, 1.0)),
                (p(4.0, -1.0), p(7.0, 0.0)),
                (p(4.0, 2.0), p(6.0, 0.0)),
                (p(4.0, 2.0), p(7.0, 1.0)),
            ]
        );
    }

    #[test]
    fn a_single_hole_has_no_tangents() {
        let holes = [unit_square(0.0, 0.0)];
        let mut graph = VisibilityGraph::new();
        add_tangent_visibility_edges_to_graph(&holes, &mut graph, GeometryTolerance::default())
            .unwrap();
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn interactive_matches_full_for_new_pairs() {
        let tol = GeometryTolerance::default();
        let existing = [
            regular(p(0.0, 0.0), 1.0, 5, 0.2),
            regular(p(6.0, 1.0), 1.5, 6, 0.0),
        ];
        let added = [regular(p(3.0, 5.0), 1.0, 7, 0.4)];

        let mut full = VisibilityGraph::new();
        let all: Vec<Polyline> = existing.iter().chain(&added).cloned().collect();
        add_tangent_visibility_edges_to_graph(&all, &mut full, tol).unwrap();

        let mut incremental = VisibilityGraph::new();
        add_tangent_visibility_edges_to_graph(&existing, &mut incremental, tol).unwrap();
        InteractiveTangentVisibilityGraphCalculator::add_polygons(
            &existing,
            &added,
            &mut incremental,
            tol,
        )
        .unwrap();

        assert_eq!(regular_edges(&full), regular_edges(&incremental));
    }

    #[test]
    fn interactive_only_touches_added_polygons() {
        let tol = GeometryTolerance::default();
        let existing = [unit_square(0.0, 0.0), unit_square(3.0, 0.0)];
        let added = [unit_square(0.0, 4.0)];
        let mut graph = VisibilityGraph::new();
        InteractiveTangentVisibilityGraphCalculator::add_polygons(&existing, &added, &mut graph, tol)
            .unwrap();

        assert!(!regular_edges(&graph).is_empty());
        for (a, b) in regular_edges(&graph) {
            // Every edge has an end on the added square.
            assert!(a.y >= 4.0 || b.y >= 4.0);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn finds_every_visible_tangent(holes in perturbation::obstacles()) {
            let mut graph = VisibilityGraph::new();
            add_tangent_visibility_edges_to_graph(&holes, &mut graph, GeometryTolerance::default())
                .unwrap();
            let found: BTreeSet<_> = regular_edges(&graph)
                .into_iter()
                .map(|(a, b)| (a.key(), b.key()))
                .collect();
            prop_assert_eq!(found, exact::visible_tangents(&holes));
        }

        #[test]
        fn perturbed_tangents_stay_outside(pert in perturbation::perturbation(1e-7)) {
            let holes = realize_perturbation(&degenerate_cases(), &pert);
            let mut graph = VisibilityGraph::new();
            add_tangent_visibility_edges_to_graph(&holes, &mut graph, GeometryTolerance::default())
                .unwrap();

            // Every tangent keeps clear of the obstacles, give or take a margin.
            let margin = Rational::try_from(1e-3).unwrap();
            let shrunk: Vec<_> = holes
                .iter()
                .map(|h| exact::Polygon::from(h).shrunk(&margin))
                .collect();
            prop_assert!(graph.edge_count() > 0);
            for (a, b) in regular_edges(&graph) {
                let (a, b) = (exact::Point::from(a), exact::Point::from(b));
                prop_assert!(!shrunk.iter().any(|s| s.crossed_by(&a, &b)));
            }
        }
    }
}
