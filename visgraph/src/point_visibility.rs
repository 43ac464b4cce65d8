//! Edges from a free point to the hole vertices it can see.
//!
//! From the query point q, each convex hole shows a contiguous run of its boundary:
//! its stem. We visit the vertices of all stems in angular order around q, starting
//! from the horizontal ray pointing right, while keeping the hole sides that cross
//! the current ray in a tree ordered by distance from q. A vertex is visible when
//! the side it belongs to is the nearest one.

use std::cmp::{Ordering, Reverse};
use std::collections::{binary_heap::PeekMut, BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    diagonal::{compare_with_chord, intersect_diagonal_with_ray},
    error::VisibilityError,
    geom::{compare_vectors_by_angle_to_x_axis, signed_doubled_triangle_area, Point, Polyline},
    graph::{EdgeKind, VertexId, VisibilityGraph},
    rb_tree::{NodeId, RbTree},
    tolerance::{GeometryTolerance, Orientation},
};

/// Which visible hole vertices get connected to the query point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisibilityKind {
    /// All of them.
    Regular,
    /// Only those where the line from the query point touches the hole without
    /// entering it. Shortest paths only ever leave a point along such lines.
    Tangent,
}

/// A vertex of a hole, or the side of the hole that starts at that vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BoundaryPoint {
    hole: usize,
    vertex: usize,
}

/// A run of hole vertices, from `start` to `end` going clockwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Stem {
    hole: usize,
    start: usize,
    end: usize,
}

impl Stem {
    fn move_start_clockwise(&mut self, hole: &Polyline) -> bool {
        if self.start == self.end {
            false
        } else {
            self.start = hole.next(self.start);
            true
        }
    }
}

/// A stem in the sorting heap, keyed by the direction from q to its start.
#[derive(Debug)]
struct StemEntry {
    direction: Point,
    seq: usize,
    stem: Stem,
}

impl Ord for StemEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_vectors_by_angle_to_x_axis(self.direction, other.direction)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for StemEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for StemEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for StemEntry {}

/// Connects a point to the vertices of the holes that it can see.
///
/// The holes must be convex, clockwise and mutually disjoint. The point must not be
/// inside any of them, but it may lie on a boundary.
#[derive(Debug)]
pub struct PointVisibilityCalculator<'a> {
    holes: &'a [Polyline],
    q: Point,
    q_vertex: VertexId,
    kind: VisibilityKind,
    tol: GeometryTolerance,
    visible_boundaries: Vec<Option<Stem>>,
    active_sides: RbTree<BoundaryPoint>,
    side_nodes: HashMap<BoundaryPoint, NodeId>,
    sorted_points: Vec<BoundaryPoint>,
}

impl<'a> PointVisibilityCalculator<'a> {
    /// Adds `point` to the graph, along with its visibility edges, and returns its vertex.
    ///
    /// If the graph already has a vertex at `point`, nothing is computed.
    pub fn calculate_point_visibility_graph(
        holes: &'a [Polyline],
        graph: &mut VisibilityGraph,
        point: Point,
        kind: VisibilityKind,
        tol: GeometryTolerance,
    ) -> Result<VertexId, VisibilityError> {
        if let Some(v) = graph.find_vertex(point) {
            return Ok(v);
        }
        let mut calculator = PointVisibilityCalculator {
            holes,
            q: point,
            q_vertex: graph.add_vertex(point),
            kind,
            tol,
            visible_boundaries: Vec::with_capacity(holes.len()),
            active_sides: RbTree::new(),
            side_nodes: HashMap::new(),
            sorted_points: Vec::new(),
        };
        calculator.fill_graph(graph)?;
        Ok(calculator.q_vertex)
    }

    fn fill_graph(&mut self, graph: &mut VisibilityGraph) -> Result<(), VisibilityError> {
        for h in 0..self.holes.len() {
            let stem = self.compute_visible_part_of_the_hole(h);
            self.visible_boundaries.push(stem);
        }
        if self.visible_boundaries.iter().all(Option::is_none) {
            return Ok(());
        }

        self.sort_and_init_active_sides();
        tracing::debug!(
            q = ?self.q,
            vertices = self.sorted_points.len(),
            initially_active = self.active_sides.len(),
            "sorted stems"
        );
        for v in std::mem::take(&mut self.sorted_points) {
            self.sweep_polyline_point(v, graph)?;
        }
        Ok(())
    }

    fn hole_side_is_visible(&self, hole: &Polyline, i: usize) -> bool {
        signed_doubled_triangle_area(self.q, hole.point(i), hole.point(hole.next(i)))
            >= -self.tol.square_of_distance_epsilon()
    }

    /// Finds the part of a hole boundary facing q, ignoring the other holes.
    ///
    /// Returns `None` if q is inside the hole.
    fn compute_visible_part_of_the_hole(&self, h: usize) -> Option<Stem> {
        let hole = &self.holes[h];
        let n = hole.len();
        if n == 0 {
            return None;
        }

        // Find a visible side. If the first one is visible, the stem might extend
        // backwards past it.
        let mut a = 0;
        let mut need_to_go_counterclockwise = true;
        let mut steps = 0;
        while !self.hole_side_is_visible(hole, a) {
            a = hole.next(a);
            need_to_go_counterclockwise = false;
            steps += 1;
            if steps > n {
                tracing::debug!(hole = h, "no side faces the query point");
                return None;
            }
        }

        let mut b = hole.next(a);
        if need_to_go_counterclockwise {
            let mut steps = 0;
            while self.hole_side_is_visible(hole, hole.prev(a)) {
                a = hole.prev(a);
                steps += 1;
                if steps > n {
                    return None;
                }
            }
        }

        let mut steps = 0;
        while self.hole_side_is_visible(hole, b) {
            b = hole.next(b);
            steps += 1;
            if steps > n {
                return None;
            }
        }
        Some(Stem {
            hole: h,
            start: a,
            end: b,
        })
    }

    /// Splits the stems where they cross the horizontal ray from q, registering the
    /// crossing sides as active.
    ///
    /// The resulting stems all start at or counterclockwise from the ray.
    fn initial_stems_and_active_sides(&mut self) -> Vec<Stem> {
        let holes = self.holes;
        let q = self.q;
        let visible: Vec<Stem> = self.visible_boundaries.iter().flatten().copied().collect();
        let mut stems = Vec::with_capacity(2 * visible.len());

        for stem in visible {
            let hole = &holes[stem.hole];
            let mut crosses = false;
            let mut v = stem.start;
            while v != stem.end {
                let source = hole.point(v);
                let next = hole.point(hole.next(v));
                if source.y < q.y {
                    if next.y >= q.y
                        && self.tol.orientation(q, source, next) != Orientation::Clockwise
                    {
                        crosses = true;
                        stems.push(Stem { end: v, ..stem });
                        stems.push(Stem {
                            start: hole.next(v),
                            ..stem
                        });
                        self.register_active_side(BoundaryPoint {
                            hole: stem.hole,
                            vertex: v,
                        });
                        break;
                    }
                } else if source.y > q.y {
                    break;
                } else if source.x >= q.x {
                    // The ray passes through this vertex.
                    crosses = true;
                    stems.push(Stem { start: v, ..stem });
                    if v != stem.start {
                        stems.push(Stem {
                            end: hole.prev(v),
                            ..stem
                        });
                    }
                    self.register_active_side(BoundaryPoint {
                        hole: stem.hole,
                        vertex: v,
                    });
                    break;
                }
                v = hole.next(v);
            }
            if !crosses {
                stems.push(stem);
            }
        }
        stems
    }

    fn register_active_side(&mut self, side: BoundaryPoint) {
        let hole = &self.holes[side.hole];
        let (a, b) = (hole.point(side.vertex), hole.point(hole.next(side.vertex)));
        let x = intersect_diagonal_with_ray(&self.tol, self.q, self.q + Point::new(1.0, 0.0), a, b);
        let node = self.insert_side(side, x);
        self.side_nodes.insert(side, node);
    }

    /// Inserts a side, positioning it by a point `x` where it meets the current ray.
    fn insert_side(&mut self, side: BoundaryPoint, x: Point) -> NodeId {
        let tol = self.tol;
        let holes = self.holes;
        self.active_sides.insert_by(side, |_, other| {
            let hole = &holes[other.hole];
            compare_with_chord(
                &tol,
                x,
                hole.point(other.vertex),
                hole.point(hole.next(other.vertex)),
            )
        })
    }

    /// Merges the stems into a single list of vertices sorted by angle around q.
    fn sort_and_init_active_sides(&mut self) {
        let holes = self.holes;
        let q = self.q;
        let mut heap: BinaryHeap<Reverse<StemEntry>> = self
            .initial_stems_and_active_sides()
            .into_iter()
            .enumerate()
            .map(|(seq, stem)| {
                Reverse(StemEntry {
                    direction: holes[stem.hole].point(stem.start) - q,
                    seq,
                    stem,
                })
            })
            .collect();

        while let Some(mut top) = heap.peek_mut() {
            let advanced = {
                let Reverse(entry) = &mut *top;
                let hole = &holes[entry.stem.hole];
                self.sorted_points.push(BoundaryPoint {
                    hole: entry.stem.hole,
                    vertex: entry.stem.start,
                });
                if entry.stem.move_start_clockwise(hole) {
                    entry.direction = hole.point(entry.stem.start) - q;
                    true
                } else {
                    false
                }
            };
            if !advanced {
                PeekMut::pop(top);
            }
        }
    }

    fn outgoing_side(&self, v: BoundaryPoint) -> Option<BoundaryPoint> {
        match self.visible_boundaries[v.hole] {
            Some(stem) if stem.end == v.vertex => None,
            _ => Some(v),
        }
    }

    fn sweep_polyline_point(
        &mut self,
        v: BoundaryPoint,
        graph: &mut VisibilityGraph,
    ) -> Result<(), VisibilityError> {
        let hole = &self.holes[v.hole];
        let in_side = BoundaryPoint {
            hole: v.hole,
            vertex: hole.prev(v.vertex),
        };
        let out_side = self.outgoing_side(v);
        let x = hole.point(v.vertex);
        tracing::trace!(?v, ?x, "sweeping boundary point");

        if let Some(node) = self.side_nodes.remove(&in_side) {
            if self.active_sides.minimum() == Some(node) {
                self.add_edge(v, graph)?;
            }
            match out_side {
                Some(out) => {
                    // The outgoing side takes the place of the incoming one.
                    self.active_sides.replace(node, out);
                    self.side_nodes.insert(out, node);
                }
                None => {
                    self.active_sides.remove(node);
                }
            }
        } else if let Some(out) = out_side {
            let node = match self.side_nodes.get(&out) {
                Some(&node) => node,
                None => {
                    let node = self.insert_side(out, x);
                    self.side_nodes.insert(out, node);
                    node
                }
            };
            // A side registered on the initial ray is already active when we reach
            // its start, but its start can still be visible.
            if self.active_sides.minimum() == Some(node) {
                self.add_edge(v, graph)?;
            }
        } else {
            return Err(VisibilityError::InconsistentSweep { point: x });
        }
        Ok(())
    }

    fn add_edge(&self, v: BoundaryPoint, graph: &mut VisibilityGraph) -> Result<(), VisibilityError> {
        let hole = &self.holes[v.hole];
        let target = hole.point(v.vertex);
        if target.key() == self.q.key() {
            return Ok(());
        }
        if self.kind == VisibilityKind::Tangent && !line_touches_polygon(self.q, hole, v.vertex) {
            return Ok(());
        }
        graph.add_edge_with(self.q, target, EdgeKind::TollFree)?;
        tracing::trace!(?target, "visible from the query point");
        Ok(())
    }
}

/// Does the line from `a` through vertex `i` keep the whole hole on one side?
fn line_touches_polygon(a: Point, hole: &Polyline, i: usize) -> bool {
    let v = hole.point(i);
    let prev = hole.point(hole.prev(i));
    let next = hole.point(hole.next(i));
    signed_doubled_triangle_area(a, v, prev) * signed_doubled_triangle_area(a, v, next) >= 0.0
}
