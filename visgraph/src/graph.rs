//! The visibility graph.
//!
//! Vertices are deduplicated by position: there is at most one vertex at any point.
//! Edges are conceptually undirected, but each one is stored once, as an outgoing
//! edge of its source and an incoming edge of its target. A vertex keeps its
//! outgoing edges sorted by target position, so looking up the edge between two
//! vertices is logarithmic in their degrees.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    error::VisibilityError,
    geom::{Point, PointKey, Polyline},
};

/// Identifies a vertex in a [`VisibilityGraph`].
///
/// Ids are never reused, but an id is invalidated when its vertex is removed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(usize);

impl std::fmt::Debug for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v_{}", self.0)
    }
}

/// Identifies an edge in a [`VisibilityGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(usize);

impl std::fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e_{}", self.0)
    }
}

/// What an edge costs to traverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// An ordinary edge, of weight one.
    Regular,
    /// An edge of weight zero, for running along an obstacle that you're
    /// already touching.
    TollFree,
}

/// A vertex of the visibility graph.
#[derive(Clone, Debug)]
pub struct VisibilityVertex {
    point: Point,
    out_edges: BTreeMap<PointKey, EdgeId>,
    in_edges: Vec<EdgeId>,
    distance: f64,
}

impl VisibilityVertex {
    fn new(point: Point) -> Self {
        VisibilityVertex {
            point,
            out_edges: BTreeMap::new(),
            in_edges: Vec::new(),
            distance: 0.0,
        }
    }

    /// The position of this vertex.
    pub fn point(&self) -> Point {
        self.point
    }

    /// The edges stored with this vertex as their source, ordered by target position.
    pub fn out_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.out_edges.values().copied()
    }

    /// The edges having this vertex as their target.
    pub fn in_edges(&self) -> &[EdgeId] {
        &self.in_edges
    }

    /// The number of edges touching this vertex.
    pub fn degree(&self) -> usize {
        self.in_edges.len() + self.out_edges.len()
    }

    /// Scratch distance for shortest-path searches.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Sets the scratch distance.
    pub fn set_distance(&mut self, distance: f64) {
        self.distance = distance;
    }

    fn out_edge_to(&self, target: Point) -> Option<EdgeId> {
        self.out_edges.get(&target.key()).copied()
    }
}

/// An edge of the visibility graph.
pub struct VisibilityEdge {
    source: VertexId,
    target: VertexId,
    source_point: Point,
    target_point: Point,
    kind: EdgeKind,
    length_multiplier: f64,
    passable: Option<Box<dyn Fn() -> bool>>,
}

impl std::fmt::Debug for VisibilityEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibilityEdge")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("kind", &self.kind)
            .field("length_multiplier", &self.length_multiplier)
            .field("has_passability_test", &self.passable.is_some())
            .finish()
    }
}

impl VisibilityEdge {
    /// The vertex storing this edge as outgoing.
    pub fn source(&self) -> VertexId {
        self.source
    }

    /// The vertex storing this edge as incoming.
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// The position of the source.
    pub fn source_point(&self) -> Point {
        self.source_point
    }

    /// The position of the target.
    pub fn target_point(&self) -> Point {
        self.target_point
    }

    /// The end of this edge that isn't `v`.
    pub fn other_end(&self, v: VertexId) -> VertexId {
        if self.source == v {
            self.target
        } else {
            self.source
        }
    }

    /// What kind of edge this is.
    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    /// One for regular edges, zero for toll-free ones.
    pub fn weight(&self) -> f64 {
        match self.kind {
            EdgeKind::Regular => 1.0,
            EdgeKind::TollFree => 0.0,
        }
    }

    /// The factor applied to this edge's euclidean length.
    pub fn length_multiplier(&self) -> f64 {
        self.length_multiplier
    }

    /// Sets the factor applied to this edge's euclidean length.
    pub fn set_length_multiplier(&mut self, multiplier: f64) {
        self.length_multiplier = multiplier;
    }

    /// The cost of this edge for path searches: its scaled length, or zero if it's toll-free.
    pub fn length(&self) -> f64 {
        match self.kind {
            EdgeKind::Regular => {
                (self.target_point - self.source_point).length() * self.length_multiplier
            }
            EdgeKind::TollFree => 0.0,
        }
    }

    /// Can this edge be traversed right now?
    pub fn is_passable(&self) -> bool {
        self.passable.as_ref().map_or(true, |p| p())
    }

    /// Installs a test deciding whether the edge can be traversed.
    pub fn set_passable(&mut self, passable: impl Fn() -> bool + 'static) {
        self.passable = Some(Box::new(passable));
    }
}

/// A graph of mutually visible points.
#[derive(Debug, Default)]
pub struct VisibilityGraph {
    vertices: Vec<Option<VisibilityVertex>>,
    edges: Vec<Option<VisibilityEdge>>,
    point_to_vertex: HashMap<PointKey, VertexId>,
    prev_edges: HashMap<VertexId, EdgeId>,
}

impl std::ops::Index<VertexId> for VisibilityGraph {
    type Output = VisibilityVertex;

    fn index(&self, id: VertexId) -> &VisibilityVertex {
        match &self.vertices[id.0] {
            Some(v) => v,
            None => panic!("{id:?} was removed"),
        }
    }
}

impl std::ops::IndexMut<VertexId> for VisibilityGraph {
    fn index_mut(&mut self, id: VertexId) -> &mut VisibilityVertex {
        match &mut self.vertices[id.0] {
            Some(v) => v,
            None => panic!("{id:?} was removed"),
        }
    }
}

impl std::ops::Index<EdgeId> for VisibilityGraph {
    type Output = VisibilityEdge;

    fn index(&self, id: EdgeId) -> &VisibilityEdge {
        match &self.edges[id.0] {
            Some(e) => e,
            None => panic!("{id:?} was removed"),
        }
    }
}

impl std::ops::IndexMut<EdgeId> for VisibilityGraph {
    fn index_mut(&mut self, id: EdgeId) -> &mut VisibilityEdge {
        match &mut self.edges[id.0] {
            Some(e) => e,
            None => panic!("{id:?} was removed"),
        }
    }
}

impl VisibilityGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph containing just the boundaries of the holes, as toll-free edges.
    pub fn of_boundaries<'a>(
        holes: impl IntoIterator<Item = &'a Polyline>,
    ) -> Result<Self, VisibilityError> {
        let mut graph = Self::new();
        for hole in holes {
            graph.add_hole(hole)?;
        }
        Ok(graph)
    }

    /// The number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.point_to_vertex.len()
    }

    /// The number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// All the vertices, in the order they were added.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| VertexId(i))
    }

    /// All the edges, grouped by source vertex.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.vertices.iter().flatten().flat_map(|v| v.out_edges())
    }

    /// The vertex with this id, if it hasn't been removed.
    pub fn vertex(&self, id: VertexId) -> Option<&VisibilityVertex> {
        self.vertices.get(id.0).and_then(Option::as_ref)
    }

    /// The edge with this id, if it hasn't been removed.
    pub fn edge(&self, id: EdgeId) -> Option<&VisibilityEdge> {
        self.edges.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access to an edge, if it hasn't been removed.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut VisibilityEdge> {
        self.edges.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Returns the vertex at `point`, creating it if necessary.
    pub fn add_vertex(&mut self, point: Point) -> VertexId {
        let key = point.key();
        if let Some(&v) = self.point_to_vertex.get(&key) {
            return v;
        }
        let id = VertexId(self.vertices.len());
        self.vertices.push(Some(VisibilityVertex::new(point)));
        self.point_to_vertex.insert(key, id);
        id
    }

    /// The vertex at exactly this point.
    pub fn find_vertex(&self, point: Point) -> Option<VertexId> {
        self.point_to_vertex.get(&point.key()).copied()
    }

    /// Is there a vertex at exactly this point?
    pub fn contains_vertex(&self, point: Point) -> bool {
        self.point_to_vertex.contains_key(&point.key())
    }

    /// Adds a regular edge between two vertices.
    ///
    /// If the vertices are already connected (in either direction), returns the
    /// existing edge.
    pub fn add_edge(
        &mut self,
        source: VertexId,
        target: VertexId,
    ) -> Result<EdgeId, VisibilityError> {
        self.add_edge_of_kind(source, target, EdgeKind::Regular)
    }

    /// Adds an edge of the given kind between two points, creating vertices as needed.
    ///
    /// If the points are already connected (in either direction), returns the
    /// existing edge whatever its kind.
    pub fn add_edge_with(
        &mut self,
        source: Point,
        target: Point,
        kind: EdgeKind,
    ) -> Result<EdgeId, VisibilityError> {
        if source.key() == target.key() {
            return Err(VisibilityError::SelfEdge { point: source });
        }
        let source = self.add_vertex(source);
        let target = self.add_vertex(target);
        self.add_edge_of_kind(source, target, kind)
    }

    fn add_edge_of_kind(
        &mut self,
        source: VertexId,
        target: VertexId,
        kind: EdgeKind,
    ) -> Result<EdgeId, VisibilityError> {
        if let Some(e) = self.try_get_edge(source, target) {
            return Ok(e);
        }
        let source_point = self[source].point;
        if source == target {
            return Err(VisibilityError::SelfEdge {
                point: source_point,
            });
        }
        let target_point = self[target].point;

        let id = EdgeId(self.edges.len());
        self.edges.push(Some(VisibilityEdge {
            source,
            target,
            source_point,
            target_point,
            kind,
            length_multiplier: 1.0,
            passable: None,
        }));
        self[source].out_edges.insert(target_point.key(), id);
        self[target].in_edges.push(id);
        Ok(id)
    }

    /// Wires the boundary of a hole with toll-free edges, including the closing side.
    pub fn add_hole(&mut self, polyline: &Polyline) -> Result<(), VisibilityError> {
        for (a, b) in polyline.sides() {
            self.add_edge_with(a, b, EdgeKind::TollFree)?;
        }
        Ok(())
    }

    /// The edge between `a` and `b`, stored in either direction.
    pub fn try_get_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        let (va, vb) = (&self[a], &self[b]);
        va.out_edge_to(vb.point).or_else(|| vb.out_edge_to(va.point))
    }

    /// The edge between the vertices at two points.
    pub fn find_edge(&self, a: Point, b: Point) -> Option<EdgeId> {
        let a = self.find_vertex(a)?;
        let b = self.find_vertex(b)?;
        self.try_get_edge(a, b)
    }

    /// Removes the edge between two vertices, if there is one.
    pub fn remove_edge(&mut self, a: VertexId, b: VertexId) -> Option<VisibilityEdge> {
        let e = self.try_get_edge(a, b)?;
        self.detach_edge(e)
    }

    /// Removes the edge between the vertices at two points, if there is one.
    pub fn remove_edge_by_points(&mut self, a: Point, b: Point) -> Option<VisibilityEdge> {
        let e = self.find_edge(a, b)?;
        self.detach_edge(e)
    }

    /// Removes a vertex along with all its edges.
    pub fn remove_vertex(&mut self, v: VertexId) {
        let Some(vertex) = self.vertex(v) else {
            return;
        };
        let touching: Vec<EdgeId> = vertex
            .out_edges()
            .chain(vertex.in_edges.iter().copied())
            .collect();
        for e in touching {
            self.detach_edge(e);
        }
        if let Some(vertex) = self.vertices[v.0].take() {
            self.point_to_vertex.remove(&vertex.point.key());
        }
        self.prev_edges.remove(&v);
    }

    /// Removes every edge, keeping the vertices.
    pub fn clear_edges(&mut self) {
        for v in self.vertices.iter_mut().flatten() {
            v.out_edges.clear();
            v.in_edges.clear();
        }
        self.edges.iter_mut().for_each(|e| *e = None);
        self.prev_edges.clear();
    }

    fn detach_edge(&mut self, e: EdgeId) -> Option<VisibilityEdge> {
        let edge = self.edges.get_mut(e.0)?.take()?;
        if let Some(source) = self.vertices[edge.source.0].as_mut() {
            source.out_edges.remove(&edge.target_point.key());
        }
        if let Some(target) = self.vertices[edge.target.0].as_mut() {
            target.in_edges.retain(|&x| x != e);
        }
        self.prev_edges.retain(|_, prev| *prev != e);
        Some(edge)
    }

    /// Records `e` as the edge by which a path search reached `v`.
    pub fn set_previous_edge(&mut self, v: VertexId, e: EdgeId) {
        debug_assert!(self[e].source == v || self[e].target == v);
        self.prev_edges.insert(v, e);
    }

    /// The vertex a path search came from when it reached `v`.
    pub fn previous_vertex(&self, v: VertexId) -> Option<VertexId> {
        let e = self.prev_edges.get(&v)?;
        Some(self.edge(*e)?.other_end(v))
    }

    /// Forgets all previous edges.
    pub fn clear_prev_edges_table(&mut self) {
        self.prev_edges.clear();
    }

    /// Scales the length of the edge by which a path search reached `v`.
    pub fn shrink_length_of_prev_edge(&mut self, v: VertexId, length_multiplier: f64) {
        if let Some(&e) = self.prev_edges.get(&v) {
            self[e].length_multiplier = length_multiplier;
        }
    }
}
