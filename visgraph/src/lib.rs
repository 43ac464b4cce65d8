#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod diagonal;
mod error;
mod geom;
mod graph;
mod obstacles;
mod point_visibility;
mod polygon;
mod rb_tree;
mod sequence;
mod tangent_pair;
mod tangent_visibility;
mod tolerance;

pub use error::VisibilityError;
pub use geom::{
    compare_vectors_by_angle_to_x_axis, signed_doubled_triangle_area, Point, PointKey, Polyline,
};
pub use graph::{EdgeId, EdgeKind, VertexId, VisibilityEdge, VisibilityGraph, VisibilityVertex};
pub use obstacles::{
    calculate_graph_of_boundaries, check_that_polyline_is_convex,
    fill_visibility_graph_for_shortest_path, get_visibility_graph_for_shortest_path,
    orient_holes_clockwise,
};
pub use point_visibility::{PointVisibilityCalculator, VisibilityKind};
pub use polygon::Polygon;
pub use rb_tree::{NodeId, RbTree};
pub use sequence::{BimodalSequence, UnimodalSequence};
pub use tangent_pair::{Chunks, DividingBisector, TangentPair, Tangents};
pub use tangent_visibility::{
    add_tangent_visibility_edges_to_graph, InteractiveTangentVisibilityGraphCalculator,
    TangentVisibilityGraphCalculator,
};
pub use tolerance::{GeometryTolerance, Orientation};

#[cfg(test)]
mod exact;

#[cfg(test)]
pub mod perturbation;
