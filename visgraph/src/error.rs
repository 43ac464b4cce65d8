use thiserror::Error;

use crate::geom::Point;

/// Errors from building a visibility graph.
///
/// All of these indicate bad input (or a bug), not a transient condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VisibilityError {
    /// An edge from a vertex to itself was requested.
    #[error("self-edges are not allowed (at {point:?})")]
    SelfEdge {
        /// The location of the vertex.
        point: Point,
    },

    /// An obstacle boundary turns both ways.
    #[error("obstacle {obstacle} is not convex")]
    NonConvexObstacle {
        /// The index of the obstacle in the input.
        obstacle: usize,
    },

    /// An obstacle has fewer than three points, or all its points are collinear.
    #[error("obstacle {obstacle} is degenerate")]
    DegenerateObstacle {
        /// The index of the obstacle in the input.
        obstacle: usize,
    },

    /// The point-visibility sweep reached a boundary vertex that neither
    /// continues nor opens an active side.
    #[error("inconsistent sweep state at {point:?}")]
    InconsistentSweep {
        /// The boundary vertex being swept.
        point: Point,
    },
}
