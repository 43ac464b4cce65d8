//! Building visibility graphs from obstacles.

use crate::{
    error::VisibilityError,
    geom::{Point, Polyline},
    graph::{VertexId, VisibilityGraph},
    point_visibility::{PointVisibilityCalculator, VisibilityKind},
    tangent_visibility::add_tangent_visibility_edges_to_graph,
    tolerance::{GeometryTolerance, Orientation},
};

/// Checks that a closed polyline turns the same way at every vertex.
///
/// Collinear triples are skipped, so a polyline with repeated or aligned points
/// can still pass.
pub fn check_that_polyline_is_convex(polyline: &Polyline, tol: GeometryTolerance) -> bool {
    let mut orientation = Orientation::Collinear;
    for i in 0..polyline.len() {
        let current = tol.orientation(
            polyline.point(i),
            polyline.point(i + 1),
            polyline.point(i + 2),
        );
        match (orientation, current) {
            (_, Orientation::Collinear) => {}
            (Orientation::Collinear, current) => orientation = current,
            (orientation, current) if orientation != current => return false,
            _ => {}
        }
    }
    true
}

/// Validates the obstacles and returns them all oriented clockwise.
///
/// The orientation of each obstacle is decided by its first non-collinear
/// triple of consecutive points.
pub fn orient_holes_clockwise(
    obstacles: &[Polyline],
    tol: GeometryTolerance,
) -> Result<Vec<Polyline>, VisibilityError> {
    let mut reversed = 0;
    let holes = obstacles
        .iter()
        .enumerate()
        .map(|(i, poly)| {
            if poly.len() < 3 {
                return Err(VisibilityError::DegenerateObstacle { obstacle: i });
            }
            if !check_that_polyline_is_convex(poly, tol) {
                return Err(VisibilityError::NonConvexObstacle { obstacle: i });
            }
            let orientation = (0..poly.len())
                .map(|j| tol.orientation(poly.point(j), poly.point(j + 1), poly.point(j + 2)))
                .find(|o| *o != Orientation::Collinear);
            match orientation {
                Some(Orientation::Clockwise) => Ok(poly.clone()),
                Some(_) => {
                    reversed += 1;
                    Ok(poly.reversed())
                }
                None => Err(VisibilityError::DegenerateObstacle { obstacle: i }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(obstacles = holes.len(), reversed, "oriented holes");
    Ok(holes)
}

/// A graph containing just the hole boundaries, as toll-free edges.
pub fn calculate_graph_of_boundaries(holes: &[Polyline]) -> Result<VisibilityGraph, VisibilityError> {
    VisibilityGraph::of_boundaries(holes)
}

/// Builds the visibility graph among the obstacles.
///
/// The graph has the obstacle boundaries (as toll-free edges) and every
/// unobstructed common tangent of two obstacles.
pub fn fill_visibility_graph_for_shortest_path(
    obstacles: &[Polyline],
    tol: GeometryTolerance,
) -> Result<VisibilityGraph, VisibilityError> {
    let holes = orient_holes_clockwise(obstacles, tol)?;
    let mut graph = calculate_graph_of_boundaries(&holes)?;
    add_tangent_visibility_edges_to_graph(&holes, &mut graph, tol)?;
    tracing::debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "filled visibility graph"
    );
    Ok(graph)
}

/// Builds the visibility graph among the obstacles and wires in the two ends of a path.
///
/// Returns the graph along with the vertices of `path_start` and `path_end`. The
/// ends are only connected along lines that touch obstacles tangentially.
pub fn get_visibility_graph_for_shortest_path(
    path_start: Point,
    path_end: Point,
    obstacles: &[Polyline],
    tol: GeometryTolerance,
) -> Result<(VisibilityGraph, VertexId, VertexId), VisibilityError> {
    let holes = orient_holes_clockwise(obstacles, tol)?;
    let mut graph = calculate_graph_of_boundaries(&holes)?;
    add_tangent_visibility_edges_to_graph(&holes, &mut graph, tol)?;

    let source = PointVisibilityCalculator::calculate_point_visibility_graph(
        &holes,
        &mut graph,
        path_start,
        VisibilityKind::Tangent,
        tol,
    )?;
    let target = PointVisibilityCalculator::calculate_point_visibility_graph(
        &holes,
        &mut graph,
        path_end,
        VisibilityKind::Tangent,
        tol,
    )?;
    tracing::debug!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        source_degree = graph[source].degree(),
        target_degree = graph[target].degree(),
        "built visibility graph for a path"
    );
    Ok((graph, source, target))
}
