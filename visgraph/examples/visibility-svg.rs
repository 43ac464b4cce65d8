use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::fmt::SubscriberBuilder;
use visgraph::{
    fill_visibility_graph_for_shortest_path, get_visibility_graph_for_shortest_path, EdgeKind,
    GeometryTolerance, Point, Polyline, VisibilityGraph,
};

/// Draws the visibility graph of some convex obstacles.
///
/// The input has one obstacle per line, given as its corners: `x,y x,y x,y ...`.
/// Blank lines and lines starting with `#` are skipped.
#[derive(Parser)]
struct Args {
    input: PathBuf,
    output: PathBuf,

    /// Start of a path to wire into the graph.
    #[arg(long, value_parser = parse_point, requires = "to")]
    from: Option<Point>,

    /// End of a path to wire into the graph.
    #[arg(long, value_parser = parse_point, requires = "from")]
    to: Option<Point>,

    #[arg(long)]
    epsilon: Option<f64>,
}

fn parse_point(s: &str) -> anyhow::Result<Point> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| anyhow!("expected `x,y`, got `{s}`"))?;
    Ok(Point::new(x.trim().parse()?, y.trim().parse()?))
}

fn parse_obstacles(input: &str) -> anyhow::Result<Vec<Polyline>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|(i, line)| {
            let points = line
                .split_whitespace()
                .map(parse_point)
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("line {}", i + 1))?;
            Ok(Polyline::new(points))
        })
        .collect()
}

fn line(a: Point, b: Point) -> svg::node::element::path::Data {
    svg::node::element::path::Data::new()
        .move_to((a.x, a.y))
        .line_to((b.x, b.y))
}

pub fn main() -> anyhow::Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let args = Args::parse();

    let input = std::fs::read_to_string(&args.input)?;
    let obstacles = parse_obstacles(&input)?;
    let mut tol = GeometryTolerance::default();
    if let Some(eps) = args.epsilon {
        tol.distance_epsilon = eps;
    }

    let (graph, ends): (VisibilityGraph, Vec<Point>) = match (args.from, args.to) {
        (Some(from), Some(to)) => {
            let (graph, _, _) = get_visibility_graph_for_shortest_path(from, to, &obstacles, tol)?;
            (graph, vec![from, to])
        }
        _ => (fill_visibility_graph_for_shortest_path(&obstacles, tol)?, vec![]),
    };
    tracing::info!(
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "built the graph"
    );

    let points: Vec<Point> = graph.vertices().map(|v| graph[v].point()).collect();
    if points.is_empty() {
        anyhow::bail!("nothing to draw");
    }
    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    let pad = 1.0;
    let stroke_width = (max_y - min_y).max(max_x - min_x).max(1.0) / 512.0;
    let dot_radius = stroke_width * 3.0;
    let mut document = svg::Document::new().set(
        "viewBox",
        (
            min_x - pad,
            min_y - pad,
            max_x - min_x + 2.0 * pad,
            max_y - min_y + 2.0 * pad,
        ),
    );

    for obstacle in &obstacles {
        let mut data = svg::node::element::path::Data::new();
        for (i, p) in obstacle.points().iter().enumerate() {
            data = if i == 0 {
                data.move_to((p.x, p.y))
            } else {
                data.line_to((p.x, p.y))
            };
        }
        let path = svg::node::element::Path::new()
            .set("fill", "grey")
            .set("fill-opacity", 0.3)
            .set("stroke", "none")
            .set("d", data.close());
        document = document.add(path);
    }

    for e in graph.edges() {
        let edge = &graph[e];
        let (color, width) = match edge.kind() {
            EdgeKind::Regular => ("blue", stroke_width / 2.0),
            EdgeKind::TollFree => ("black", stroke_width),
        };
        let path = svg::node::element::Path::new()
            .set("stroke", color)
            .set("stroke-width", width)
            .set("stroke-opacity", 0.6)
            .set("d", line(edge.source_point(), edge.target_point()));
        document = document.add(path);
    }

    for p in points {
        let color = if ends.contains(&p) { "red" } else { "black" };
        let c = svg::node::element::Circle::new()
            .set("r", dot_radius)
            .set("cx", p.x)
            .set("cy", p.y)
            .set("fill", color);
        document = document.add(c);
    }

    svg::save(&args.output, &document)?;
    Ok(())
}
