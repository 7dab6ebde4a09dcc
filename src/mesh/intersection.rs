//! Intersection of polyline sections with the mesh triangles
//!
//! Every segment of a section is clipped against the candidate triangles,
//! and consecutive pieces inside the same triangle are joined into chains.
//! Each chain point carries the segment normal ending at that point and the
//! barycentric weights of the point in its triangle, which is all the flux
//! formulas need.
//!
//! Pieces lying exactly on a triangle edge would be found in both triangles
//! sharing that edge. They are kept only by the triangle whose interior is to
//! the left of the piece, so a section running along an internal edge is
//! counted once. On a boundary edge there is no other triangle and the piece
//! is always kept.

// internal modules
use crate::geometry::{cross, Point, Section};
use crate::mesh::{Interpolator, TriangleMesh};

// external crates
use log::{debug, trace};
use serde::Serialize;

/// Scale of the tolerance used for parallel and on-edge tests
const RELATIVE_TOLERANCE: f64 = 1e-9;

/// One point of a chain of segments inside a triangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainPoint {
    pub point: Point,
    /// Distance from the first point of the section, along the section
    pub distance: f64,
    /// Normal `(-dy, dx)` of the segment ending here, zero for the first point
    pub edge: [f64; 2],
    /// Barycentric weights in the node order of the triangle
    pub weights: [f64; 3],
}

impl ChainPoint {
    /// Length of the segment ending here
    pub fn segment_length(&self) -> f64 {
        self.edge[0].hypot(self.edge[1])
    }
}

/// Chains of a section inside one triangle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriangleIntersection {
    /// Index of the triangle in the mesh
    pub triangle: usize,
    /// 0-based node indices of the triangle
    pub nodes: [usize; 3],
    /// Disjoint chains in section order, each with at least two points
    pub chains: Vec<Vec<ChainPoint>>,
}

/// A chain point with the triangle used to interpolate at it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub point: Point,
    /// Distance from the first point of the section, along the section
    pub distance: f64,
    /// 0-based node indices of the triangle holding the point
    pub nodes: [usize; 3],
    /// Barycentric weights in the order of `nodes`
    pub weights: [f64; 3],
}

impl LinePoint {
    /// Value of a node field at the point
    pub fn interpolate(&self, field: &[f64]) -> f64 {
        let [i, j, k] = self.nodes;
        Interpolator::interpolate(&self.weights, [field[i], field[j], field[k]])
    }
}

/// Every triangle crossed by a section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Intersection {
    pub triangles: Vec<TriangleIntersection>,
    /// Number of nodes of the mesh the triangle nodes refer to
    pub node_count: usize,
}

impl Intersection {
    /// True when the section does not cross the mesh
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Number of segments over every chain
    pub fn segment_count(&self) -> usize {
        self.triangles
            .iter()
            .flat_map(|t| &t.chains)
            .map(|chain| chain.len() - 1)
            .sum()
    }

    /// Length of the section inside the mesh
    pub fn length(&self) -> f64 {
        self.triangles
            .iter()
            .flat_map(|t| &t.chains)
            .flat_map(|chain| chain.iter().skip(1))
            .map(|p| p.segment_length())
            .sum()
    }

    /// Every chain point once, in section order
    ///
    /// A point where the section moves from one triangle to the next closes
    /// a chain in the first and opens one in the second. It is kept once,
    /// with the triangle it was first reached in.
    pub fn line_points(&self) -> Vec<LinePoint> {
        let mut points: Vec<LinePoint> = self
            .triangles
            .iter()
            .flat_map(|t| {
                t.chains.iter().flatten().map(|p| LinePoint {
                    point: p.point,
                    distance: p.distance,
                    nodes: t.nodes,
                    weights: p.weights,
                })
            })
            .collect();
        points.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        let scale = points.last().map_or(0.0, |p| p.distance.abs()).max(1.0);
        points.dedup_by(|next, kept| {
            (next.distance - kept.distance).abs() <= RELATIVE_TOLERANCE * scale
        });
        points
    }
}

impl TriangleMesh {
    /// Locate a section on the mesh
    ///
    /// Triangles are listed in increasing index order. A section that misses
    /// the mesh entirely gives an empty [Intersection].
    pub fn section_intersection(&self, section: &Section) -> Intersection {
        let mut triangles = Vec::new();

        for t in self.candidates(&section.bounds()) {
            let corners = self.triangle_points(t);
            let Some(interpolator) = Interpolator::new(corners) else {
                trace!("Skipping flat triangle {t}");
                continue;
            };

            let chains = self.clip_section(t, section);
            if chains.is_empty() {
                continue;
            }

            let chains = chains
                .into_iter()
                .map(|chain| chain_points(chain, &interpolator))
                .collect();
            triangles.push(TriangleIntersection {
                triangle: t,
                nodes: self.triangles()[t],
                chains,
            });
        }

        debug!(
            "Section of {} points crosses {} triangles",
            section.points().len(),
            triangles.len()
        );
        Intersection {
            triangles,
            node_count: self.node_count(),
        }
    }

    /// Pieces of the section inside one triangle, joined into point chains
    ///
    /// Each point comes with its distance along the section.
    fn clip_section(&self, t: usize, section: &Section) -> Vec<Vec<(Point, f64)>> {
        let nodes = self.triangles()[t];
        let [a, b, c] = self.triangle_points(t);

        // walk the corners counter-clockwise so the interior is on the left
        let (corners, nodes) = match cross(b.sub(&a), c.sub(&a)) > 0.0 {
            true => ([a, b, c], nodes),
            false => ([a, c, b], [nodes[0], nodes[2], nodes[1]]),
        };
        let diameter = a.distance(&b).max(b.distance(&c)).max(c.distance(&a));
        let tolerance = RELATIVE_TOLERANCE * diameter;
        let centroid = Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);

        let mut chains: Vec<Vec<(Point, f64)>> = Vec::new();
        let mut offset = 0.0;
        for (p, q) in section.segments() {
            let segment_start = offset;
            offset += p.distance(q);
            let Some((start, end)) = clip_segment(&corners, p, q, tolerance) else {
                continue;
            };
            if start.distance(&end) <= tolerance {
                continue;
            }

            if let Some(k) = edge_holding(&corners, &start, &end, tolerance) {
                let (i, j) = (nodes[k], nodes[(k + 1) % 3]);
                let interior_on_left = cross(end.sub(&start), centroid.sub(&start)) > 0.0;
                if self.is_shared_edge(i, j) && !interior_on_left {
                    trace!("Piece {start} -> {end} on edge {i}-{j} left to the neighbour");
                    continue;
                }
            }

            let start = (start, segment_start + p.distance(&start));
            let end = (end, segment_start + p.distance(&end));
            let last_point = chains.last().and_then(|chain| chain.last()).map(|(point, _)| *point);
            let extends_last = last_point == Some(start.0);
            match chains.last_mut() {
                Some(chain) if extends_last => chain.push(end),
                _ => chains.push(vec![start, end]),
            }
        }

        chains
    }
}

/// Part of the segment `p -> q` inside a counter-clockwise triangle
///
/// Liang-Barsky clipping against the three half-planes. Endpoints inside the
/// triangle are returned unchanged so consecutive pieces stay connected.
fn clip_segment(
    corners: &[Point; 3],
    p: &Point,
    q: &Point,
    tolerance: f64,
) -> Option<(Point, Point)> {
    let d = q.sub(p);
    let d_length = d[0].hypot(d[1]);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for k in 0..3 {
        let origin = corners[k];
        let edge = corners[(k + 1) % 3].sub(&origin);
        let edge_length = edge[0].hypot(edge[1]);

        // signed distance of p from the edge line, scaled by the edge length
        let inside = cross(edge, p.sub(&origin));
        let rate = cross(edge, d);

        if rate.abs() <= RELATIVE_TOLERANCE * edge_length * d_length {
            if inside < -tolerance * edge_length {
                return None;
            }
            continue;
        }

        let t = -inside / rate;
        if rate > 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }

    let start = if t0 <= 0.0 { *p } else { along(p, d, t0) };
    let end = if t1 >= 1.0 { *q } else { along(p, d, t1) };
    Some((start, end))
}

#[inline]
fn along(p: &Point, d: [f64; 2], t: f64) -> Point {
    Point::new(p.x + t * d[0], p.y + t * d[1])
}

/// Edge `k` (from corner `k` to corner `k + 1`) holding both ends of a piece
fn edge_holding(
    corners: &[Point; 3],
    start: &Point,
    end: &Point,
    tolerance: f64,
) -> Option<usize> {
    (0..3).find(|&k| {
        let origin = corners[k];
        let edge = corners[(k + 1) % 3].sub(&origin);
        let edge_length = edge[0].hypot(edge[1]);
        let bound = tolerance * edge_length;
        cross(edge, start.sub(&origin)).abs() <= bound
            && cross(edge, end.sub(&origin)).abs() <= bound
    })
}

/// Attach normals and interpolation weights to a chain of points
fn chain_points(chain: Vec<(Point, f64)>, interpolator: &Interpolator) -> Vec<ChainPoint> {
    let mut previous: Option<Point> = None;
    chain
        .into_iter()
        .map(|(point, distance)| {
            let edge = match previous {
                Some(prev) => [prev.y - point.y, point.x - prev.x],
                None => [0.0, 0.0],
            };
            previous = Some(point);
            ChainPoint {
                point,
                distance,
                edge,
                weights: interpolator.weights(point),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Precision;
    use crate::testing::square_header;
    use rstest::rstest;

    fn square() -> TriangleMesh {
        TriangleMesh::new(&square_header(Precision::Single))
    }

    /// One large counter-clockwise triangle
    fn big_triangle() -> TriangleMesh {
        TriangleMesh::from_parts(
            vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(0.0, 4.0)],
            vec![[0, 1, 2]],
        )
    }

    fn section(points: &[(f64, f64)]) -> Section {
        Section::new(points.iter().map(|(x, y)| Point::new(*x, *y)).collect()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn crossing_the_diagonal() {
        let intersection = square().section_intersection(&section(&[(0.8, 0.2), (0.2, 0.8)]));
        assert_eq!(intersection.triangles.len(), 2);

        let first = &intersection.triangles[0];
        assert_eq!(first.triangle, 0);
        assert_eq!(first.chains.len(), 1);
        let chain = &first.chains[0];
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].point, Point::new(0.8, 0.2));
        assert_eq!(chain[0].edge, [0.0, 0.0]);
        assert!(close(chain[1].point.x, 0.5) && close(chain[1].point.y, 0.5));

        // normal of a segment going up and left points down and left
        assert!(chain[1].edge[0] < 0.0 && chain[1].edge[1] < 0.0);
        assert!(close(intersection.length(), 0.72_f64.sqrt()));
        assert_eq!(intersection.segment_count(), 2);
    }

    #[test]
    fn weights_reproduce_the_points() {
        let mesh = square();
        let intersection = mesh.section_intersection(&section(&[(0.1, 0.5), (0.9, 0.45)]));
        for triangle in &intersection.triangles {
            let corners = mesh.triangle_points(triangle.triangle);
            for p in triangle.chains.iter().flatten() {
                let x = Interpolator::interpolate(&p.weights, corners.map(|c| c.x));
                let y = Interpolator::interpolate(&p.weights, corners.map(|c| c.y));
                assert!(close(x, p.point.x) && close(y, p.point.y));
            }
        }
    }

    #[test]
    fn section_outside_the_mesh() {
        let intersection = square().section_intersection(&section(&[(2.0, 2.0), (3.0, 5.0)]));
        assert!(intersection.is_empty());
        assert_eq!(intersection.length(), 0.0);
    }

    #[test]
    fn partially_outside() {
        let intersection = square().section_intersection(&section(&[(-0.5, 0.3), (1.5, 0.6)]));
        assert!(close(intersection.length(), (1.0_f64 + 0.15 * 0.15).sqrt()));
    }

    #[test]
    fn chain_follows_polyline_vertices() {
        let intersection =
            big_triangle().section_intersection(&section(&[(0.5, 0.5), (1.0, 1.0), (1.5, 0.5)]));
        let chains = &intersection.triangles[0].chains;
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 3);
        assert_eq!(chains[0][1].point, Point::new(1.0, 1.0));
        assert_eq!(chains[0][2].edge, [0.5, 0.5]);
    }

    #[test]
    fn distance_along_the_section() {
        let intersection =
            big_triangle().section_intersection(&section(&[(-1.0, 1.0), (1.0, 1.0), (1.0, 2.0)]));
        let chain = &intersection.triangles[0].chains[0];
        assert_eq!(chain.len(), 3);
        assert!(close(chain[0].distance, 1.0));
        assert!(close(chain[1].distance, 2.0));
        assert!(close(chain[2].distance, 3.0));
        assert_eq!(intersection.node_count, 3);
    }

    #[test]
    fn line_points_in_section_order() {
        let mesh = square();
        let line = section(&[(0.8, 0.2), (0.2, 0.8), (0.2, 1.5)]);
        let intersection = mesh.section_intersection(&line);
        let points = intersection.line_points();

        // start, diagonal crossing, last vertex, exit through the top edge
        assert_eq!(points.len(), 4);
        assert!(points.windows(2).all(|w| w[0].distance < w[1].distance));
        assert_eq!(points[0].point, Point::new(0.8, 0.2));
        assert!(close(points[1].point.x, 0.5) && close(points[1].point.y, 0.5));
        assert_eq!(points[2].point, Point::new(0.2, 0.8));
        assert!(close(points[3].point.y, 1.0));
        assert!(close(points[3].distance, 0.72_f64.sqrt() + 0.2));

        // node coordinates come back out of the interpolation
        let x: Vec<f64> = mesh.points().iter().map(|p| p.x).collect();
        for p in &points {
            assert!(close(p.interpolate(&x), p.point.x));
        }
    }

    #[test]
    fn leaving_and_coming_back_gives_two_chains() {
        let intersection =
            big_triangle().section_intersection(&section(&[(0.5, 1.0), (3.0, 3.0), (1.0, 0.5)]));
        let chains = &intersection.triangles[0].chains;
        assert_eq!(chains.len(), 2);

        let exit = chains[0][1].point;
        let entry = chains[1][0].point;
        assert!(close(exit.x + exit.y, 4.0));
        assert!(close(entry.x + entry.y, 4.0));
        assert_eq!(chains[1][1].point, Point::new(1.0, 0.5));
    }

    #[rstest]
    #[case(&[(0.0, 0.0), (1.0, 1.0)])]
    #[case(&[(1.0, 1.0), (0.0, 0.0)])]
    #[case(&[(-1.0, -1.0), (2.0, 2.0)])]
    fn internal_edge_counted_once(#[case] points: &[(f64, f64)]) {
        let intersection = square().section_intersection(&section(points));
        assert_eq!(intersection.triangles.len(), 1);
        assert!(close(intersection.length(), 2.0_f64.sqrt()));
    }

    #[rstest]
    #[case(&[(0.0, 0.0), (1.0, 0.0)])]
    #[case(&[(1.0, 0.0), (0.0, 0.0)])]
    fn boundary_edge_is_kept(#[case] points: &[(f64, f64)]) {
        let intersection = square().section_intersection(&section(points));
        assert_eq!(intersection.triangles.len(), 1);
        assert_eq!(intersection.triangles[0].triangle, 0);
        assert!(close(intersection.length(), 1.0));
    }

    #[test]
    fn touching_a_corner_only() {
        let intersection = square().section_intersection(&section(&[(1.0, 1.0), (2.0, 3.0)]));
        assert!(intersection.is_empty());
    }
}
