//! Triangular mesh library
//!
//! # Overview
//!
//! Module for locating cross-sections on the triangles of a Serafin mesh. The
//! [TriangleMesh] is built from the 2D connectivity of a [Header] (the base
//! plane for 3D files) and answers one question: which triangles does a
//! polyline cross, and where.
//!
//! ```rust
//! # use serafin::geometry::{Point, Section};
//! # use serafin::header::HeaderBuilder;
//! # use serafin::mesh::TriangleMesh;
//! let header = HeaderBuilder::new("unit square")
//!     .triangles(&[[0, 1, 2], [0, 2, 3]])
//!     .coordinates(vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0])
//!     .build()
//!     .unwrap();
//! let mesh = TriangleMesh::new(&header);
//!
//! // a line crossing the diagonal touches both triangles
//! let section = Section::new(vec![Point::new(0.8, 0.2), Point::new(0.2, 0.8)]).unwrap();
//! let intersection = mesh.section_intersection(&section);
//! assert_eq!(intersection.triangles.len(), 2);
//! ```
//!
//! Candidate triangles are found with a [SpatialIndex] over the triangle
//! bounding boxes, so only the triangles near a section are ever clipped.

// Split into subfiles for development, but anything important is re-exported
mod index;
mod interpolator;
mod intersection;

// standard library
use std::collections::{HashMap, HashSet};

// internal modules
use crate::geometry::{BoundingBox, Point};
use crate::header::Header;

// external crates
use log::debug;

#[doc(inline)]
pub use crate::mesh::index::SpatialIndex;

#[doc(inline)]
pub use crate::mesh::interpolator::Interpolator;

#[doc(inline)]
pub use crate::mesh::intersection::{ChainPoint, Intersection, LinePoint, TriangleIntersection};

/// Triangles of a mesh with a spatial index over them
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    points: Vec<Point>,
    triangles: Vec<[usize; 3]>,
    index: SpatialIndex,
    /// Node pairs, smallest first, used by more than one triangle
    shared_edges: HashSet<(usize, usize)>,
}

impl TriangleMesh {
    /// Build the mesh from the base plane of a header
    pub fn new(header: &Header) -> Self {
        let points = header
            .x()
            .iter()
            .zip(header.y())
            .take(header.node_count_2d())
            .map(|(x, y)| Point::new(*x, *y))
            .collect();
        Self::from_parts(points, header.ikle_2d())
    }

    /// Node indices of every triangle must be valid for `points`
    pub(crate) fn from_parts(points: Vec<Point>, triangles: Vec<[usize; 3]>) -> Self {
        let boxes = triangles
            .iter()
            .map(|t| {
                let corners = t.map(|n| points[n]);
                BoundingBox::from_points(&corners).unwrap_or(BoundingBox {
                    min: corners[0],
                    max: corners[0],
                })
            })
            .collect();
        let index = SpatialIndex::new(boxes);

        let mut edge_count: HashMap<(usize, usize), u32> = HashMap::new();
        for t in &triangles {
            for k in 0..3 {
                *edge_count.entry(edge_key(t[k], t[(k + 1) % 3])).or_default() += 1;
            }
        }
        let shared_edges: HashSet<(usize, usize)> = edge_count
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(edge, _)| edge)
            .collect();

        debug!(
            "Indexed {} triangles on {} nodes ({} shared edges)",
            triangles.len(),
            points.len(),
            shared_edges.len()
        );

        Self {
            points,
            triangles,
            index,
            shared_edges,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of nodes in the mesh plane
    pub fn node_count(&self) -> usize {
        self.points.len()
    }

    /// 0-based node indices of each triangle
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner coordinates of one triangle, in node order
    pub fn triangle_points(&self, triangle: usize) -> [Point; 3] {
        self.triangles[triangle].map(|n| self.points[n])
    }

    /// Triangles whose bounding box overlaps `bbox`
    pub fn candidates(&self, bbox: &BoundingBox) -> Vec<usize> {
        self.index.query(bbox)
    }

    /// True if the edge between two nodes belongs to more than one triangle
    pub fn is_shared_edge(&self, a: usize, b: usize) -> bool {
        self.shared_edges.contains(&edge_key(a, b))
    }
}

#[doc(hidden)]
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Precision;
    use crate::testing::square_header;

    #[test]
    fn square_mesh() {
        let mesh = TriangleMesh::new(&square_header(Precision::Single));
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.node_count(), 4);
        assert_eq!(mesh.triangles(), &[[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.triangle_points(1)[2], Point::new(0.0, 1.0));
    }

    #[test]
    fn only_the_diagonal_is_shared() {
        let mesh = TriangleMesh::new(&square_header(Precision::Single));
        assert!(mesh.is_shared_edge(0, 2));
        assert!(mesh.is_shared_edge(2, 0));
        assert!(!mesh.is_shared_edge(0, 1));
        assert!(!mesh.is_shared_edge(2, 3));
    }

    #[test]
    fn candidates() {
        let mesh = TriangleMesh::new(&square_header(Precision::Single));
        let inside = BoundingBox {
            min: Point::new(0.9, 0.1),
            max: Point::new(0.9, 0.1),
        };
        let outside = BoundingBox {
            min: Point::new(1.5, -0.5),
            max: Point::new(2.0, 0.5),
        };
        assert_eq!(mesh.candidates(&inside), vec![0, 1]);
        assert!(mesh.candidates(&outside).is_empty());
    }
}
