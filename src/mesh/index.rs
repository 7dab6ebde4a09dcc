//! R-tree over element bounding boxes
//!
//! Each box is bulk loaded into an [RTree] with its position as the id. A
//! query returns every box whose envelope intersects the query box, touching
//! boundaries included.

// internal modules
use crate::geometry::BoundingBox;

// external crates
use rstar::{RTree, RTreeObject, AABB};

/// Bounding box of one element, keyed by element id
#[derive(Debug, Clone, Copy)]
struct ElementEnvelope {
    id: usize,
    bbox: BoundingBox,
}

impl RTreeObject for ElementEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        to_aabb(&self.bbox)
    }
}

/// Spatial index answering box overlap queries
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: RTree<ElementEnvelope>,
}

impl SpatialIndex {
    /// Index the boxes, which are identified by their position in `boxes`
    pub fn new(boxes: Vec<BoundingBox>) -> Self {
        let envelopes = boxes
            .into_iter()
            .enumerate()
            .map(|(id, bbox)| ElementEnvelope { id, bbox })
            .collect();
        Self {
            tree: RTree::bulk_load(envelopes),
        }
    }

    /// Ids of every indexed box overlapping `query`, in increasing order
    pub fn query(&self, query: &BoundingBox) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&to_aabb(query))
            .map(|e| e.id)
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[doc(hidden)]
fn to_aabb(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min.x, bbox.min.y], [bbox.max.x, bbox.max.y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox {
            min: Point::new(x0, y0),
            max: Point::new(x1, y1),
        }
    }

    /// Unit boxes on a 10 x 10 checkerboard
    fn board_boxes() -> Vec<BoundingBox> {
        let mut boxes = Vec::new();
        for j in 0..10 {
            for i in 0..10 {
                let (x, y) = (i as f64, j as f64);
                boxes.push(bbox(x, y, x + 1.0, y + 1.0));
            }
        }
        boxes
    }

    #[test]
    fn query_matches_brute_force() {
        let boxes = board_boxes();
        let index = SpatialIndex::new(boxes.clone());
        assert_eq!(index.len(), 100);

        let query = bbox(2.5, 3.5, 4.2, 3.7);
        let expected: Vec<usize> = (0..100).filter(|&id| boxes[id].overlaps(&query)).collect();
        assert_eq!(index.query(&query), expected);
        assert_eq!(expected, vec![32, 33, 34]);
    }

    #[test]
    fn touching_boxes_are_found() {
        let index = SpatialIndex::new(board_boxes());
        // corner shared by four boxes
        assert_eq!(index.query(&bbox(5.0, 5.0, 5.0, 5.0)), vec![44, 45, 54, 55]);
    }

    #[test]
    fn query_outside() {
        let index = SpatialIndex::new(board_boxes());
        assert!(index.query(&bbox(20.0, 20.0, 30.0, 30.0)).is_empty());
        assert_eq!(index.query(&bbox(-5.0, -5.0, 0.5, 0.5)), vec![0]);
    }

    #[test]
    fn degenerate_extent() {
        // every box on the same vertical line
        let index = SpatialIndex::new(vec![bbox(1.0, 0.0, 1.0, 1.0), bbox(1.0, 2.0, 1.0, 3.0)]);
        assert_eq!(index.query(&bbox(0.0, 2.5, 2.0, 2.6)), vec![1]);

        let empty = SpatialIndex::new(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.query(&bbox(0.0, 0.0, 1.0, 1.0)).is_empty());
    }
}
