//! Linear interpolation inside a triangle

// internal modules
use crate::geometry::{cross, Point};

/// Barycentric coordinates relative to one triangle
///
/// Weights are returned in the order the triangle nodes were given, so they
/// line up with the node values of the same triangle.
///
/// ```rust
/// # use serafin::geometry::Point;
/// # use serafin::mesh::Interpolator;
/// let triangle = [Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(0.0, 2.0)];
/// let interpolator = Interpolator::new(triangle).unwrap();
///
/// let weights = interpolator.weights(Point::new(0.5, 0.5));
/// assert_eq!(weights, [0.5, 0.25, 0.25]);
/// assert_eq!(Interpolator::interpolate(&weights, [1.0, 3.0, 5.0]), 2.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    origin: Point,
    e1: [f64; 2],
    e2: [f64; 2],
    area2: f64,
}

impl Interpolator {
    /// `None` for a triangle with zero area
    pub fn new(triangle: [Point; 3]) -> Option<Self> {
        let [a, b, c] = triangle;
        let e1 = b.sub(&a);
        let e2 = c.sub(&a);
        let area2 = cross(e1, e2);
        if area2 == 0.0 || !area2.is_finite() {
            return None;
        }
        Some(Self {
            origin: a,
            e1,
            e2,
            area2,
        })
    }

    /// Weights of the three nodes at `point`, summing to one
    pub fn weights(&self, point: Point) -> [f64; 3] {
        let p = point.sub(&self.origin);
        let w1 = cross(p, self.e2) / self.area2;
        let w2 = cross(self.e1, p) / self.area2;
        [1.0 - w1 - w2, w1, w2]
    }

    /// Combine node values with precomputed weights
    #[inline]
    pub fn interpolate(weights: &[f64; 3], values: [f64; 3]) -> f64 {
        weights[0] * values[0] + weights[1] * values[1] + weights[2] * values[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn clockwise() -> Interpolator {
        Interpolator::new([
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 0.0),
        ])
        .unwrap()
    }

    #[rstest]
    #[case(Point::new(0.0, 0.0), [1.0, 0.0, 0.0])]
    #[case(Point::new(0.0, 1.0), [0.0, 1.0, 0.0])]
    #[case(Point::new(1.0, 0.0), [0.0, 0.0, 1.0])]
    #[case(Point::new(0.5, 0.5), [0.0, 0.5, 0.5])]
    fn weights_follow_node_order(#[case] point: Point, #[case] expected: [f64; 3]) {
        assert_eq!(clockwise().weights(point), expected);
    }

    #[test]
    fn linear_fields_are_exact() {
        let nodes = [Point::new(1.0, 1.0), Point::new(4.0, 2.0), Point::new(2.0, 5.0)];
        let field = |p: &Point| 3.0 - 2.0 * p.x + 0.5 * p.y;
        let interpolator = Interpolator::new(nodes).unwrap();
        let values = [field(&nodes[0]), field(&nodes[1]), field(&nodes[2])];

        let p = Point::new(2.3, 2.9);
        let weights = interpolator.weights(p);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((Interpolator::interpolate(&weights, values) - field(&p)).abs() < 1e-12);
    }

    #[test]
    fn flat_triangle() {
        let nodes = [Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0)];
        assert!(Interpolator::new(nodes).is_none());
    }
}
