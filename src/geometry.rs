//! Planar geometry used by the mesh tools
//!
//! Only what the intersection engine and the coordinate transforms need:
//! points, axis-aligned bounding boxes, open polyline sections, and a
//! [Transformation] trait with an [Affine] implementation.

// internal modules
use crate::error::{Result, SerafinError};
use crate::utils::f;

// external crates
use serde::Serialize;

/// A point in the horizontal plane
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Vector from `other` to `self`
    pub fn sub(&self, other: &Point) -> [f64; 2] {
        [self.x - other.x, self.y - other.y]
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// z component of the cross product of two planar vectors
#[inline]
pub fn cross(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Smallest box holding every point, `None` if there are no points
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bbox = Self {
            min: *first,
            max: *first,
        };
        for p in points {
            bbox.min.x = bbox.min.x.min(p.x);
            bbox.min.y = bbox.min.y.min(p.y);
            bbox.max.x = bbox.max.x.max(p.x);
            bbox.max.y = bbox.max.y.max(p.y);
        }
        Some(bbox)
    }

    /// Boxes touching along an edge or a corner count as overlapping
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Smallest box holding both boxes
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// An open polyline used as a cross-section
///
/// At least two points are required and the line may not close on itself.
/// The point order defines the orientation of the normal used for fluxes.
///
/// ```rust
/// # use serafin::geometry::{Point, Section};
/// let section = Section::new(vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)]).unwrap();
/// assert_eq!(section.length(), 5.0);
///
/// // a closed line is a polygon, not a section
/// let closed = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 0.0)];
/// assert!(Section::new(closed).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    points: Vec<Point>,
}

impl Section {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() < 2 {
            return Err(SerafinError::Section(f!(
                "a section needs at least 2 points, found {}",
                points.len()
            )));
        }
        if points.len() > 2 && points.first() == points.last() {
            return Err(SerafinError::Section(
                "a section must be an open polyline".to_string(),
            ));
        }
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(SerafinError::Section(f!("point {p} is not finite")));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Consecutive point pairs
    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> {
        self.points.iter().zip(self.points.iter().skip(1))
    }

    pub fn bounds(&self) -> BoundingBox {
        // at least two points are guaranteed by the constructor
        BoundingBox::from_points(&self.points).unwrap_or(BoundingBox {
            min: Point::default(),
            max: Point::default(),
        })
    }

    /// Total length of the polyline
    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance(b)).sum()
    }

    /// Same polyline walked in the opposite direction
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Distance along the polyline to the point of the polyline nearest to `point`
    ///
    /// Points beyond either end project onto that end, giving `0` or the full
    /// length. The first segment wins a tie between segments.
    ///
    /// ```rust
    /// # use serafin::geometry::{Point, Section};
    /// let section = Section::new(vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]).unwrap();
    /// assert_eq!(section.project(&Point::new(1.5, 2.0)), 1.5);
    /// assert_eq!(section.project(&Point::new(-3.0, 1.0)), 0.0);
    /// ```
    pub fn project(&self, point: &Point) -> f64 {
        let mut offset = 0.0;
        let mut nearest = (f64::INFINITY, 0.0);
        for (a, b) in self.segments() {
            let d = b.sub(a);
            let length = a.distance(b);
            let along = point.sub(a);
            let t = match length > 0.0 {
                true => ((along[0] * d[0] + along[1] * d[1]) / (length * length)).clamp(0.0, 1.0),
                false => 0.0,
            };
            let foot = Point::new(a.x + t * d[0], a.y + t * d[1]);
            let gap = foot.distance(point);
            if gap < nearest.0 {
                nearest = (gap, offset + t * length);
            }
            offset += length;
        }
        nearest.1
    }
}

/// A transformation of the horizontal plane
pub trait Transformation {
    fn transform(&self, point: Point) -> Point;
}

/// Affine map `p -> A p + b`
///
/// ```rust
/// # use serafin::geometry::{Affine, Point, Transformation};
/// let shift = Affine::translation(1.0, 2.0);
/// assert_eq!(shift.transform(Point::new(1.0, 1.0)), Point::new(2.0, 3.0));
///
/// let double_then_shift = Affine::scaling(2.0).then(&shift);
/// assert_eq!(double_then_shift.transform(Point::new(1.0, 1.0)), Point::new(3.0, 4.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Row-major 2x2 linear part
    pub matrix: [[f64; 2]; 2],
    /// Translation applied after the linear part
    pub offset: [f64; 2],
}

impl Affine {
    pub const fn identity() -> Self {
        Self {
            matrix: [[1.0, 0.0], [0.0, 1.0]],
            offset: [0.0, 0.0],
        }
    }

    pub const fn translation(dx: f64, dy: f64) -> Self {
        Self {
            matrix: [[1.0, 0.0], [0.0, 1.0]],
            offset: [dx, dy],
        }
    }

    /// Uniform scaling about the origin
    pub const fn scaling(factor: f64) -> Self {
        Self {
            matrix: [[factor, 0.0], [0.0, factor]],
            offset: [0.0, 0.0],
        }
    }

    /// Counter-clockwise rotation about the origin, in degrees
    pub fn rotation(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self {
            matrix: [[cos, -sin], [sin, cos]],
            offset: [0.0, 0.0],
        }
    }

    /// Apply `self` first and `next` second
    pub fn then(&self, next: &Affine) -> Self {
        let a = &next.matrix;
        let b = &self.matrix;
        let mut matrix = [[0.0; 2]; 2];
        for (i, row) in matrix.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = a[i][0] * b[0][j] + a[i][1] * b[1][j];
            }
        }
        let offset = [
            a[0][0] * self.offset[0] + a[0][1] * self.offset[1] + next.offset[0],
            a[1][0] * self.offset[0] + a[1][1] * self.offset[1] + next.offset[1],
        ];
        Self { matrix, offset }
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation for Affine {
    fn transform(&self, point: Point) -> Point {
        let m = &self.matrix;
        Point::new(
            m[0][0] * point.x + m[0][1] * point.y + self.offset[0],
            m[1][0] * point.x + m[1][1] * point.y + self.offset[1],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_quarter_turn() {
        let p = Affine::rotation(90.0).transform(Point::new(1.0, 0.0));
        assert!((p.x - 0.0).abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn composition_matches_sequential_application() {
        let first = Affine::rotation(30.0);
        let second = Affine::translation(-2.0, 5.0).then(&Affine::scaling(0.5));
        let composed = first.then(&second);
        let p = Point::new(3.0, -1.0);
        let expected = second.transform(first.transform(p));
        let actual = composed.transform(p);
        assert!((expected.x - actual.x).abs() < 1e-12);
        assert!((expected.y - actual.y).abs() < 1e-12);
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = BoundingBox::from_points(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).unwrap();
        let b = BoundingBox::from_points(&[Point::new(1.0, 1.0), Point::new(2.0, 3.0)]).unwrap();
        let c = BoundingBox::from_points(&[Point::new(1.5, 0.0), Point::new(2.0, 0.5)]).unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.union(&c).width(), 2.0);
    }

    #[test]
    fn sections_need_two_points() {
        assert!(Section::new(vec![Point::new(0.0, 0.0)]).is_err());
        assert!(Section::new(vec![Point::new(0.0, 0.0), Point::new(f64::NAN, 0.0)]).is_err());
    }

    #[test]
    fn reversed_section() {
        let section = Section::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 2.0),
        ])
        .unwrap();
        let reversed = section.reversed();
        assert_eq!(reversed.points()[0], Point::new(1.0, 2.0));
        assert_eq!(reversed.length(), section.length());
        assert_eq!(section.bounds(), reversed.bounds());
    }

    #[test]
    fn projection_onto_a_bent_line() {
        // L shape of length 3
        let section = Section::new(vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 2.0),
        ])
        .unwrap();
        assert_eq!(section.project(&Point::new(0.25, -1.0)), 0.25);
        assert_eq!(section.project(&Point::new(3.0, 1.5)), 2.5);
        // beyond the last point
        assert_eq!(section.project(&Point::new(1.0, 5.0)), 3.0);
        // the corner is reached from both segments
        assert_eq!(section.project(&Point::new(2.0, -1.0)), 1.0);
    }
}
