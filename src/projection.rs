//! Values along sections, projected onto a reference line
//!
//! Each line is located on the mesh once, then the chosen variables of a
//! single frame are interpolated at every point where a line meets the mesh
//! triangles (its vertices and its crossings with triangle edges). Every
//! point is placed along one of the lines, the reference, by its nearest
//! point on that line. Points whose projection falls on either end of the
//! reference, or beyond them, are dropped.
//!
//! ```rust
//! # use serafin::geometry::{Point, Section};
//! # use serafin::header::HeaderBuilder;
//! # use serafin::projection::LineProjector;
//! let header = HeaderBuilder::new("unit square")
//!     .triangles(&[[0, 1, 2], [0, 2, 3]])
//!     .coordinates(vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0])
//!     .build()
//!     .unwrap();
//! let bottom = Section::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]).unwrap();
//! let across = Section::new(vec![Point::new(0.2, 0.8), Point::new(0.8, 0.2)]).unwrap();
//! let lines = vec![("bottom".to_string(), bottom), ("across".to_string(), across)];
//!
//! let mut projector = LineProjector::new(lines, 1).unwrap();
//! projector.construct_intersections(&header).unwrap();
//!
//! // x as the variable, the crossing of the diagonal lands half way along
//! let x = header.x().to_vec();
//! let rows = projector.project(&[x.as_slice()]).unwrap();
//! assert_eq!(rows.iter().filter(|row| row.line == 2).count(), 3);
//! assert!(rows.iter().any(|row| (row.distance - 0.5).abs() < 1e-12));
//! ```

// standard library
use std::io::{Read, Seek, Write};

// internal modules
use crate::error::{Result, SerafinError};
use crate::geometry::{Point, Section};
use crate::header::Header;
use crate::mesh::{Intersection, TriangleMesh};
use crate::readers::SerafinReader;
use crate::utils::f;

// external crates
use log::{debug, info, warn};
use serde::Serialize;

/// One point of a line placed on the reference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    /// 1-based number of the line the point belongs to
    pub line: usize,
    pub point: Point,
    /// Distance along the reference line
    pub distance: f64,
    /// One interpolated value per variable
    pub values: Vec<f64>,
}

/// Projected values of one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionTable {
    pub var_ids: Vec<String>,
    /// Index of the frame in the file
    pub frame: usize,
    pub time: f64,
    pub rows: Vec<ProjectedPoint>,
}

impl ProjectionTable {
    /// Write the table as delimited text
    ///
    /// The first line is `Line`, `x`, `y`, `distance` and the variable ids,
    /// then one line per point with every number at `digits` decimal places.
    pub fn write_csv<W: Write>(
        &self,
        writer: &mut W,
        separator: &str,
        digits: usize,
    ) -> Result<()> {
        let mut header = vec!["Line", "x", "y", "distance"];
        header.extend(self.var_ids.iter().map(String::as_str));
        writeln!(writer, "{}", header.join(separator))?;

        for row in &self.rows {
            let mut line = row.line.to_string();
            for value in [row.point.x, row.point.y, row.distance]
                .iter()
                .chain(&row.values)
            {
                line.push_str(separator);
                line.push_str(&f!("{value:.digits$}"));
            }
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}

/// Projects the points of a set of lines onto one of them
#[derive(Debug)]
pub struct LineProjector {
    lines: Vec<(String, Section)>,
    reference: usize,
    mesh: Option<TriangleMesh>,
    intersections: Vec<Intersection>,
}

impl LineProjector {
    /// Choose the reference among the lines by its 1-based number
    ///
    /// Fails with a [SerafinError::Request] if there is no such line.
    pub fn new(lines: Vec<(String, Section)>, reference: usize) -> Result<Self> {
        if reference == 0 || reference > lines.len() {
            return Err(SerafinError::Request(f!(
                "reference line {reference} not found among {} lines",
                lines.len()
            )));
        }
        Ok(Self {
            lines,
            reference,
            mesh: None,
            intersections: Vec::new(),
        })
    }

    pub fn reference(&self) -> &Section {
        &self.lines[self.reference - 1].1
    }

    /// Intersections cached by [construct_intersections()](LineProjector::construct_intersections)
    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Build the mesh of a header and locate every line on it
    ///
    /// Lines that miss the mesh are kept but give no points. Fails with a
    /// [SerafinError::Request] if the reference line misses the mesh.
    pub fn construct_intersections(&mut self, header: &Header) -> Result<()> {
        let mesh = TriangleMesh::new(header);
        let intersections: Vec<Intersection> = self
            .lines
            .iter()
            .map(|(name, line)| {
                let intersection = mesh.section_intersection(line);
                if intersection.is_empty() {
                    warn!("{name} does not cross the mesh and is left out");
                }
                intersection
            })
            .collect();

        if intersections[self.reference - 1].is_empty() {
            return Err(SerafinError::Request(f!(
                "reference line {} does not cross the mesh",
                self.reference
            )));
        }

        debug!(
            "{} of {} lines cross the mesh",
            intersections.iter().filter(|i| !i.is_empty()).count(),
            intersections.len()
        );
        self.mesh = Some(mesh);
        self.intersections = intersections;
        Ok(())
    }

    /// Interpolate node values at the points of every line and project them
    ///
    /// `values` holds one node array per variable. Rows come line by line,
    /// each line in its own point order.
    pub fn project(&self, values: &[&[f64]]) -> Result<Vec<ProjectedPoint>> {
        let mesh = self.constructed_mesh()?;
        if let Some(short) = values.iter().find(|v| v.len() < mesh.node_count()) {
            return Err(SerafinError::Request(f!(
                "projection needs one value per mesh node ({}), found {}",
                mesh.node_count(),
                short.len()
            )));
        }

        let reference = self.reference();
        let max_distance = reference.length();
        let mut rows = Vec::new();
        for (n, intersection) in self.intersections.iter().enumerate() {
            for p in intersection.line_points() {
                let distance = reference.project(&p.point);
                if distance <= 0.0 || distance >= max_distance {
                    continue;
                }
                rows.push(ProjectedPoint {
                    line: n + 1,
                    point: p.point,
                    distance,
                    values: values.iter().map(|v| p.interpolate(v)).collect(),
                });
            }
        }
        Ok(rows)
    }

    /// Project the variables of one frame of a file
    ///
    /// The reader must have its header read, on the same mesh the lines were
    /// located on.
    pub fn run<R: Read + Seek>(
        &self,
        input: &mut SerafinReader<R>,
        var_ids: &[String],
        frame: usize,
    ) -> Result<ProjectionTable> {
        let mesh = self.constructed_mesh()?;
        let header = input.header()?;
        if header.node_count_2d() != mesh.node_count() {
            return Err(SerafinError::Request(f!(
                "the file has {} nodes per plane but the lines were located on {}",
                header.node_count_2d(),
                mesh.node_count()
            )));
        }

        let time = input.read_time(frame)?;
        let values = var_ids
            .iter()
            .map(|id| input.read_var_in_frame(frame, id))
            .collect::<Result<Vec<_>>>()?;
        let arrays: Vec<&[f64]> = values.iter().map(Vec::as_slice).collect();

        let rows = self.project(&arrays)?;
        info!(
            "Projected {} points onto line {} at frame {frame}",
            rows.len(),
            self.reference
        );
        Ok(ProjectionTable {
            var_ids: var_ids.to_vec(),
            frame,
            time,
            rows,
        })
    }

    fn constructed_mesh(&self) -> Result<&TriangleMesh> {
        self.mesh.as_ref().ok_or_else(|| {
            SerafinError::Request(
                "the lines have not been located (call construct_intersections first)"
                    .to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{Language, Precision};
    use crate::testing::{square_file, square_header};
    use rstest::rstest;
    use std::io::Cursor;

    fn named(points: &[(f64, f64)], name: &str) -> (String, Section) {
        let points = points.iter().map(|(x, y)| Point::new(*x, *y)).collect();
        (name.to_string(), Section::new(points).unwrap())
    }

    fn reader(frames: usize) -> SerafinReader<Cursor<Vec<u8>>> {
        let bytes = square_file(Precision::Single, frames);
        let size = bytes.len() as u64;
        let mut reader = SerafinReader::new(Cursor::new(bytes), size, Language::En);
        reader.read_header().unwrap();
        reader
    }

    /// Reference along y = 0.5, a crossing line and one off the mesh
    fn projector() -> LineProjector {
        let lines = vec![
            named(&[(-0.5, 0.5), (1.5, 0.5)], "reference"),
            named(&[(0.8, 0.2), (0.2, 0.8)], "across"),
            named(&[(3.0, 3.0), (4.0, 4.0)], "outside"),
        ];
        let mut projector = LineProjector::new(lines, 1).unwrap();
        projector.construct_intersections(&square_header(Precision::Single)).unwrap();
        projector
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn points_of_each_line() {
        let projector = projector();
        let header = square_header(Precision::Single);
        let y = header.y().to_vec();
        let rows = projector.project(&[y.as_slice()]).unwrap();

        // reference: entry, diagonal crossing, exit
        let reference: Vec<&ProjectedPoint> = rows.iter().filter(|r| r.line == 1).collect();
        assert_eq!(reference.len(), 3);
        assert!(close(reference[0].distance, 0.5));
        assert!(close(reference[1].distance, 1.0));
        assert!(close(reference[2].distance, 1.5));
        assert!(reference.iter().all(|r| close(r.values[0], 0.5)));

        // across: start, crossing, end, placed by x along the reference
        let across: Vec<&ProjectedPoint> = rows.iter().filter(|r| r.line == 2).collect();
        assert_eq!(across.len(), 3);
        for row in &across {
            assert!(close(row.distance, row.point.x + 0.5));
            assert!(close(row.values[0], row.point.y));
        }
        assert!(rows.iter().all(|r| r.line != 3));
    }

    #[test]
    fn ends_of_the_reference_are_dropped() {
        // the reference starts and ends inside the mesh
        let lines = vec![
            named(&[(0.2, 0.1), (0.8, 0.1)], "reference"),
            named(&[(0.0, 0.9), (0.5, 0.9), (1.0, 0.9)], "parallel"),
        ];
        let mut projector = LineProjector::new(lines, 1).unwrap();
        projector.construct_intersections(&square_header(Precision::Single)).unwrap();
        let x = square_header(Precision::Single).x().to_vec();
        let rows = projector.project(&[x.as_slice()]).unwrap();

        // (0, 0.9) and (1, 0.9) project past the ends, the reference ends on them
        let parallel: Vec<f64> = rows.iter().filter(|r| r.line == 2).map(|r| r.point.x).collect();
        assert!(parallel.iter().all(|x| *x > 0.2 && *x < 0.8));
        assert!(!parallel.is_empty());
        assert!(rows.iter().filter(|r| r.line == 1).all(|r| r.distance > 0.0 && r.distance < 0.6));
    }

    #[test]
    fn frame_from_a_file() {
        let projector = projector();
        let table = projector.run(&mut reader(3), &["H".to_string()], 2).unwrap();
        assert_eq!(table.frame, 2);
        assert_eq!(table.time, 20.0);

        // depth 2 + x + 2y
        for row in &table.rows {
            let expected = 2.0 + row.point.x + 2.0 * row.point.y;
            assert!((row.values[0] - expected).abs() < 1e-5);
        }

        let mut buffer = Vec::new();
        table.write_csv(&mut buffer, ";", 2).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Line;x;y;distance;H"));
        assert_eq!(lines.next(), Some("1;0.00;0.50;0.50;3.00"));
        assert_eq!(lines.count(), table.rows.len() - 1);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    fn reference_must_exist(#[case] reference: usize) {
        let lines = vec![named(&[(0.0, 0.5), (1.0, 0.5)], "a")];
        assert!(LineProjector::new(lines, reference).unwrap_err().is_request());
    }

    #[test]
    fn reference_must_cross_the_mesh() {
        let lines = vec![
            named(&[(0.0, 0.5), (1.0, 0.5)], "inside"),
            named(&[(3.0, 3.0), (4.0, 4.0)], "outside"),
        ];
        let mut projector = LineProjector::new(lines, 2).unwrap();
        let error = projector
            .construct_intersections(&square_header(Precision::Single))
            .unwrap_err();
        assert!(error.is_request());
    }

    #[test]
    fn checks_before_projecting() {
        let lines = vec![named(&[(0.0, 0.5), (1.0, 0.5)], "a")];
        let unlocated = LineProjector::new(lines, 1).unwrap();
        assert!(unlocated.project(&[]).unwrap_err().is_request());

        let located = projector();
        let short = [1.0, 2.0];
        assert!(located.project(&[&short[..]]).unwrap_err().is_request());
        let missing = located.run(&mut reader(1), &["U".to_string()], 0);
        assert!(missing.unwrap_err().is_request());
    }
}
