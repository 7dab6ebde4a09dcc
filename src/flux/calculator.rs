//! Flux time series over a set of sections
//!
//! Geometry is set up once and reused for every frame:
//! 1. [construct_triangles()](FluxCalculator::construct_triangles) builds the
//!    triangle mesh from a header
//! 2. [construct_intersections()](FluxCalculator::construct_intersections)
//!    locates every section on the mesh
//! 3. [run()](FluxCalculator::run) reads the variables of each sampled frame
//!    once and evaluates the flux on every cached intersection
//!
//! A run can be cancelled from another thread through the flag returned by
//! [cancel_handle()](FluxCalculator::cancel_handle). The flag is checked
//! before each frame and before each section, and the rows completed so far
//! are returned with [FluxResult::complete] left `false`.

// standard library
use std::io::{Read, Seek, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// crate modules
use crate::error::{Result, SerafinError};
use crate::flux::FluxKind;
use crate::geometry::Section;
use crate::header::Header;
use crate::mesh::{Intersection, TriangleMesh};
use crate::readers::SerafinReader;
use crate::utils::f;

// external crates
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, info, warn};
use serde::Serialize;

/// Flux of every section at one sampled frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxRow {
    /// Index of the frame in the file
    pub frame: usize,
    pub time: f64,
    /// One value per section, in section order
    pub values: Vec<f64>,
}

/// Flux time series, one row per sampled frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FluxResult {
    pub section_names: Vec<String>,
    pub rows: Vec<FluxRow>,
    /// False if the run was cancelled before the last sampled frame
    pub complete: bool,
}

impl FluxResult {
    /// Write the table as delimited text
    ///
    /// The first line is `time` followed by the section names, then one line
    /// per row with the time and every value at `digits` decimal places.
    ///
    /// ```rust
    /// # use serafin::flux::{FluxResult, FluxRow};
    /// let result = FluxResult {
    ///     section_names: vec!["Section 1".to_string(), "Section 2".to_string()],
    ///     rows: vec![FluxRow { frame: 0, time: 0.0, values: vec![1.5, -0.25] }],
    ///     complete: true,
    /// };
    ///
    /// let mut buffer = Vec::new();
    /// result.write_csv(&mut buffer, ";", 3).unwrap();
    /// assert_eq!(
    ///     String::from_utf8(buffer).unwrap(),
    ///     "time;Section 1;Section 2\n0.000;1.500;-0.250\n"
    /// );
    /// ```
    pub fn write_csv<W: Write>(
        &self,
        writer: &mut W,
        separator: &str,
        digits: usize,
    ) -> Result<()> {
        writeln!(writer, "time{separator}{}", self.section_names.join(separator))?;
        for row in &self.rows {
            let mut line = f!("{:.digits$}", row.time);
            for value in &row.values {
                line.push_str(separator);
                line.push_str(&f!("{value:.digits$}"));
            }
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }
}

/// Computes one kind of flux through named sections for every sampled frame
#[derive(Debug)]
pub struct FluxCalculator {
    kind: FluxKind,
    var_ids: Vec<String>,
    sections: Vec<(String, Section)>,
    stride: usize,
    mesh: Option<TriangleMesh>,
    intersections: Vec<Intersection>,
    cancelled: Arc<AtomicBool>,
    disable_progress: bool,
}

impl FluxCalculator {
    /// Bind a flux kind to its variables and sections
    ///
    /// - `kind` - Flux formula to evaluate
    /// - `var_ids` - Variable ids in the order the formula expects them
    /// - `sections` - Named sections, one output column each
    /// - `stride` - Sample every `stride` frames, starting with the first
    ///
    /// Fails with a [SerafinError::Request] if the number of variables does
    /// not match the arity of `kind` or the stride is zero.
    pub fn new(
        kind: FluxKind,
        var_ids: Vec<String>,
        sections: Vec<(String, Section)>,
        stride: usize,
    ) -> Result<Self> {
        if var_ids.len() != kind.arity() {
            return Err(SerafinError::Request(f!(
                "{kind} needs {} variables, {} given",
                kind.arity(),
                var_ids.len()
            )));
        }
        if stride == 0 {
            return Err(SerafinError::Request(
                "time sampling stride must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            kind,
            var_ids,
            sections,
            stride,
            mesh: None,
            intersections: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
            disable_progress: false,
        })
    }

    /// Shared flag, set it to `true` to stop a run
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Use an existing flag for cancellation
    pub fn with_cancel_handle(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Do not print the tqdm progress indicators
    pub fn disable_progress(&mut self) {
        debug!("Progress bar disabled");
        self.disable_progress = true;
    }

    pub fn kind(&self) -> FluxKind {
        self.kind
    }

    pub fn section_names(&self) -> Vec<String> {
        self.sections.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Intersections cached by [construct_intersections()](FluxCalculator::construct_intersections)
    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    /// Frame indices sampled out of `frame_count` frames
    pub fn sampled_frames(&self, frame_count: usize) -> impl Iterator<Item = usize> {
        (0..frame_count).step_by(self.stride)
    }

    /// Build the triangle mesh, invalidating any cached intersection
    pub fn construct_triangles(&mut self, header: &Header) {
        let mesh = TriangleMesh::new(header);
        debug!("Constructed {} triangles", mesh.len());
        self.mesh = Some(mesh);
        self.intersections.clear();
    }

    /// Locate every section on the mesh
    ///
    /// Fails with a [SerafinError::Request] if the triangles have not been
    /// constructed.
    pub fn construct_intersections(&mut self) -> Result<()> {
        let mesh = self.mesh.as_ref().ok_or_else(|| {
            SerafinError::Request(
                "the triangles have not been constructed (call construct_triangles first)"
                    .to_string(),
            )
        })?;

        self.intersections = self
            .sections
            .iter()
            .map(|(name, section)| {
                let intersection = mesh.section_intersection(section);
                if intersection.is_empty() {
                    warn!("{name} does not cross the mesh, its flux is always 0");
                }
                intersection
            })
            .collect();
        Ok(())
    }

    /// Flux through one intersection for the variables of one frame
    ///
    /// `values` holds the node values of each variable in `var_ids` order.
    pub fn flux_in_frame(&self, intersection: &Intersection, values: &[Vec<f64>]) -> Result<f64> {
        let arrays: Vec<&[f64]> = values.iter().map(Vec::as_slice).collect();
        self.kind.evaluate(intersection, &arrays)
    }

    /// Evaluate the flux of every section at every sampled frame
    ///
    /// The reader must have its header read, on the same mesh the triangles
    /// were constructed from. Frame times are scanned if they have not been
    /// already.
    pub fn run<R: Read + Seek>(&self, input: &mut SerafinReader<R>) -> Result<FluxResult> {
        let mesh = match &self.mesh {
            Some(mesh) if self.intersections.len() == self.sections.len() => mesh,
            _ => {
                return Err(SerafinError::Request(
                    "the intersections have not been constructed (call construct_intersections first)"
                        .to_string(),
                ))
            }
        };

        let frame_count = {
            let header = input.header()?;
            if header.node_count_2d() != mesh.node_count() {
                return Err(SerafinError::Request(f!(
                    "the file has {} nodes per plane but the triangles were built on {}",
                    header.node_count_2d(),
                    mesh.node_count()
                )));
            }
            if let Some(missing) = self
                .var_ids
                .iter()
                .find(|id| header.variable_index(id).is_none())
            {
                return Err(SerafinError::Request(f!("variable ID {missing} not found")));
            }
            header.frame_count()
        };
        if input.times().len() != frame_count {
            input.scan_times()?;
        }
        let times = input.times().to_vec();

        let mut result = FluxResult {
            section_names: self.section_names(),
            rows: Vec::new(),
            complete: false,
        };

        let sampled: Vec<usize> = self.sampled_frames(frame_count).collect();
        info!(
            "Computing {} for {} sections over {} frames",
            self.kind,
            self.sections.len(),
            sampled.len()
        );
        let mut progress_bar = self.init_progress_bar(sampled.len())?;

        for frame_index in sampled {
            if self.is_cancelled() {
                info!("Cancelled after {} frames", result.rows.len());
                return Ok(result);
            }

            let values = self
                .var_ids
                .iter()
                .map(|id| input.read_var_in_frame(frame_index, id))
                .collect::<Result<Vec<_>>>()?;

            let mut row = Vec::with_capacity(self.intersections.len());
            for intersection in &self.intersections {
                if self.is_cancelled() {
                    info!("Cancelled after {} frames", result.rows.len());
                    return Ok(result);
                }
                row.push(self.flux_in_frame(intersection, &values)?);
            }

            result.rows.push(FluxRow {
                frame: frame_index,
                time: times[frame_index],
                values: row,
            });
            progress_bar.update(1)?;
        }

        // need an extra line for clean spacing if the progress bar is printed
        if !self.disable_progress {
            eprintln!()
        };

        result.complete = true;
        Ok(result)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Initialise the progress bar, if wanted
    fn init_progress_bar(&self, total: usize) -> Result<Bar> {
        BarBuilder::default()
            .total(total)
            .unit(" frames")
            .disable(self.disable_progress)
            .build()
            .map_err(SerafinError::Request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::header::{HeaderBuilder, Language, Precision};
    use crate::testing::{square_file, square_header};
    use rstest::rstest;
    use std::io::Cursor;

    fn reader(frames: usize) -> SerafinReader<Cursor<Vec<u8>>> {
        let bytes = square_file(Precision::Single, frames);
        let size = bytes.len() as u64;
        let mut reader = SerafinReader::new(Cursor::new(bytes), size, Language::En);
        reader.read_header().unwrap();
        reader
    }

    fn named(points: &[(f64, f64)], name: &str) -> (String, Section) {
        let points = points.iter().map(|(x, y)| Point::new(*x, *y)).collect();
        (name.to_string(), Section::new(points).unwrap())
    }

    fn depth_integral(sections: Vec<(String, Section)>, stride: usize) -> FluxCalculator {
        let mut calculator =
            FluxCalculator::new(FluxKind::LineIntegral, vec!["H".to_string()], sections, stride)
                .unwrap();
        calculator.disable_progress();
        calculator.construct_triangles(&square_header(Precision::Single));
        calculator.construct_intersections().unwrap();
        calculator
    }

    #[test]
    fn integral_across_the_diagonal() {
        let calculator = depth_integral(vec![named(&[(0.8, 0.2), (0.2, 0.8)], "diagonal")], 1);
        let result = calculator.run(&mut reader(3)).unwrap();

        assert!(result.complete);
        assert_eq!(result.section_names, vec!["diagonal"]);
        assert_eq!(result.rows.len(), 3);

        // depth i + x + 2y averages i + 1.5 along the section
        let length = 0.72_f64.sqrt();
        for (i, row) in result.rows.iter().enumerate() {
            assert_eq!(row.frame, i);
            assert_eq!(row.time, 10.0 * i as f64);
            assert!((row.values[0] - (i as f64 + 1.5) * length).abs() < 1e-6);
        }
    }

    #[test]
    fn section_off_the_mesh_is_zero() {
        let calculator = depth_integral(
            vec![
                named(&[(0.0, 0.5), (1.0, 0.5)], "inside"),
                named(&[(5.0, 5.0), (6.0, 7.0)], "outside"),
            ],
            1,
        );
        let result = calculator.run(&mut reader(2)).unwrap();
        assert!(calculator.intersections()[1].is_empty());
        for row in &result.rows {
            assert!(row.values[0] > 0.0);
            assert_eq!(row.values[1], 0.0);
        }
    }

    #[rstest]
    #[case(5, 1, vec![0, 1, 2, 3, 4])]
    #[case(5, 2, vec![0, 2, 4])]
    #[case(6, 4, vec![0, 4])]
    #[case(3, 10, vec![0])]
    #[case(0, 2, vec![])]
    fn stride_sampling(#[case] frames: usize, #[case] stride: usize, #[case] expected: Vec<usize>) {
        let calculator = depth_integral(vec![named(&[(0.0, 0.5), (1.0, 0.5)], "a")], stride);
        let result = calculator.run(&mut reader(frames)).unwrap();
        let sampled: Vec<usize> = result.rows.iter().map(|row| row.frame).collect();
        assert_eq!(sampled, expected);
        assert_eq!(sampled.len(), frames.div_ceil(stride));
        assert!(result.complete);
    }

    #[test]
    fn cancelled_before_run() {
        let calculator = depth_integral(vec![named(&[(0.0, 0.5), (1.0, 0.5)], "a")], 1);
        calculator.cancel_handle().store(true, Ordering::Relaxed);
        let result = calculator.run(&mut reader(4)).unwrap();
        assert!(result.rows.is_empty());
        assert!(!result.complete);
        assert_eq!(result.section_names, vec!["a"]);
    }

    #[test]
    fn shared_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let calculator = depth_integral(vec![named(&[(0.0, 0.5), (1.0, 0.5)], "a")], 1)
            .with_cancel_handle(Arc::clone(&flag));
        flag.store(true, Ordering::Relaxed);
        assert!(calculator.cancel_handle().load(Ordering::Relaxed));
        assert!(!calculator.run(&mut reader(2)).unwrap().complete);
    }

    #[rstest]
    #[case(FluxKind::LineFlux, vec!["U"], 1)]
    #[case(FluxKind::LineIntegral, vec!["H"], 0)]
    #[case(FluxKind::MassFlux, vec!["U", "V", "H"], 1)]
    fn invalid_configuration(
        #[case] kind: FluxKind,
        #[case] ids: Vec<&str>,
        #[case] stride: usize,
    ) {
        let ids = ids.into_iter().map(String::from).collect();
        let error = FluxCalculator::new(kind, ids, Vec::new(), stride).unwrap_err();
        assert!(error.is_request());
    }

    #[test]
    fn geometry_must_come_first() {
        let mut calculator =
            FluxCalculator::new(FluxKind::LineIntegral, vec!["H".to_string()], Vec::new(), 1)
                .unwrap();
        assert!(calculator.construct_intersections().unwrap_err().is_request());
        assert!(calculator.run(&mut reader(1)).unwrap_err().is_request());
    }

    #[test]
    fn mesh_must_match_the_file() {
        // the square with an extra triangle on three more nodes
        let header = HeaderBuilder::new("seven nodes")
            .variable("WATER DEPTH", "M")
            .triangles(&[[0, 1, 2], [0, 2, 3], [4, 5, 6]])
            .coordinates(
                vec![0.0, 1.0, 1.0, 0.0, 2.0, 3.0, 2.0],
                vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0],
            )
            .build()
            .unwrap();
        let mut calculator = FluxCalculator::new(
            FluxKind::LineIntegral,
            vec!["H".to_string()],
            vec![named(&[(0.0, 0.5), (2.5, 0.5)], "a")],
            1,
        )
        .unwrap();
        calculator.disable_progress();
        calculator.construct_triangles(&header);
        calculator.construct_intersections().unwrap();

        let error = calculator.run(&mut reader(2)).unwrap_err();
        assert!(error.is_request());
        assert!(error.to_string().contains("7"));
    }

    #[test]
    fn unknown_variable() {
        let mut calculator = FluxCalculator::new(
            FluxKind::LineFlux,
            vec!["U".to_string(), "V".to_string()],
            vec![named(&[(0.0, 0.5), (1.0, 0.5)], "a")],
            1,
        )
        .unwrap();
        calculator.disable_progress();
        calculator.construct_triangles(&square_header(Precision::Single));
        calculator.construct_intersections().unwrap();
        assert!(calculator.run(&mut reader(1)).unwrap_err().is_request());
    }

    #[test]
    fn csv_table() {
        let calculator = depth_integral(vec![named(&[(0.0, 0.5), (1.0, 0.5)], "mid")], 1);
        let result = calculator.run(&mut reader(2)).unwrap();

        let mut buffer = Vec::new();
        result.write_csv(&mut buffer, ",", 2).unwrap();
        // depth i + x + 1 averages i + 1.5 along y = 0.5
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "time,mid\n0.00,1.50\n10.00,2.50\n"
        );
    }
}
