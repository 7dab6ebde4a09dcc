//! Writer for Serafin result files
//!
//! A writer accepts exactly one header followed by any number of frames with
//! strictly increasing times. Values are held as `f64` and narrowed to the
//! precision of the header as they are written.

// standard library
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::Path;

// internal modules
use crate::error::{Result, SerafinError};
use crate::header::{Header, Precision};
use crate::record::RecordWriter;
use crate::utils::f;

// external crates
use log::{error, info, trace};

/// Shape every frame has to match
#[derive(Debug, Clone, Copy)]
struct FrameShape {
    precision: Precision,
    variable_count: usize,
    node_count: usize,
}

/// Writer for a Serafin file
///
/// ```rust
/// # use serafin::header::HeaderBuilder;
/// # use serafin::writer::SerafinWriter;
/// let header = HeaderBuilder::new("one triangle")
///     .variable("WATER DEPTH", "M")
///     .triangles(&[[0, 1, 2]])
///     .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
///     .build()
///     .unwrap();
///
/// let mut writer = SerafinWriter::new(Vec::new());
/// writer.write_header(&header).unwrap();
/// writer.write_frame(0.0, &[vec![1.0, 1.0, 1.0]]).unwrap();
/// writer.write_frame(60.0, &[vec![1.5, 1.2, 1.1]]).unwrap();
///
/// let bytes = writer.finish().unwrap();
/// assert_eq!(bytes.len() as u64, header.header_size() + 2 * header.frame_size());
/// ```
#[derive(Debug)]
pub struct SerafinWriter<W: Write> {
    records: RecordWriter<W>,
    shape: Option<FrameShape>,
    last_time: Option<f64>,
    frames_written: usize,
}

impl SerafinWriter<BufWriter<File>> {
    /// Create a new file, never overwriting an existing one
    ///
    /// Fails with [SerafinError::OutputExists] if anything is already at
    /// `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => {
                    error!("Refusing to overwrite \"{}\"", path.display());
                    SerafinError::OutputExists(path.to_path_buf())
                }
                _ => SerafinError::Io(e),
            })?;
        info!("Writing \"{}\"", path.display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> SerafinWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            records: RecordWriter::new(inner),
            shape: None,
            last_time: None,
            frames_written: 0,
        }
    }

    /// Write every header record, only allowed once
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        if self.shape.is_some() {
            return Err(SerafinError::Request(
                "the header has already been written".to_string(),
            ));
        }
        header.write_records(&mut self.records)?;
        self.shape = Some(FrameShape {
            precision: header.precision(),
            variable_count: header.variables().len(),
            node_count: header.node_count(),
        });
        Ok(())
    }

    /// Write one frame, one array of node values per variable in header order
    ///
    /// Fails with a [SerafinError::Request] if the header has not been
    /// written, the values do not match the header, or the time is not
    /// strictly greater than the previous one.
    pub fn write_frame<V: AsRef<[f64]>>(&mut self, time: f64, values: &[V]) -> Result<()> {
        let shape = self.shape.ok_or_else(|| {
            SerafinError::Request("the header must be written before any frame".to_string())
        })?;

        if values.len() != shape.variable_count {
            return Err(SerafinError::Request(f!(
                "frame has {} variables where the header declares {}",
                values.len(),
                shape.variable_count
            )));
        }
        if let Some(v) = values.iter().find(|v| v.as_ref().len() != shape.node_count) {
            return Err(SerafinError::Request(f!(
                "frame variable has {} values for {} nodes",
                v.as_ref().len(),
                shape.node_count
            )));
        }
        if time.is_nan() || self.last_time.is_some_and(|last| time <= last) {
            return Err(SerafinError::Request(f!(
                "frame time {time} does not follow the previous time {}",
                self.last_time.unwrap_or(f64::NAN)
            )));
        }

        trace!("Writing frame {} at time {time}", self.frames_written);
        self.records.write_float_array(&[time], shape.precision)?;
        for v in values {
            self.records.write_float_array(v.as_ref(), shape.precision)?;
        }

        self.last_time = Some(time);
        self.frames_written += 1;
        Ok(())
    }

    /// Number of frames written so far
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Flush everything and hand back the sink
    pub fn finish(mut self) -> Result<W> {
        self.records.flush()?;
        Ok(self.records.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Language;
    use crate::readers::SerafinReader;
    use crate::testing::{linear_field, square_file, square_header};
    use rstest::rstest;
    use std::io::Cursor;

    fn read_back(bytes: Vec<u8>) -> SerafinReader<Cursor<Vec<u8>>> {
        let size = bytes.len() as u64;
        let mut reader = SerafinReader::new(Cursor::new(bytes), size, Language::En);
        reader.read_header().unwrap();
        reader
    }

    #[rstest]
    #[case(Precision::Single)]
    #[case(Precision::Double)]
    fn same_bytes_as_the_fixture(#[case] precision: Precision) {
        let header = square_header(precision);
        let mut writer = SerafinWriter::new(Vec::new());
        writer.write_header(&header).unwrap();
        for i in 0..3 {
            let depth = linear_field(&header, i as f64, 1.0, 2.0);
            writer.write_frame(10.0 * i as f64, &[depth]).unwrap();
        }
        assert_eq!(writer.frames_written(), 3);
        assert_eq!(writer.finish().unwrap(), square_file(precision, 3));
    }

    #[test]
    fn double_written_as_single() {
        let header = square_header(Precision::Double);
        let values = vec![0.1, 0.2, 0.3, 0.4];

        let mut writer = SerafinWriter::new(Vec::new());
        writer.write_header(&header.downcast_precision()).unwrap();
        writer.write_frame(0.5, &[values.clone()]).unwrap();

        let mut reader = read_back(writer.finish().unwrap());
        assert_eq!(reader.header().unwrap().precision(), Precision::Single);
        let narrowed: Vec<f64> = values.iter().map(|v| *v as f32 as f64).collect();
        assert_eq!(reader.read_var_in_frame(0, "H").unwrap(), narrowed);
        assert_eq!(reader.read_time(0).unwrap(), 0.5);
    }

    #[test]
    fn frame_before_header() {
        let mut writer = SerafinWriter::new(Vec::new());
        let error = writer.write_frame(0.0, &[vec![0.0; 4]]).unwrap_err();
        assert!(error.is_request());
    }

    #[test]
    fn header_only_once() {
        let header = square_header(Precision::Single);
        let mut writer = SerafinWriter::new(Vec::new());
        writer.write_header(&header).unwrap();
        assert!(writer.write_header(&header).unwrap_err().is_request());
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![vec![0.0; 3]])]
    #[case(vec![vec![0.0; 4], vec![0.0; 4]])]
    fn frame_shape_must_match(#[case] values: Vec<Vec<f64>>) {
        let mut writer = SerafinWriter::new(Vec::new());
        writer.write_header(&square_header(Precision::Single)).unwrap();
        assert!(writer.write_frame(0.0, &values).unwrap_err().is_request());
    }

    #[rstest]
    #[case(5.0)]
    #[case(1.0)]
    #[case(f64::NAN)]
    fn times_must_increase(#[case] next: f64) {
        let mut writer = SerafinWriter::new(Vec::new());
        writer.write_header(&square_header(Precision::Single)).unwrap();
        writer.write_frame(5.0, &[vec![0.0; 4]]).unwrap();
        assert!(writer.write_frame(next, &[vec![0.0; 4]]).unwrap_err().is_request());
        assert_eq!(writer.frames_written(), 1);
    }

    #[test]
    fn existing_file_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.slf");
        std::fs::write(&path, b"keep me").unwrap();

        let error = SerafinWriter::create(&path).unwrap_err();
        assert!(matches!(error, SerafinError::OutputExists(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn create_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.slf");
        let header = square_header(Precision::Single);

        let mut writer = SerafinWriter::create(&path).unwrap();
        writer.write_header(&header).unwrap();
        writer.write_frame(0.0, &[vec![1.0; 4]]).unwrap();
        writer.finish().unwrap();

        let mut reader = SerafinReader::open(&path, Language::En).unwrap();
        assert_eq!(reader.read_header().unwrap().frame_count(), 1);
        assert_eq!(reader.read_var_in_frame(0, "H").unwrap(), vec![1.0; 4]);
    }
}
