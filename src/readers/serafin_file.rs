//! Random access reader for Serafin result files
//!
//! Frames are never read sequentially. Every request seeks straight to the
//! record of interest using the offsets computed from the header, so reading
//! one variable of the last frame costs the same as reading the first.

// standard library
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

// crate modules
use crate::error::{Result, SerafinError};
use crate::header::{self, Header, Language};
use crate::record::RecordReader;
use crate::utils::f;

// external crates
use log::{debug, info, trace};

/// Time and every variable of a single frame, in header order
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: f64,
    pub values: Vec<Vec<f64>>,
}

/// Reader for a Serafin file
///
/// The header must be read with [read_header()](SerafinReader::read_header)
/// before any frame data can be requested.
///
/// ```rust,no_run
/// # use serafin::header::Language;
/// # use serafin::readers::SerafinReader;
/// let mut reader = SerafinReader::open("r2d_tidal.slf", Language::En)?;
/// reader.read_header()?;
/// reader.scan_times()?;
///
/// // water depth of the last frame
/// let last = reader.times().len() - 1;
/// let depth = reader.read_var_in_frame(last, "H")?;
/// # Ok::<(), serafin::error::SerafinError>(())
/// ```
#[derive(Debug)]
pub struct SerafinReader<R> {
    records: RecordReader<R>,
    file_size: u64,
    language: Language,
    header: Option<Header>,
    times: Vec<f64>,
}

impl SerafinReader<BufReader<File>> {
    /// Open a file on disk, taking the file size from its metadata
    pub fn open<P: AsRef<Path>>(path: P, language: Language) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        info!("Reading \"{}\" ({} bytes)", path.display(), file_size);
        Ok(Self::new(BufReader::new(file), file_size, language))
    }
}

impl<R: Read + Seek> SerafinReader<R> {
    /// Wrap any seekable source of `file_size` bytes
    pub fn new(inner: R, file_size: u64, language: Language) -> Self {
        Self {
            records: RecordReader::new(inner),
            file_size,
            language,
            header: None,
            times: Vec::new(),
        }
    }

    /// Parse and validate the header, replacing any previous one
    pub fn read_header(&mut self) -> Result<&Header> {
        self.records.seek(0)?;
        self.times.clear();
        let header = header::parse(self.records.get_mut(), self.file_size, self.language)?;
        debug!("{}", header.summary());
        Ok(self.header.insert(header))
    }

    /// Header read by [read_header()](SerafinReader::read_header)
    pub fn header(&self) -> Result<&Header> {
        self.header.as_ref().ok_or_else(missing_header)
    }

    /// Read the time of every frame
    pub fn scan_times(&mut self) -> Result<&[f64]> {
        let header = self.header.as_ref().ok_or_else(missing_header)?;
        debug!("Scanning the time of {} frames", header.frame_count());

        let mut times = Vec::with_capacity(header.frame_count());
        for frame_index in 0..header.frame_count() {
            self.records.seek(header.frame_offset(frame_index))?;
            let time = self.records.read_float_array(1, header.precision())?;
            times.push(time[0]);
        }

        self.times = times;
        Ok(&self.times)
    }

    /// Frame times, empty until [scan_times()](SerafinReader::scan_times) is called
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Read the time record of a single frame
    pub fn read_time(&mut self, frame_index: usize) -> Result<f64> {
        let header = self.header.as_ref().ok_or_else(missing_header)?;
        check_frame(header, frame_index)?;
        self.records.seek(header.frame_offset(frame_index))?;
        let time = self.records.read_float_array(1, header.precision())?;
        Ok(time[0])
    }

    /// Read the values of one variable at one frame
    ///
    /// Fails with a [SerafinError::Request] if the header has not been read,
    /// the variable id is unknown, or the frame index is out of range.
    pub fn read_var_in_frame(&mut self, frame_index: usize, var_id: &str) -> Result<Vec<f64>> {
        let header = self.header.as_ref().ok_or_else(missing_header)?;
        let slot = header
            .variable_index(var_id)
            .ok_or_else(|| SerafinError::Request(f!("variable ID {var_id} not found")))?;
        check_frame(header, frame_index)?;

        trace!("Reading {var_id} in frame {frame_index}");
        self.records.seek(header.variable_offset(frame_index, slot))?;
        self.records
            .read_float_array(header.node_count(), header.precision())
    }

    /// Read the time and every variable of one frame
    pub fn read_frame(&mut self, frame_index: usize) -> Result<Frame> {
        let header = self.header.as_ref().ok_or_else(missing_header)?;
        check_frame(header, frame_index)?;

        // records of a frame are contiguous, one seek is enough
        self.records.seek(header.frame_offset(frame_index))?;
        let time = self.records.read_float_array(1, header.precision())?[0];
        let values = (0..header.variables().len())
            .map(|_| {
                self.records
                    .read_float_array(header.node_count(), header.precision())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Frame { time, values })
    }
}

#[doc(hidden)]
fn missing_header() -> SerafinError {
    SerafinError::Request("the header has not been read (call read_header first)".to_string())
}

#[doc(hidden)]
fn check_frame(header: &Header, frame_index: usize) -> Result<()> {
    if frame_index >= header.frame_count() {
        return Err(SerafinError::Request(f!(
            "frame {frame_index} requested but the file has {} frames",
            header.frame_count()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Precision;
    use crate::testing::{linear_field, square_file, square_header};
    use rstest::rstest;
    use std::io::Cursor;

    fn reader(precision: Precision, frames: usize) -> SerafinReader<Cursor<Vec<u8>>> {
        let bytes = square_file(precision, frames);
        let size = bytes.len() as u64;
        SerafinReader::new(Cursor::new(bytes), size, Language::En)
    }

    #[test]
    fn requests_before_header_fail() {
        let mut reader = reader(Precision::Single, 2);
        assert!(reader.header().unwrap_err().is_request());
        assert!(reader.scan_times().unwrap_err().is_request());
        assert!(reader.read_var_in_frame(0, "H").unwrap_err().is_request());
        assert!(reader.read_frame(0).unwrap_err().is_request());
    }

    #[rstest]
    #[case(Precision::Single)]
    #[case(Precision::Double)]
    fn times_of_every_frame(#[case] precision: Precision) {
        let mut reader = reader(precision, 3);
        assert_eq!(reader.read_header().unwrap().frame_count(), 3);
        assert!(reader.times().is_empty());
        assert_eq!(reader.scan_times().unwrap(), &[0.0, 10.0, 20.0]);
        assert_eq!(reader.read_time(1).unwrap(), 10.0);
    }

    #[rstest]
    #[case(Precision::Single)]
    #[case(Precision::Double)]
    fn values_are_read_from_the_right_frame(#[case] precision: Precision) {
        let mut reader = reader(precision, 4);
        reader.read_header().unwrap();
        let header = square_header(precision);

        // frames visited out of order on purpose
        for frame_index in [3, 0, 2, 1] {
            let values = reader.read_var_in_frame(frame_index, "H").unwrap();
            assert_eq!(values, linear_field(&header, frame_index as f64, 1.0, 2.0));
        }
    }

    #[test]
    fn whole_frame() {
        let mut reader = reader(Precision::Double, 2);
        reader.read_header().unwrap();
        let frame = reader.read_frame(1).unwrap();
        assert_eq!(frame.time, 10.0);
        assert_eq!(frame.values.len(), 1);
        assert_eq!(frame.values[0], vec![1.0, 2.0, 4.0, 3.0]);
    }

    #[test]
    fn bad_requests() {
        let mut reader = reader(Precision::Single, 2);
        reader.read_header().unwrap();
        assert!(reader.read_var_in_frame(0, "U").unwrap_err().is_request());
        assert!(reader.read_var_in_frame(2, "H").unwrap_err().is_request());
        assert!(reader.read_time(5).unwrap_err().is_request());
    }

    #[test]
    fn header_without_frames() {
        let mut reader = reader(Precision::Single, 0);
        assert_eq!(reader.read_header().unwrap().frame_count(), 0);
        assert!(reader.scan_times().unwrap().is_empty());
    }

    #[test]
    fn truncated_file_is_rejected() {
        let mut bytes = square_file(Precision::Single, 2);
        bytes.truncate(bytes.len() - 3);
        let size = bytes.len() as u64;
        let mut reader = SerafinReader::new(Cursor::new(bytes), size, Language::En);
        assert!(reader.read_header().unwrap_err().is_validation());
    }

    #[test]
    fn open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.slf");
        std::fs::write(&path, square_file(Precision::Single, 2)).unwrap();

        let mut reader = SerafinReader::open(&path, Language::En).unwrap();
        assert_eq!(reader.read_header().unwrap().file_size(), 320 + 2 * 36);
        assert_eq!(reader.read_var_in_frame(1, "H").unwrap()[2], 4.0);
    }
}
