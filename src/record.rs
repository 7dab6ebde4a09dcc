#![doc(hidden)]
//! Fortran-style sequential records
//!
//! Every physical record in a Serafin file is framed by its payload length,
//! written as a big-endian `i32` both before and after the payload:
//!
//! ```text
//! <payload byte length> <payload ...> <payload byte length>
//! ```
//!
//! The two markers are never assumed to agree. The reader checks the prefix
//! against the length implied by the header arithmetic and then checks the
//! suffix against the prefix, so that a misaligned or truncated file is
//! rejected as soon as the first bad record is reached.

// standard library
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

// internal modules
use crate::error::{Result, SerafinError};
use crate::header::Precision;
use crate::utils::f;

// external crates
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Size of a single length marker
pub const MARKER_SIZE: usize = std::mem::size_of::<i32>();

/// Fixed-width big-endian encoding used for the small integer records
///
/// Arrays and plain structs of `i32` serialise to exactly their packed size
/// with these options, so a struct can stand in for a record payload.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_big_endian()
}

/// Reads length-framed records from any `Read` source
#[derive(Debug)]
pub struct RecordReader<R> {
    inner: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read one record whose payload must be exactly `expected` bytes long
    pub fn read_record(&mut self, expected: usize) -> Result<Vec<u8>> {
        let prefix = self.read_marker()?;
        if prefix != expected {
            return Err(SerafinError::Validation(f!(
                "record length is {prefix} bytes where {expected} bytes were expected"
            )));
        }

        let mut payload = vec![0u8; expected];
        self.read_exact(&mut payload)?;

        let suffix = self.read_marker()?;
        if suffix != prefix {
            return Err(SerafinError::Validation(f!(
                "record suffix length {suffix} does not match its prefix {prefix}"
            )));
        }
        Ok(payload)
    }

    /// Read one record and decode it as a fixed-layout struct
    pub fn read_struct<T: DeserializeOwned>(&mut self, expected: usize) -> Result<T> {
        let payload = self.read_record(expected)?;
        Ok(codec().deserialize(&payload)?)
    }

    /// Read one record holding `count` big-endian `i32` values
    pub fn read_i32_array(&mut self, count: usize) -> Result<Vec<i32>> {
        let payload = self.read_record(count * std::mem::size_of::<i32>())?;
        Ok(payload
            .chunks_exact(std::mem::size_of::<i32>())
            .map(|chunk| {
                let mut buffer = [0u8; 4];
                buffer.copy_from_slice(chunk);
                i32::from_be_bytes(buffer)
            })
            .collect())
    }

    /// Read one record holding `count` floats at the given precision
    pub fn read_float_array(&mut self, count: usize, precision: Precision) -> Result<Vec<f64>> {
        let payload = self.read_record(count * precision.width())?;
        Ok(precision.decode(&payload))
    }

    /// Read a single length marker
    fn read_marker(&mut self) -> Result<usize> {
        let mut buffer = [0u8; MARKER_SIZE];
        self.read_exact(&mut buffer)?;
        let marker = i32::from_be_bytes(buffer);
        usize::try_from(marker)
            .map_err(|_| SerafinError::Validation(f!("negative record length {marker}")))
    }

    /// A short read means the file is shorter than its header claims
    fn read_exact(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buffer).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => {
                SerafinError::Validation("unexpected end of file inside a record".to_string())
            }
            _ => SerafinError::Io(e),
        })
    }
}

impl<R: Seek> RecordReader<R> {
    /// Move to an absolute byte offset, which must be the start of a record
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl<R> RecordReader<R> {
    /// Mutably borrow the underlying source
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

/// Writes length-framed records to any `Write` sink
#[derive(Debug)]
pub struct RecordWriter<W> {
    inner: W,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Write a payload framed by matching prefix and suffix markers
    pub fn write_record(&mut self, payload: &[u8]) -> Result<()> {
        let marker = i32::try_from(payload.len()).map_err(|_| {
            SerafinError::Request(f!("record of {} bytes is too large", payload.len()))
        })?;
        self.inner.write_all(&marker.to_be_bytes())?;
        self.inner.write_all(payload)?;
        self.inner.write_all(&marker.to_be_bytes())?;
        Ok(())
    }

    /// Encode a fixed-layout struct as one record
    pub fn write_struct<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let payload = codec().serialize(value)?;
        self.write_record(&payload)
    }

    /// Write one record holding big-endian `i32` values
    pub fn write_i32_array(&mut self, values: &[i32]) -> Result<()> {
        let payload: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(&payload)
    }

    /// Write one record holding floats encoded at the given precision
    pub fn write_float_array(&mut self, values: &[f64], precision: Precision) -> Result<()> {
        let mut payload = Vec::with_capacity(values.len() * precision.width());
        precision.encode(values, &mut payload);
        self.write_record(&payload)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink
    pub fn into_inner(self) -> W {
        self.inner
    }
}
