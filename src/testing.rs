//! Shared fixtures for unit tests
//!
//! The reference mesh is the unit square split along its diagonal:
//!
//! ```text
//!  3 ------ 2
//!  |      / |
//!  |  1  /  |
//!  |    / 0 |
//!  |   /    |
//!  0 ------ 1
//! ```

use crate::header::{Header, HeaderBuilder, Precision};
use crate::record::RecordWriter;

/// Unit square with one `WATER DEPTH` variable
pub fn square_header(precision: Precision) -> Header {
    HeaderBuilder::new("square test mesh")
        .precision(precision)
        .variable("WATER DEPTH", "M")
        .triangles(&[[0, 1, 2], [0, 2, 3]])
        .coordinates(vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0])
        .build()
        .unwrap()
}

/// Linear field `a + b x + c y` evaluated on every node
pub fn linear_field(header: &Header, a: f64, b: f64, c: f64) -> Vec<f64> {
    header
        .x()
        .iter()
        .zip(header.y())
        .map(|(x, y)| a + b * x + c * y)
        .collect()
}

/// Bytes of a complete file with `frames` frames of the square mesh
///
/// Frame `i` has time `10 * i` and depth `i + x + 2y` on each node.
pub fn square_file(precision: Precision, frames: usize) -> Vec<u8> {
    let header = square_header(precision);
    let mut records = RecordWriter::new(Vec::new());
    header.write_records(&mut records).unwrap();
    for i in 0..frames {
        records
            .write_float_array(&[10.0 * i as f64], precision)
            .unwrap();
        records
            .write_float_array(&linear_field(&header, i as f64, 1.0, 2.0), precision)
            .unwrap();
    }
    records.into_inner()
}
