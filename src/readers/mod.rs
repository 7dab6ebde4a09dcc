//! Readers for Serafin result files and `i2s` section files

// internal modules
use crate::error::Result;
use crate::geometry::Section;
use crate::header::{Header, Language};

// standard library
use std::path::Path;

// files under the readers module
pub mod parsers;
mod sections_file;
mod serafin_file;

#[doc(inline)]
pub use crate::readers::serafin_file::{Frame, SerafinReader};

#[doc(inline)]
pub use crate::readers::sections_file::SectionsFileReader;

/// Read only the header of a Serafin file
///
/// - `path` - Path to the Serafin file, can be [&str], [String], [Path], etc...
/// - `language` - Language of the variable names in the file
///
/// Example
/// ```ignore
/// let header = serafin::read_header("path/to/r2d.slf", Language::En)?;
/// println!("{}", header.summary());
/// ```
pub fn read_header<P: AsRef<Path>>(path: P, language: Language) -> Result<Header> {
    let mut reader = SerafinReader::open(path, language)?;
    reader.read_header().cloned()
}

/// Read every polyline of an `i2s` file
///
/// Returns the sections paired with their names, `Section 1`, `Section 2`,
/// and so on in file order.
///
/// The file is interpreted with the following rules for a line:
///
/// | Example line                 | Interpretation               |
/// | ---------------------------- | ---------------------------- |
/// | Starts with `#`              | comment                      |
/// | Starts with `:`              | header keyword               |
/// | `5 0.0`                      | point count and attribute    |
/// | `1.0 2.0`                    | x, y of the next point       |
///
/// Example
/// ```ignore
/// let sections = serafin::read_sections_file("path/to/sections.i2s")?;
/// ```
pub fn read_sections_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<(String, Section)>> {
    let path: &Path = Path::new(path.as_ref());
    let reader = SectionsFileReader::new();
    reader.parse(path)
}
