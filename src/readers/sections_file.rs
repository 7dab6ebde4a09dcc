// internal modules
use crate::geometry::{Point, Section};
use crate::readers::parsers;
use crate::utils::*;

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

// external crates
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, trace};

/// A simple reader for `i2s` line set files
///
/// Polylines are named `Section 1`, `Section 2`, ... in file order.
#[derive(Debug, Default)]
pub struct SectionsFileReader;

impl SectionsFileReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Parses every polyline of the file at `path` into a [Section]
    pub fn parse(&self, path: &Path) -> Result<Vec<(String, Section)>> {
        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        self.parse_from(BufReader::new(file))
            .with_context(|| f!("Could not read sections from {}", path.display()))
    }

    /// Same as [parse()](SectionsFileReader::parse) for any buffered source
    pub fn parse_from<R: Read>(&self, reader: BufReader<R>) -> Result<Vec<(String, Section)>> {
        let mut sections = Vec::new();
        let mut points: Vec<Point> = Vec::new();
        let mut remaining = 0;

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();

            if line.is_empty() || parsers::is_comment(line) {
                continue;
            }

            if parsers::is_keyword(line) {
                if parsers::is_end_header(line) {
                    trace!("[ Header ] end");
                } else {
                    trace!("[Keyword ] {line}");
                }
                continue;
            }

            if remaining == 0 {
                let (_, (count, attribute)) = parsers::polyline_header(line).map_err(|_| {
                    anyhow!("line {}: expected a polyline header, found \"{line}\"", n + 1)
                })?;
                trace!("[Polyline] {count} points, attribute {attribute}");
                remaining = count;
                points = Vec::with_capacity(count);
                continue;
            }

            let (_, point) = parsers::point(line).map_err(|_| {
                anyhow!("line {}: expected an \"x y\" point, found \"{line}\"", n + 1)
            })?;
            points.push(point);
            remaining -= 1;

            if remaining == 0 {
                let name = f!("Section {}", sections.len() + 1);
                let section = Section::new(std::mem::take(&mut points))
                    .with_context(|| f!("{name} ending on line {}", n + 1))?;
                sections.push((name, section));
            }
        }

        if remaining > 0 {
            bail!("file ended with {remaining} points missing from the last polyline");
        }

        debug!("Found {} sections", sections.len());
        Ok(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Vec<(String, Section)>> {
        SectionsFileReader::new().parse_from(BufReader::new(Cursor::new(text.as_bytes())))
    }

    const TWO_LINES: &str = "\
#########################################
:FileType i2s  ASCII  EnSim 1.0
:Application BlueKenue
:EndHeader
2 0.0
0.0 0.0
10.0 0.0
3 1.0
0.0 5.0
5.0 5.0
5.0 10.0
";

    #[test]
    fn named_in_file_order() {
        let sections = parse(TWO_LINES).unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].0, "Section 1");
        assert_eq!(sections[1].0, "Section 2");
        assert_eq!(sections[0].1.length(), 10.0);
        assert_eq!(sections[1].1.points()[2], Point::new(5.0, 10.0));
    }

    #[test]
    fn missing_points() {
        assert!(parse(":EndHeader\n3 0.0\n0.0 0.0\n1.0 1.0\n").is_err());
    }

    #[test]
    fn single_point_polyline() {
        assert!(parse(":EndHeader\n1 0.0\n0.0 0.0\n").is_err());
    }

    #[test]
    fn no_polylines() {
        assert!(parse(":FileType i2s\n:EndHeader\n").unwrap().is_empty());
    }

    #[test]
    fn read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sections.i2s");
        std::fs::write(&path, TWO_LINES).unwrap();
        assert_eq!(SectionsFileReader::new().parse(&path).unwrap().len(), 2);
    }
}
