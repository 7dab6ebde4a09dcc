//! Line parsers for the BlueKenue `i2s` line set format
//!
//! An `i2s` file starts with a header of `:Keyword value` lines, ended by
//! `:EndHeader`, followed by the polylines. Each polyline is a count line
//! (number of points and an attribute value) and then one `x y` line per
//! point.
//!
//! ```text
//! #########################################
//! :FileType i2s  ASCII  EnSim 1.0
//! :EndHeader
//! 2 0.0
//! 10.0 5.0
//! 20.0 5.0
//! ```

// crate modules
use crate::geometry::Point;

// external crates
use nom::character::complete::{digit1, space0, space1};
use nom::combinator::{map_res, opt};
use nom::number::complete::double;
use nom::sequence::{preceded, tuple};
use nom::IResult;

/// Comment lines, including the banner of `#` that often opens the file
pub fn is_comment(i: &str) -> bool {
    i.starts_with('#')
}

/// Header keyword lines such as `:FileType` or `:AttributeName 1`
pub fn is_keyword(i: &str) -> bool {
    i.starts_with(':')
}

/// Last line of the header
pub fn is_end_header(i: &str) -> bool {
    i.starts_with(":EndHeader")
}

/// Polyline count line, returning the number of points and the attribute
///
/// The attribute is optional and defaults to zero.
pub fn polyline_header(i: &str) -> IResult<&str, (usize, f64)> {
    let (i, (count, attribute)) = tuple((
        preceded(space0, map_res(digit1, str::parse::<usize>)),
        opt(preceded(space1, double)),
    ))(i)?;
    Ok((i, (count, attribute.unwrap_or(0.0))))
}

/// Point line holding at least `x y`, anything after the two values is left
pub fn point(i: &str) -> IResult<&str, Point> {
    let (i, (x, y)) = tuple((preceded(space0, double), preceded(space1, double)))(i)?;
    Ok((i, Point::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("5 0.0", 5, 0.0)]
    #[case("  12  3.5", 12, 3.5)]
    #[case("3", 3, 0.0)]
    fn count_lines(#[case] line: &str, #[case] count: usize, #[case] attribute: f64) {
        let (_, parsed) = polyline_header(line).unwrap();
        assert_eq!(parsed, (count, attribute));
    }

    #[rstest]
    #[case("1.5 -2.0", 1.5, -2.0)]
    #[case("\t3.2e5\t4.1e6", 3.2e5, 4.1e6)]
    #[case("10 20 30", 10.0, 20.0)]
    fn point_lines(#[case] line: &str, #[case] x: f64, #[case] y: f64) {
        let (_, p) = point(line).unwrap();
        assert_eq!(p, Point::new(x, y));
    }

    #[test]
    fn rejected_lines() {
        assert!(polyline_header("x 1.0").is_err());
        assert!(point("1.0").is_err());
        assert!(point("a b").is_err());
    }

    #[test]
    fn header_lines() {
        assert!(is_keyword(":FileType i2s  ASCII  EnSim 1.0"));
        assert!(is_end_header(":EndHeader"));
        assert!(!is_end_header(":EndTime"));
        assert!(is_comment("#########"));
    }
}
