//! Construction of new headers from scratch
//!
//! Headers read from files come from [parse()](crate::header::parse). The
//! builder covers the other case of synthesising a file, and runs the same
//! mesh checks before handing back a [Header].

// internal modules
use crate::error::{Result, SerafinError};
use crate::header::{
    Header, Language, Precision, DATE_COUNT, DATE_PARAM, NAME_SIZE, PARAM_COUNT, PLANES_PARAM,
    TITLE_SIZE,
};
use crate::utils::f;

/// Builder for a valid [Header]
///
/// Defaults to a single precision 2D mesh with English variable names, no
/// date, and zeros for the boundary node numbering.
///
/// ```rust
/// # use serafin::header::{HeaderBuilder, Precision};
/// let header = HeaderBuilder::new("two triangles")
///     .precision(Precision::Double)
///     .variable("VELOCITY U", "M/S")
///     .variable("VELOCITY V", "M/S")
///     .triangles(&[[0, 1, 2], [0, 2, 3]])
///     .coordinates(vec![0.0, 1.0, 1.0, 0.0], vec![0.0, 0.0, 1.0, 1.0])
///     .build()
///     .unwrap();
///
/// assert_eq!(header.var_ids(), vec!["U", "V"]);
/// assert_eq!(header.element_count(), 2);
/// assert!(header.is_double_precision());
/// ```
#[derive(Debug, Clone)]
pub struct HeaderBuilder {
    title: String,
    precision: Precision,
    language: Language,
    variables: Vec<(String, String)>,
    params: [i32; PARAM_COUNT],
    date: Option<[i32; DATE_COUNT]>,
    nodes_per_element: usize,
    ikle: Vec<i32>,
    ipobo: Option<Vec<i32>>,
    x: Vec<f64>,
    y: Vec<f64>,
    frame_count: usize,
}

impl HeaderBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            precision: Precision::Single,
            language: Language::En,
            variables: Vec::new(),
            params: [0; PARAM_COUNT],
            date: None,
            nodes_per_element: 3,
            ikle: Vec::new(),
            ipobo: None,
            x: Vec::new(),
            y: Vec::new(),
            frame_count: 0,
        }
    }

    pub fn precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Language used to resolve variable names into ids
    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Declare a variable, in frame order
    pub fn variable(mut self, name: &str, unit: &str) -> Self {
        self.variables.push((name.to_string(), unit.to_string()));
        self
    }

    /// Simulation start date as year, month, day, hour, minute, second
    pub fn date(mut self, date: [i32; DATE_COUNT]) -> Self {
        self.date = Some(date);
        self.params[DATE_PARAM] = 1;
        self
    }

    /// 2D triangles given as 0-based node indices
    pub fn triangles(mut self, triangles: &[[usize; 3]]) -> Self {
        self.nodes_per_element = 3;
        self.params[PLANES_PARAM] = 0;
        self.ikle = triangles
            .iter()
            .flat_map(|t| t.iter().map(|&n| n as i32 + 1))
            .collect();
        self
    }

    /// 3D prisms given as 0-based node indices, stacked over `planes` planes
    pub fn prisms(mut self, prisms: &[[usize; 6]], planes: usize) -> Self {
        self.nodes_per_element = 6;
        self.params[PLANES_PARAM] = planes as i32;
        self.ikle = prisms
            .iter()
            .flat_map(|p| p.iter().map(|&n| n as i32 + 1))
            .collect();
        self
    }

    /// Node coordinates, which also set the number of nodes
    pub fn coordinates(mut self, x: Vec<f64>, y: Vec<f64>) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Boundary node numbering, zeros by default
    pub fn boundary(mut self, ipobo: Vec<i32>) -> Self {
        self.ipobo = Some(ipobo);
        self
    }

    /// Number of frames expected to follow, used for the file size
    pub fn frame_count(mut self, frame_count: usize) -> Self {
        self.frame_count = frame_count;
        self
    }

    /// Validate the mesh and compute the derived sizes
    pub fn build(self) -> Result<Header> {
        if self.x.is_empty() {
            return Err(SerafinError::Validation(
                "a header needs at least one node".to_string(),
            ));
        }
        if self.ikle.is_empty() {
            return Err(SerafinError::Validation(
                "a header needs at least one element".to_string(),
            ));
        }
        if self.title.len() > TITLE_SIZE {
            return Err(SerafinError::Validation(f!(
                "title is {} bytes long, at most {TITLE_SIZE} fit in the header",
                self.title.len()
            )));
        }
        if let Some((name, _)) = self.variables.iter().find(|(name, _)| name.len() > NAME_SIZE) {
            return Err(SerafinError::Validation(f!(
                "variable name \"{name}\" is longer than {NAME_SIZE} characters"
            )));
        }
        if let Some((_, unit)) = self.variables.iter().find(|(_, unit)| unit.len() > NAME_SIZE) {
            return Err(SerafinError::Validation(f!(
                "variable unit \"{unit}\" is longer than {NAME_SIZE} characters"
            )));
        }

        let ipobo = self.ipobo.unwrap_or_else(|| vec![0; self.x.len()]);
        let mut header = Header::from_parts(
            self.title,
            self.precision,
            self.language,
            self.variables,
            self.params,
            self.date,
            self.nodes_per_element,
            self.ikle,
            ipobo,
            self.x,
            self.y,
        )?;
        header.frame_count = self.frame_count;
        header.file_size = header.header_size + self.frame_count as u64 * header.frame_size;
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn unit_triangle() -> HeaderBuilder {
        HeaderBuilder::new("unit")
            .triangles(&[[0, 1, 2]])
            .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
    }

    #[test]
    fn defaults() {
        let header = unit_triangle().build().unwrap();
        assert_eq!(header.precision(), Precision::Single);
        assert_eq!(header.ipobo(), &[0, 0, 0]);
        assert_eq!(header.date(), None);
        assert_eq!(header.frame_count(), 0);
        assert_eq!(header.file_size(), header.header_size());
    }

    #[test]
    fn frame_count_sets_file_size() {
        let header = unit_triangle().variable("WATER DEPTH", "M").frame_count(3).build().unwrap();
        assert_eq!(
            header.file_size(),
            header.header_size() + 3 * header.frame_size()
        );
    }

    #[test]
    fn connectivity_must_reference_nodes() {
        let result = HeaderBuilder::new("bad")
            .triangles(&[[0, 1, 5]])
            .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
            .build();
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn coordinate_lengths_must_agree() {
        let result = HeaderBuilder::new("bad")
            .triangles(&[[0, 1, 2]])
            .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0])
            .build();
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn single_plane_is_not_a_3d_mesh() {
        let result = HeaderBuilder::new("bad")
            .prisms(&[[0, 1, 2, 0, 1, 2]], 1)
            .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
            .build();
        assert!(result.unwrap_err().is_validation());
    }

    #[rstest]
    #[case("T".repeat(73), "WATER DEPTH", "M")]
    #[case("depth".to_string(), "A VERY LONG VARIABLE NAME", "M")]
    #[case("depth".to_string(), "WATER DEPTH", "METRES PER SECOND")]
    fn text_fields_must_fit(#[case] title: String, #[case] name: &str, #[case] unit: &str) {
        let result = HeaderBuilder::new(&title)
            .variable(name, unit)
            .triangles(&[[0, 1, 2]])
            .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
            .build();
        assert!(result.unwrap_err().is_validation());
    }

    #[test]
    fn text_fields_at_the_limit() {
        let header = HeaderBuilder::new(&"T".repeat(TITLE_SIZE))
            .variable("WATER DEPTH", &"M".repeat(NAME_SIZE))
            .triangles(&[[0, 1, 2]])
            .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
            .build()
            .unwrap();
        assert_eq!(header.title().len(), TITLE_SIZE);
        assert_eq!(header.variables()[0].unit.len(), NAME_SIZE);
    }

    #[test]
    fn french_names() {
        let header = unit_triangle()
            .language(Language::Fr)
            .variable("VITESSE U", "M/S")
            .build()
            .unwrap();
        assert_eq!(header.var_ids(), vec!["U"]);
        assert_eq!(header.language(), Language::Fr);
    }
}
