//! Serafin header codec
//!
//! # Overview
//!
//! A Serafin file starts with a header describing the mesh and the variables
//! stored in every frame, followed by the frames themselves. The header is
//! parsed and validated in one go by [parse()], and every derived quantity
//! needed to address frames is cached on the resulting [Header].
//!
//! ```text
//! title (72) + file type (8)
//! number of variables, number of quadratic variables (always 0)
//! name (16) + unit (16)                     x number of variables
//! 10 integer parameters
//! 6 integer date                             if parameter 10 == 1
//! elements, nodes, nodes per element, 1
//! connectivity (IKLE)                        elements x nodes per element
//! boundary nodes (IPOBO)                     nodes
//! x coordinates, y coordinates               nodes, at file precision
//! ```
//!
//! Each line above is one length-framed record. All validation happens at
//! parse time, so a [Header] that exists always describes a file whose size
//! is exactly `header_size + frame_count * frame_size`.
//!
//! A [Header] is never modified in place. [Header::downcast_precision()] and
//! [Header::apply_coordinate_transform()] both return a new header.

// Split into subfiles, anything important is re-exported
mod builder;
mod variables;

#[doc(inline)]
pub use crate::header::builder::HeaderBuilder;

#[doc(inline)]
pub use crate::header::variables::{registered_unit, resolve_id, variable_id, Language};

// standard library
use std::io::{Read, Write};

// internal modules
use crate::error::{Result, SerafinError};
use crate::geometry::{Point, Transformation};
use crate::record::{RecordReader, RecordWriter, MARKER_SIZE};
use crate::utils::f;

// external crates
use log::debug;
use serde::{Deserialize, Serialize};

/// Bytes reserved for the title
pub const TITLE_SIZE: usize = 72;
/// Bytes reserved for the file type tag following the title
pub const FILE_TYPE_SIZE: usize = 8;
/// Bytes reserved for each variable name and each unit
pub const NAME_SIZE: usize = 16;
/// Number of integer parameters
pub const PARAM_COUNT: usize = 10;
/// Number of integers in the optional date record
pub const DATE_COUNT: usize = 6;

/// Parameter holding the number of planes, 0 for a 2D mesh
const PLANES_PARAM: usize = 6;
/// Parameter flagging the presence of the date record
const DATE_PARAM: usize = 9;

const INT_SIZE: usize = std::mem::size_of::<i32>();

/// Float width of the values stored in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Precision {
    /// 4-byte floats, file type `SERAFIN `
    Single,
    /// 8-byte floats, file type `SERAFIND`
    Double,
}

impl Precision {
    /// Number of bytes for one value
    pub const fn width(self) -> usize {
        match self {
            Self::Single => 4,
            Self::Double => 8,
        }
    }

    /// File type tag written after the title
    pub const fn file_type(self) -> &'static [u8; FILE_TYPE_SIZE] {
        match self {
            Self::Single => b"SERAFIN ",
            Self::Double => b"SERAFIND",
        }
    }

    /// Identify the precision from a file type tag
    ///
    /// Trailing spaces and NUL padding are ignored.
    ///
    /// ```rust
    /// # use serafin::header::Precision;
    /// assert_eq!(Precision::from_file_type(b"SERAFIN "), Some(Precision::Single));
    /// assert_eq!(Precision::from_file_type(b"SERAFIND"), Some(Precision::Double));
    /// assert_eq!(Precision::from_file_type(b"GRIB2   "), None);
    /// ```
    pub fn from_file_type(tag: &[u8]) -> Option<Self> {
        let end = tag
            .iter()
            .rposition(|b| !matches!(b, b' ' | 0))
            .map_or(0, |i| i + 1);
        match &tag[..end] {
            b"SERAFIN" => Some(Self::Single),
            b"SERAFIND" => Some(Self::Double),
            _ => None,
        }
    }

    /// Decode big-endian floats, widened to `f64`
    pub fn decode(self, bytes: &[u8]) -> Vec<f64> {
        match self {
            Self::Single => bytes
                .chunks_exact(4)
                .map(|chunk| {
                    let mut buffer = [0u8; 4];
                    buffer.copy_from_slice(chunk);
                    f32::from_be_bytes(buffer) as f64
                })
                .collect(),
            Self::Double => bytes
                .chunks_exact(8)
                .map(|chunk| {
                    let mut buffer = [0u8; 8];
                    buffer.copy_from_slice(chunk);
                    f64::from_be_bytes(buffer)
                })
                .collect(),
        }
    }

    /// Encode values as big-endian floats of this width
    ///
    /// Narrowing to single precision rounds to the nearest `f32`, so values
    /// read from a single precision file are written back bit-exact.
    pub fn encode(self, values: &[f64], out: &mut Vec<u8>) {
        match self {
            Self::Single => values
                .iter()
                .for_each(|v| out.extend_from_slice(&(*v as f32).to_be_bytes())),
            Self::Double => values
                .iter()
                .for_each(|v| out.extend_from_slice(&v.to_be_bytes())),
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Double => write!(f, "double"),
        }
    }
}

/// A variable declared in the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    /// Canonical id, or the trimmed name for unregistered variables
    pub id: String,
    /// Display name as written in the file, without trailing padding
    pub name: String,
    /// Unit as written in the file, without trailing padding
    pub unit: String,
}

/// Payload of the variable count record
#[derive(Debug, Serialize, Deserialize)]
struct VariableCounts {
    linear: i32,
    quadratic: i32,
}

/// Payload of the record following the parameters
#[derive(Debug, Serialize, Deserialize)]
struct Topology {
    element_count: i32,
    node_count: i32,
    nodes_per_element: i32,
    magic: i32,
}

/// Parsed and validated Serafin header
///
/// Coordinates are held as `f64` whatever the file precision; widening from
/// `f32` is exact so nothing is lost for single precision files.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    title: String,
    precision: Precision,
    language: Language,
    variables: Vec<Variable>,
    params: [i32; PARAM_COUNT],
    date: Option<[i32; DATE_COUNT]>,
    element_count: usize,
    node_count: usize,
    nodes_per_element: usize,
    ikle: Vec<i32>,
    ipobo: Vec<i32>,
    x: Vec<f64>,
    y: Vec<f64>,
    header_size: u64,
    frame_size: u64,
    frame_count: usize,
    file_size: u64,
}

/// Parse and validate a header from the start of a file
///
/// - `reader` - Source positioned at the first byte of the file
/// - `file_size` - Total length of the file in bytes
/// - `language` - Language used to resolve variable names into ids
///
/// Fails with a [SerafinError::Validation] if the file is empty, the file
/// type is unknown, there are quadratic variables, the magic number is not 1,
/// the mesh description is inconsistent, or the remaining bytes are not a
/// whole number of frames.
pub fn parse<R: Read>(reader: R, file_size: u64, language: Language) -> Result<Header> {
    if file_size == 0 {
        return Err(SerafinError::Validation(
            "file is empty (file size is equal to 0)".to_string(),
        ));
    }
    let mut records = RecordReader::new(reader);

    // title and file type share a record
    let record = records.read_record(TITLE_SIZE + FILE_TYPE_SIZE)?;
    let (title, file_type) = record.split_at(TITLE_SIZE);
    let precision = Precision::from_file_type(file_type).ok_or_else(|| {
        SerafinError::Validation(f!(
            "unknown file type \"{}\"",
            String::from_utf8_lossy(file_type)
        ))
    })?;
    debug!("The file type is: \"{}\"", String::from_utf8_lossy(file_type));

    // number of linear and quadratic variables
    let counts: VariableCounts = records.read_struct(2 * INT_SIZE)?;
    if counts.quadratic != 0 {
        return Err(SerafinError::Validation(
            "the number of quadratic variables is not equal to zero".to_string(),
        ));
    }
    let var_count = non_negative(counts.linear, "number of variables")?;
    debug!("The file has {var_count} variables");

    let mut names = Vec::with_capacity(var_count);
    for _ in 0..var_count {
        let record = records.read_record(2 * NAME_SIZE)?;
        let (name, unit) = record.split_at(NAME_SIZE);
        names.push((decode_text(name), decode_text(unit)));
    }

    let params: [i32; PARAM_COUNT] = records.read_struct(PARAM_COUNT * INT_SIZE)?;
    let date = match params[DATE_PARAM] {
        1 => Some(records.read_struct::<[i32; DATE_COUNT]>(DATE_COUNT * INT_SIZE)?),
        _ => None,
    };

    let topology: Topology = records.read_struct(4 * INT_SIZE)?;
    if topology.magic != 1 {
        return Err(SerafinError::Validation(
            "the magic number is not equal to one".to_string(),
        ));
    }
    let element_count = non_negative(topology.element_count, "number of elements")?;
    let node_count = non_negative(topology.node_count, "number of nodes")?;
    let nodes_per_element = non_negative(topology.nodes_per_element, "nodes per element")?;
    validate_mesh_shape(params[PLANES_PARAM], element_count, nodes_per_element)?;
    debug!(
        "The file is determined to be {}",
        match params[PLANES_PARAM] {
            0 => "2D",
            _ => "3D",
        }
    );

    // check the frame arithmetic before any large array is allocated
    let (header_size, frame_size) = layout(
        precision,
        var_count,
        date.is_some(),
        element_count * nodes_per_element,
        node_count,
    );
    let frame_count = count_frames(file_size, header_size, frame_size)?;
    debug!("The file has {frame_count} frames of size {frame_size} bytes");

    let ikle = records.read_i32_array(element_count * nodes_per_element)?;
    let ipobo = records.read_i32_array(node_count)?;
    let x = records.read_float_array(node_count, precision)?;
    let y = records.read_float_array(node_count, precision)?;

    let mut header = Header::from_parts(
        decode_text(title),
        precision,
        language,
        names,
        params,
        date,
        nodes_per_element,
        ikle,
        ipobo,
        x,
        y,
    )?;
    header.frame_count = frame_count;
    header.file_size = file_size;

    debug!("Finished reading the header");
    Ok(header)
}

/// Constructors and size bookkeeping
impl Header {
    /// Assemble a header from decoded parts, running the mesh checks
    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        title: String,
        precision: Precision,
        language: Language,
        names: Vec<(String, String)>,
        params: [i32; PARAM_COUNT],
        date: Option<[i32; DATE_COUNT]>,
        nodes_per_element: usize,
        ikle: Vec<i32>,
        ipobo: Vec<i32>,
        x: Vec<f64>,
        y: Vec<f64>,
    ) -> Result<Self> {
        if nodes_per_element == 0 || ikle.len() % nodes_per_element != 0 {
            return Err(SerafinError::Validation(f!(
                "{} connectivity values do not form whole elements of {nodes_per_element} nodes",
                ikle.len()
            )));
        }
        let element_count = ikle.len() / nodes_per_element;
        validate_mesh_shape(params[PLANES_PARAM], element_count, nodes_per_element)?;

        let node_count = x.len();
        if y.len() != node_count || ipobo.len() != node_count {
            return Err(SerafinError::Validation(f!(
                "inconsistent node arrays ({} x, {} y, {} boundary values)",
                node_count,
                y.len(),
                ipobo.len()
            )));
        }
        if let Some(node) = ikle
            .iter()
            .find(|&&n| n < 1 || n as usize > node_count)
        {
            return Err(SerafinError::Validation(f!(
                "connectivity refers to node {node} outside of 1..={node_count}"
            )));
        }
        validate_base_plane(params[PLANES_PARAM], &ikle, nodes_per_element, node_count)?;
        if date.is_some() != (params[DATE_PARAM] == 1) {
            return Err(SerafinError::Validation(
                "date record presence does not match the date parameter".to_string(),
            ));
        }

        let is_2d = params[PLANES_PARAM] == 0;
        let variables = names
            .into_iter()
            .map(|(name, unit)| Variable {
                id: variable_id(&name, language, is_2d),
                name,
                unit,
            })
            .collect::<Vec<Variable>>();

        let (header_size, frame_size) = layout(
            precision,
            variables.len(),
            date.is_some(),
            ikle.len(),
            node_count,
        );

        Ok(Self {
            title,
            precision,
            language,
            variables,
            params,
            date,
            element_count,
            node_count,
            nodes_per_element,
            ikle,
            ipobo,
            x,
            y,
            header_size,
            frame_size,
            frame_count: 0,
            file_size: header_size,
        })
    }

    /// Copy of the header converted to single precision
    ///
    /// Only the file type and the derived sizes change. Coordinates and frame
    /// values are narrowed to `f32` when they are written.
    pub fn downcast_precision(&self) -> Self {
        let mut header = self.clone();
        header.precision = Precision::Single;
        let (header_size, frame_size) = layout(
            header.precision,
            header.variables.len(),
            header.date.is_some(),
            header.ikle.len(),
            header.node_count,
        );
        header.header_size = header_size;
        header.frame_size = frame_size;
        header.file_size = header_size + header.frame_count as u64 * frame_size;
        header
    }

    /// Copy of the header with every node moved by a sequence of transforms
    ///
    /// Transforms are applied in order to each `(x, y)` pair. With no
    /// transforms the copy is identical to the original.
    ///
    /// ```rust
    /// # use serafin::header::HeaderBuilder;
    /// # use serafin::geometry::{Affine, Transformation};
    /// let header = HeaderBuilder::new("square")
    ///     .triangles(&[[0, 1, 2]])
    ///     .coordinates(vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0])
    ///     .build()
    ///     .unwrap();
    ///
    /// let shift = Affine::translation(10.0, 0.0);
    /// let moved = header.apply_coordinate_transform(&[&shift]);
    /// assert_eq!(moved.x(), &[10.0, 11.0, 10.0]);
    /// assert_eq!(header.x(), &[0.0, 1.0, 0.0]);
    /// ```
    pub fn apply_coordinate_transform(&self, transforms: &[&dyn Transformation]) -> Self {
        let mut header = self.clone();
        if transforms.is_empty() {
            return header;
        }
        for (x, y) in header.x.iter_mut().zip(header.y.iter_mut()) {
            let point = transforms
                .iter()
                .fold(Point::new(*x, *y), |p, t| t.transform(p));
            *x = point.x;
            *y = point.y;
        }
        header
    }

    /// Write every header record
    pub(crate) fn write_records<W: Write>(&self, records: &mut RecordWriter<W>) -> Result<()> {
        let mut title = encode_text(&self.title, TITLE_SIZE);
        title.extend_from_slice(self.precision.file_type());
        records.write_record(&title)?;

        records.write_struct(&VariableCounts {
            linear: to_i32(self.variables.len())?,
            quadratic: 0,
        })?;

        for variable in &self.variables {
            let mut record = encode_text(&variable.name, NAME_SIZE);
            record.extend(encode_text(&variable.unit, NAME_SIZE));
            records.write_record(&record)?;
        }

        records.write_struct(&self.params)?;
        if let Some(date) = &self.date {
            records.write_struct(date)?;
        }

        records.write_struct(&Topology {
            element_count: to_i32(self.element_count)?,
            node_count: to_i32(self.node_count)?,
            nodes_per_element: to_i32(self.nodes_per_element)?,
            magic: 1,
        })?;

        records.write_i32_array(&self.ikle)?;
        records.write_i32_array(&self.ipobo)?;
        records.write_float_array(&self.x, self.precision)?;
        records.write_float_array(&self.y, self.precision)?;
        Ok(())
    }
}

/// Field access
impl Header {
    /// Title without trailing padding
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn is_double_precision(&self) -> bool {
        self.precision == Precision::Double
    }

    /// File type tag matching the precision
    pub fn file_type(&self) -> &'static [u8; FILE_TYPE_SIZE] {
        self.precision.file_type()
    }

    /// Language used to resolve the variable ids
    pub fn language(&self) -> Language {
        self.language
    }

    /// Declared variables, in file order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variable ids, in file order
    pub fn var_ids(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.id.as_str()).collect()
    }

    /// 0-based slot of a variable within a frame
    pub fn variable_index(&self, var_id: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.id == var_id)
    }

    /// The 10 integer parameters
    pub fn params(&self) -> &[i32; PARAM_COUNT] {
        &self.params
    }

    /// Simulation start date as year, month, day, hour, minute, second
    pub fn date(&self) -> Option<&[i32; DATE_COUNT]> {
        self.date.as_ref()
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// 3 for a 2D mesh, 6 for a layered 3D mesh
    pub fn nodes_per_element(&self) -> usize {
        self.nodes_per_element
    }

    /// Number of planes of a 3D mesh, 0 for a 2D mesh
    pub fn plane_count(&self) -> usize {
        self.params[PLANES_PARAM].max(0) as usize
    }

    pub fn is_2d(&self) -> bool {
        self.params[PLANES_PARAM] == 0
    }

    /// Number of nodes in a single plane
    pub fn node_count_2d(&self) -> usize {
        match self.is_2d() {
            true => self.node_count,
            false => self.node_count / self.plane_count(),
        }
    }

    /// Raw 1-based connectivity array, `nodes_per_element` values per element
    pub fn ikle(&self) -> &[i32] {
        &self.ikle
    }

    /// 0-based triangles of the base plane
    ///
    /// For a 3D mesh these are the first three nodes of each prism in the
    /// bottom layer.
    pub fn ikle_2d(&self) -> Vec<[usize; 3]> {
        let rows = match self.is_2d() {
            true => self.element_count,
            false => self.element_count / (self.plane_count() - 1),
        };
        self.ikle
            .chunks_exact(self.nodes_per_element)
            .take(rows)
            .map(|e| [e[0] as usize - 1, e[1] as usize - 1, e[2] as usize - 1])
            .collect()
    }

    /// Boundary node numbering
    pub fn ipobo(&self) -> &[i32] {
        &self.ipobo
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Bytes taken by the header records
    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    /// Bytes taken by one frame
    pub fn frame_size(&self) -> u64 {
        self.frame_size
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Expected total file size
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}

/// Frame addressing
impl Header {
    /// Bytes taken by the time record at the start of each frame
    pub fn time_record_size(&self) -> u64 {
        (self.precision.width() + 2 * MARKER_SIZE) as u64
    }

    /// Bytes taken by the record of one variable in a frame
    pub fn variable_block_size(&self) -> u64 {
        (self.precision.width() * self.node_count + 2 * MARKER_SIZE) as u64
    }

    /// Absolute offset of a frame
    pub fn frame_offset(&self, frame_index: usize) -> u64 {
        self.header_size + frame_index as u64 * self.frame_size
    }

    /// Absolute offset of the record holding one variable in one frame
    pub fn variable_offset(&self, frame_index: usize, slot: usize) -> u64 {
        self.frame_offset(frame_index)
            + self.time_record_size()
            + slot as u64 * self.variable_block_size()
    }
}

/// Summaries
impl Header {
    /// One sentence description of the file
    pub fn summary(&self) -> String {
        let n_var = self.variables.len();
        f!(
            "The file is of type {} {}. It has {} variable{}{},\non {} nodes and {} elements for {} time frame{}.",
            String::from_utf8_lossy(self.file_type()),
            match self.is_2d() {
                true => "2D",
                false => "3D",
            },
            n_var,
            if n_var > 1 { "s" } else { "" },
            match self.is_2d() {
                true => String::new(),
                false => f!(", {} planes", self.plane_count()),
            },
            self.node_count,
            self.element_count,
            self.frame_count,
            if self.frame_count > 1 { "s" } else { "" },
        )
    }

    /// Serialisable overview without the large arrays
    pub fn summary_data(&self) -> HeaderSummary {
        HeaderSummary {
            title: self.title.clone(),
            precision: self.precision,
            dimension: if self.is_2d() { 2 } else { 3 },
            variables: self.variables.clone(),
            plane_count: self.plane_count(),
            element_count: self.element_count,
            node_count: self.node_count,
            nodes_per_element: self.nodes_per_element,
            date: self.date,
            header_size: self.header_size,
            frame_size: self.frame_size,
            frame_count: self.frame_count,
            file_size: self.file_size,
        }
    }
}

impl std::fmt::Display for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Overview of a [Header] for reporting
#[derive(Debug, Clone, Serialize)]
pub struct HeaderSummary {
    pub title: String,
    pub precision: Precision,
    pub dimension: u8,
    pub variables: Vec<Variable>,
    pub plane_count: usize,
    pub element_count: usize,
    pub node_count: usize,
    pub nodes_per_element: usize,
    pub date: Option<[i32; DATE_COUNT]>,
    pub header_size: u64,
    pub frame_size: u64,
    pub frame_count: usize,
    pub file_size: u64,
}

/// Header and frame sizes in bytes
fn layout(
    precision: Precision,
    var_count: usize,
    has_date: bool,
    ikle_len: usize,
    node_count: usize,
) -> (u64, u64) {
    let framing = 2 * MARKER_SIZE;
    let width = precision.width();

    let header_size = (TITLE_SIZE + FILE_TYPE_SIZE + framing)
        + (2 * INT_SIZE + framing)
        + var_count * (2 * NAME_SIZE + framing)
        + (PARAM_COUNT * INT_SIZE + framing)
        + has_date as usize * (DATE_COUNT * INT_SIZE + framing)
        + (4 * INT_SIZE + framing)
        + (ikle_len * INT_SIZE + framing)
        + (node_count * INT_SIZE + framing)
        + 2 * (node_count * width + framing);

    let frame_size = (width + framing) + var_count * (node_count * width + framing);

    (header_size as u64, frame_size as u64)
}

/// Whole number of frames following the header
fn count_frames(file_size: u64, header_size: u64, frame_size: u64) -> Result<usize> {
    let remaining = file_size.checked_sub(header_size).ok_or_else(|| {
        SerafinError::Validation(f!(
            "file size {file_size} is smaller than the header size {header_size}"
        ))
    })?;
    if remaining % frame_size != 0 {
        return Err(SerafinError::Validation(f!(
            "something wrong with the file size: {remaining} bytes after the header \
             are not a whole number of {frame_size} byte frames"
        )));
    }
    Ok((remaining / frame_size) as usize)
}

/// Dimension checks on the mesh description
fn validate_mesh_shape(planes: i32, element_count: usize, nodes_per_element: usize) -> Result<()> {
    if planes == 0 {
        if nodes_per_element != 3 {
            return Err(SerafinError::Validation(f!(
                "unknown mesh type: a 2D mesh has 3 nodes per element, found {nodes_per_element}"
            )));
        }
        return Ok(());
    }

    if nodes_per_element != 6 {
        return Err(SerafinError::Validation(f!(
            "the number of nodes per element is not equal to 6 (found {nodes_per_element})"
        )));
    }
    if planes < 2 {
        return Err(SerafinError::Validation(f!(
            "the number of planes is less than 2 (found {planes})"
        )));
    }
    if element_count % (planes as usize - 1) != 0 {
        return Err(SerafinError::Validation(f!(
            "the number of elements {element_count} is not divisible by the number of layers {}",
            planes - 1
        )));
    }
    Ok(())
}

/// Bottom layer triangles of a 3D mesh must only use nodes of the first plane
fn validate_base_plane(
    planes: i32,
    ikle: &[i32],
    nodes_per_element: usize,
    node_count: usize,
) -> Result<()> {
    if planes == 0 {
        return Ok(());
    }
    let planes = planes as usize;
    if node_count % planes != 0 {
        return Err(SerafinError::Validation(f!(
            "the number of nodes {node_count} is not divisible by the number of planes {planes}"
        )));
    }

    let nodes_2d = node_count / planes;
    let rows = ikle.len() / nodes_per_element / (planes - 1);
    let outside = ikle
        .chunks_exact(nodes_per_element)
        .take(rows)
        .flat_map(|prism| prism[..3].iter())
        .find(|&&n| n as usize > nodes_2d);
    match outside {
        Some(node) => Err(SerafinError::Validation(f!(
            "bottom layer refers to node {node} outside of the first plane (1..={nodes_2d})"
        ))),
        None => Ok(()),
    }
}

fn non_negative(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| SerafinError::Validation(f!("negative {what} ({value})")))
}

fn to_i32(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| SerafinError::Request(f!("{value} does not fit in a 32-bit integer")))
}

/// Text field without trailing spaces or NUL padding
fn decode_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches([' ', '\0'])
        .to_string()
}

/// Text truncated or padded with spaces to exactly `width` bytes
fn encode_text(text: &str, width: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = text.bytes().take(width).collect();
    bytes.resize(width, b' ');
    bytes
}
