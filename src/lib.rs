//! # The Serafin crate
//!
//! A collection of tools for reading, writing and post-processing Serafin
//! (Selafin) result files, the binary mesh format of the Telemac system
//!
//! ## Installation
//!
//! Direct install from the repository:
//!
//! ```shell
//! cargo install --path .
//! ```
//!
//! ## Overview
//!
//! The crate contains several command line tools for quickly performing common
//! tasks relating to Serafin files.
//!
//! | Command line | Description                                                |
//! | ------------ | ---------------------------------------------------------- |
//! | `slfinfo`    | Summarise the header and time frames of a file             |
//! | `slfflux`    | Compute flux time series through cross-sections            |
//! | `slfconvert` | Copy a file with a precision change or moved coordinates   |
//! | `slfproject` | Values along lines, projected onto a reference line        |
//!
//! All tools are fully documented with detailed `--help` messages, including
//! examples for common use cases.
//!
//! ### Supported file types
//!
//! | File type  | Description                                            |
//! | ---------- | ------------------------------------------------------ |
//! | `SERAFIN ` | Single precision, 4-byte floats                        |
//! | `SERAFIND` | Double precision, 8-byte floats                        |
//!
//! 2D meshes of triangles and 3D meshes of prisms stacked over several planes
//! are both read. Flux calculations work on the triangles of the base plane.
//!
//! ### Supported flux kinds
//!
//! | Kind                                                     | Variables   |
//! | -------------------------------------------------------- | ----------- |
//! | [line_integral](crate::flux::FluxKind::LineIntegral)     | f           |
//! | [line_double_integral](crate::flux::FluxKind::LineDoubleIntegral) | f, h |
//! | [line_flux](crate::flux::FluxKind::LineFlux)             | u, v        |
//! | [area_flux](crate::flux::FluxKind::AreaFlux)             | u, v, h     |
//! | [mass_flux](crate::flux::FluxKind::MassFlux)             | u, v, h, c  |
//!
//! ## Advanced use
//!
//! The readers are random access. Once the header is validated, any variable
//! of any frame is a single seek away, however large the file.
//!
//! ```rust,no_run
//! use serafin::{FluxCalculator, Language, SerafinReader};
//! use serafin::flux::FluxKind;
//!
//! // open a result file and validate its header
//! let mut reader = SerafinReader::open("r2d_tidal.slf", Language::En)?;
//! let header = reader.read_header()?.clone();
//!
//! // discharge through every section of a BlueKenue line set
//! let sections = serafin::read_sections_file("sections.i2s")?;
//! let ids = ["U", "V", "H"].map(String::from).to_vec();
//! let mut calculator = FluxCalculator::new(FluxKind::AreaFlux, ids, sections, 1)?;
//! calculator.construct_triangles(&header);
//! calculator.construct_intersections()?;
//!
//! let result = calculator.run(&mut reader)?;
//! result.write_csv(&mut std::io::stdout(), ";", 6)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! As an overview:
//! - The [header] module parses, validates and builds file headers, and holds
//! the frame arithmetic used to address any record in a file.
//! - The [readers] module contains the random access [SerafinReader] and the
//! reader for `i2s` section files.
//! - The [writer] module writes new files frame by frame.
//! - The [mesh] module locates sections on the triangles of a mesh.
//! - The [flux] module evaluates the flux formulas and runs them over time.
//! - The [geometry] module has the small planar types shared by the others.
//!
//! In the background, `bincode` decodes the fixed-layout integer records,
//! `nom` parses section files, and `clap` is used for command line interface.

// Public facing modules
pub mod error;
pub mod flux;
pub mod geometry;
pub mod header;
pub mod mesh;
pub mod projection;
pub mod utils;
pub mod writer;

// note that docs are hidden to prevent confusing the current simple API
pub mod readers;
pub mod record;

#[cfg(test)]
mod testing;

// Re-exports of useful data structures
#[doc(inline)]
pub use crate::error::{Result, SerafinError};

#[doc(inline)]
pub use crate::flux::FluxCalculator;

#[doc(inline)]
pub use crate::header::{Header, Language};

#[doc(inline)]
pub use crate::readers::{read_header, read_sections_file, SerafinReader};

#[doc(inline)]
pub use crate::writer::SerafinWriter;
