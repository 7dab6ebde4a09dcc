//! Command line tool to project values along lines onto a reference line
//!
//! Reads the polylines of a BlueKenue `i2s` line set, locates them on the mesh
//! of a Serafin file, and interpolates variables of one time frame at every
//! point where a line meets the mesh. Each point is then placed along one of
//! the lines, the reference, by the distance to its nearest point on it.
//!
//! # Usage
//!
//! ```text
//! Usage: slfproject <file> <lines> --vars <id>... [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! The first line of the file is the reference by default. Points that land
//! on either end of the reference, or beyond, are left out of the table.
//!
//! ```bash
//! # Depth and velocities along every line, against the distance along line 2
//! slfproject r2d.slf lines.i2s --vars H U V --reference 2
//! ```
//!
//! ### Choose the frame
//!
//! Frames are numbered from 0, and the first frame is used by default.
//!
//! ```bash
//! slfproject r2d.slf lines.i2s --vars H --frame 12
//! ```
//!
//! ### Change the output file
//!
//! The table is written to `projection.csv` by default, with `;` separators
//! and 6 decimal places. Existing files are never overwritten.

// standard libraries
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

// crate modules
use serafin::header::Language;
use serafin::projection::LineProjector;
use serafin::readers::{read_sections_file, SerafinReader};
use serafin::utils::f;

// external crates
use anyhow::{bail, Context, Result};
use clap::{arg, Parser};
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    // fail before any work is done if the output exists
    if Path::new(&cli.output).exists() {
        bail!("{} already exists (remove the file or change --output)", cli.output);
    }

    let mut reader = SerafinReader::open(&cli.file, cli.lang)
        .with_context(|| f!("Could not open {}", cli.file))?;
    let header = reader
        .read_header()
        .with_context(|| f!("Invalid header in {}", cli.file))?
        .clone();
    info!("{}", header.summary().replace('\n', " "));

    let lines = read_sections_file(&cli.lines)?;
    if lines.is_empty() {
        bail!("No lines found in {}", cli.lines);
    }
    info!("Read {} lines from {}", lines.len(), cli.lines);

    let mut projector = LineProjector::new(lines, cli.reference)?;
    projector.construct_intersections(&header)?;
    let table = projector.run(&mut reader, &cli.vars, cli.frame)?;

    debug!("Writing {} rows to {}", table.rows.len(), cli.output);
    let mut writer = get_writer(&cli.output)?;
    table.write_csv(&mut writer, &cli.sep, cli.digits)?;
    writer.flush()?;
    info!("Results written to {}", cli.output);

    Ok(())
}

/// Project values along lines onto a reference line
///
/// Locates every polyline of a BlueKenue i2s file on the mesh, interpolates
/// the chosen variables of one frame where the lines meet the mesh, and
/// gives each point its distance along the reference line.
///
/// Examples
/// --------
///
///  Depth along every line against the first line, first frame
///     $ slfproject r2d.slf lines.i2s --vars H
///
///  Velocities at frame 12 against the distance along line 3
///     $ slfproject r2d.slf lines.i2s --vars U V --frame 12 --reference 3
///
/// Notes
/// -----
///
/// Rows hold the 1-based line number, x, y, the distance along the
/// reference, then one value per variable. Points projecting on an end of
/// the reference or beyond are left out.
///
/// The output file is never overwritten.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: slfproject r2d.slf lines.i2s --vars H U V\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("slfproject <file> <lines> --vars <id>... [options]")
)]
struct Cli {
    // * Positional
    /// Path to Serafin file
    #[arg(name = "file")]
    file: String,

    /// Path to i2s lines file
    #[arg(name = "lines")]
    lines: String,

    /// Variable ids to interpolate
    #[arg(help_heading("Projection options"))]
    #[arg(short = 'V', long, num_args = 1.., required = true)]
    #[arg(value_name = "id")]
    vars: Vec<String>,

    /// Number of the reference line, from 1 ('1' default)
    #[arg(help_heading("Projection options"))]
    #[arg(short, long, default_value_t = 1)]
    #[arg(value_name = "n")]
    reference: usize,

    /// Index of the frame, from 0 ('0' default)
    #[arg(help_heading("Projection options"))]
    #[arg(short, long, default_value_t = 0)]
    #[arg(value_name = "n")]
    frame: usize,

    /// Language of the variable names ('en' default)
    #[arg(help_heading("Projection options"))]
    #[arg(short, long, default_value = "en")]
    #[arg(value_name = "lang")]
    lang: Language,

    /// Name of output file ('projection.csv' default)
    #[arg(help_heading("Output options"))]
    #[arg(short, long, default_value = "projection.csv")]
    #[arg(value_name = "path")]
    output: String,

    /// Column separator (';' default)
    #[arg(help_heading("Output options"))]
    #[arg(long, default_value = ";")]
    #[arg(value_name = "sep")]
    sep: String,

    /// Decimal places of every value ('6' default)
    #[arg(help_heading("Output options"))]
    #[arg(short, long, default_value_t = 6)]
    #[arg(value_name = "n")]
    digits: usize,

    // * Flags
    /// Verbose logging (-v, -vv)
    ///
    /// If specified, the default log level of INFO is increased to DEBUG (-v)
    /// or TRACE (-vv). Errors and Warnings are always logged unless in quiet
    /// (-q) mode.
    #[arg(short, long)]
    #[arg(action = clap::ArgAction::Count)]
    verbose: u8,

    /// Supress all log output (overrules --verbose)
    #[arg(short, long)]
    quiet: bool,
}

/// Sets up logging at runtime to allow for multiple verbosity levels
#[doc(hidden)]
fn logging_init(verbosity: usize, quiet: bool) {
    stderrlog::new()
        .modules(vec![module_path!(), "serafin"])
        .quiet(quiet)
        .verbosity(verbosity)
        .show_level(false)
        .color(stderrlog::ColorChoice::Never)
        .timestamp(stderrlog::Timestamp::Off)
        .init()
        .unwrap();
}

/// Creates a banner for the command line
#[doc(hidden)]
fn banner() -> String {
    let mut s = f!("{:-<1$}\n", "", 70);
    s += &f!("{:^70}\n", "Serafin :: Line Projection");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// New file for the results, refusing to replace an existing one
fn get_writer(path: &str) -> Result<BufWriter<File>> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| f!("Could not create {path} (remove the file or change --output)"))?;
    debug!("New bufwriter for {path}");
    Ok(BufWriter::new(file))
}
