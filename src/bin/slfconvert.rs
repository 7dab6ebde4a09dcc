//! Command line tool to convert Serafin files
//!
//! Copies every frame of a Serafin file into a new file, optionally narrowing
//! double precision values to single precision and moving the mesh nodes.
//!
//! # Usage
//!
//! ```text
//! Usage: slfconvert <input> <output> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! With no options the output is a validated byte-for-byte copy of the input.
//!
//! ### Single precision
//!
//! Halve the size of a `SERAFIND` file with `--single`. Coordinates and values
//! are rounded to the nearest `f32`.
//!
//! ```bash
//! slfconvert r2d_double.slf r2d_single.slf --single
//! ```
//!
//! ### Coordinate transforms
//!
//! Nodes are scaled about the origin, then rotated counter-clockwise about the
//! origin, then shifted. Any of the three may be left out.
//!
//! ```bash
//! # Move a model from local coordinates to a projected system
//! slfconvert local.slf projected.slf --rotate 12.5 --shift 350000 6280000
//! ```

// crate modules
use serafin::geometry::{Affine, Transformation};
use serafin::header::{Header, Language};
use serafin::readers::SerafinReader;
use serafin::utils::f;
use serafin::writer::SerafinWriter;

// external crates
use anyhow::{Context, Result};
use clap::{arg, Parser};
use kdam::{BarBuilder, BarExt};
use log::*;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    let mut reader = SerafinReader::open(&cli.input, cli.lang)
        .with_context(|| f!("Could not open {}", cli.input))?;
    let header = reader
        .read_header()
        .with_context(|| f!("Invalid header in {}", cli.input))?
        .clone();
    info!("{}", header.summary().replace('\n', " "));

    let output_header = convert_header(&header, &cli);
    let mut writer = SerafinWriter::create(&cli.output)?;
    writer.write_header(&output_header)?;

    let mut progress_bar = BarBuilder::default()
        .total(header.frame_count())
        .unit(" frames")
        .disable(cli.quiet)
        .build()
        .map_err(anyhow::Error::msg)?;

    for frame_index in 0..header.frame_count() {
        let frame = reader.read_frame(frame_index)?;
        writer
            .write_frame(frame.time, &frame.values)
            .with_context(|| f!("Could not write frame {frame_index}"))?;
        progress_bar.update(1)?;
    }

    // need an extra line for clean spacing if the progress bar is printed
    if !cli.quiet {
        eprintln!()
    };

    let frames = writer.frames_written();
    writer.finish()?;
    info!("Wrote {frames} frames to {}", cli.output);

    Ok(())
}

/// Convert Serafin result files
///
/// Copies a Serafin (Selafin) file frame by frame, with optional precision
/// reduction and coordinate transforms.
///
/// Examples
/// --------
///
///  Validated copy
///     $ slfconvert r2d.slf copy.slf
///
///  Convert double precision to single precision
///     $ slfconvert r2d_double.slf r2d_single.slf --single
///
///  Rotate by 90 degrees then shift the mesh
///     $ slfconvert r2d.slf moved.slf --rotate 90 --shift 1000 -250
///
/// Notes
/// -----
///
/// Transforms are applied in the order scale, rotate, shift. The output
/// file is never overwritten.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: slfconvert r2d_double.slf r2d_single.slf --single\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("slfconvert <input> <output> [options]")
)]
struct Cli {
    // * Positional
    /// Path to input Serafin file
    #[arg(name = "input")]
    input: String,

    /// Path to output Serafin file
    #[arg(name = "output")]
    output: String,

    /// Write single precision values
    #[arg(help_heading("Convert options"))]
    #[arg(long)]
    single: bool,

    /// Shift every node by dx dy
    #[arg(help_heading("Convert options"))]
    #[arg(long, num_args = 2, allow_negative_numbers = true)]
    #[arg(value_names = ["dx", "dy"])]
    shift: Option<Vec<f64>>,

    /// Rotate counter-clockwise about the origin, in degrees
    #[arg(help_heading("Convert options"))]
    #[arg(long, allow_negative_numbers = true)]
    #[arg(value_name = "deg")]
    rotate: Option<f64>,

    /// Scale about the origin
    #[arg(help_heading("Convert options"))]
    #[arg(long)]
    #[arg(value_name = "factor")]
    scale: Option<f64>,

    /// Language of the variable names ('en' default)
    #[arg(help_heading("Convert options"))]
    #[arg(short, long, default_value = "en")]
    #[arg(value_name = "lang")]
    lang: Language,

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
    s += &f!("{:^70}\n", "Serafin :: File Converter");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
/// Header of the output file
fn convert_header(header: &Header, cli: &Cli) -> Header {
    let mut transform: Option<Affine> = None;
    let mut chain = |next: Affine| {
        transform = Some(match transform {
            Some(t) => t.then(&next),
            None => next,
        });
    };

    if let Some(factor) = cli.scale {
        debug!("Scaling by {factor}");
        chain(Affine::scaling(factor));
    }
    if let Some(degrees) = cli.rotate {
        debug!("Rotating by {degrees} degrees");
        chain(Affine::rotation(degrees));
    }
    if let Some(shift) = &cli.shift {
        debug!("Shifting by ({}, {})", shift[0], shift[1]);
        chain(Affine::translation(shift[0], shift[1]));
    }

    let mut converted = match &transform {
        Some(t) => header.apply_coordinate_transform(&[t as &dyn Transformation]),
        None => header.clone(),
    };

    if cli.single && converted.is_double_precision() {
        info!("Converting to single precision");
        converted = converted.downcast_precision();
    }
    converted
}
