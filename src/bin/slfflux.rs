//! Command line tool to compute fluxes through cross-sections
//!
//! Reads the sections of a BlueKenue `i2s` line set, locates them on the mesh
//! of a Serafin file, and computes one flux value per section for every
//! sampled time frame.
//!
//! # Usage
//!
//! ```text
//! Usage: slfflux <file> <sections> --kind <kind> --vars <id>... [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! The flux kind decides which variables are needed, and in which order:
//!
//! | Kind                   | Variables | Typical use                      |
//! | ---------------------- | --------- | -------------------------------- |
//! | `line_integral`        | 1         | mean depth along a section       |
//! | `line_double_integral` | 2         | integral of a product            |
//! | `line_flux`            | 2         | flux of a vector field           |
//! | `area_flux`            | 3         | discharge from U, V and H        |
//! | `mass_flux`            | 4         | transport of a concentration     |
//!
//! ```bash
//! # Discharge through every section, one row per frame
//! slfflux r2d_tidal.slf sections.i2s --kind area_flux --vars U V H
//! ```
//!
//! ### Sample fewer frames
//!
//! Use `--stride` to only keep every n-th frame, starting with the first.
//!
//! ```bash
//! slfflux r2d_tidal.slf sections.i2s --kind line_flux --vars U V --stride 10
//! ```
//!
//! ### Change the output file
//!
//! The table is written to `flux.csv` by default, with `;` separators and 6
//! decimal places. Existing files are never overwritten.
//!
//! ```bash
//! slfflux r2d_tidal.slf sections.i2s --kind line_integral --vars H \
//!             --output depth.csv \
//!             --sep , \
//!             --digits 3
//! ```
//!
//! ### Stopping early
//!
//! Ctrl-C stops the calculation at the next frame or section, and the rows
//! completed so far are still written.

// standard libraries
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// crate modules
use serafin::flux::{FluxCalculator, FluxKind};
use serafin::header::Language;
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

    let sections = read_sections_file(&cli.sections)?;
    if sections.is_empty() {
        bail!("No sections found in {}", cli.sections);
    }
    info!("Read {} sections from {}", sections.len(), cli.sections);

    let mut calculator = FluxCalculator::new(cli.kind, cli.vars.clone(), sections, cli.stride)?;
    if cli.quiet {
        calculator.disable_progress();
    }
    install_ctrlc_handler(calculator.cancel_handle())?;

    calculator.construct_triangles(&header);
    calculator.construct_intersections()?;

    let result = calculator.run(&mut reader)?;
    if !result.complete {
        warn!(
            "Calculation stopped early, only {} rows are written",
            result.rows.len()
        );
    }

    debug!("Writing {} rows to {}", result.rows.len(), cli.output);
    let mut writer = get_writer(&cli.output)?;
    result.write_csv(&mut writer, &cli.sep, cli.digits)?;
    writer.flush()?;
    info!("Results written to {}", cli.output);

    Ok(())
}

/// Compute fluxes through cross-sections of a Serafin mesh
///
/// Locates every polyline of a BlueKenue i2s file on the mesh once, then
/// evaluates the chosen flux kind for every sampled time frame.
///
/// Examples
/// --------
///
///  Discharge through every section
///     $ slfflux r2d.slf sections.i2s --kind area_flux --vars U V H
///
///  Flux of the velocity field, every 10th frame
///     $ slfflux r2d.slf sections.i2s --kind line_flux --vars U V --stride 10
///
///  Integrated depth written with 3 decimal places to "depth.csv"
///     $ slfflux r2d.slf sections.i2s --kind line_integral --vars H \
///         --digits 3 --output depth.csv
///
/// Notes
/// -----
///
/// Variables are given by id (U, V, H, ...) in the order the kind expects.
/// The normal of each segment points to the left of the section, so a flow
/// crossing from left to right is negative.
///
/// The output file is never overwritten. Ctrl-C stops the calculation and
/// writes the rows completed so far.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: slfflux r2d.slf sections.i2s --kind area_flux --vars U V H\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("slfflux <file> <sections> --kind <kind> --vars <id>... [options]")
)]
struct Cli {
    // * Positional
    /// Path to Serafin file
    #[arg(name = "file")]
    file: String,

    /// Path to i2s sections file
    #[arg(name = "sections")]
    sections: String,

    /// Flux kind to compute
    ///
    /// One of line_integral, line_double_integral, line_flux, area_flux,
    /// or mass_flux.
    #[arg(help_heading("Flux options"))]
    #[arg(short, long)]
    #[arg(value_name = "kind")]
    kind: FluxKind,

    /// Variable ids in the order the kind expects
    #[arg(help_heading("Flux options"))]
    #[arg(short = 'V', long, num_args = 1.., required = true)]
    #[arg(value_name = "id")]
    vars: Vec<String>,

    /// Sample every n-th frame ('1' default)
    #[arg(help_heading("Flux options"))]
    #[arg(short, long, default_value_t = 1)]
    #[arg(value_name = "n")]
    stride: usize,

    /// Language of the variable names ('en' default)
    #[arg(help_heading("Flux options"))]
    #[arg(short, long, default_value = "en")]
    #[arg(value_name = "lang")]
    lang: Language,

    /// Name of output file ('flux.csv' default)
    #[arg(help_heading("Output options"))]
    #[arg(short, long, default_value = "flux.csv")]
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
    s += &f!("{:^70}\n", "Serafin :: Section Fluxes");
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

#[doc(hidden)]
/// Ctrl-C raises the cancellation flag instead of killing the process
fn install_ctrlc_handler(cancelled: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        cancelled.store(true, Ordering::SeqCst);
    })
    .context("signal handler setup failed")
}
