//! Command line tool to inspect Serafin files
//!
//! Validates the header of a Serafin file and prints a summary of its
//! contents, without the need to open the file in a dedicated viewer just to
//! check simple properties.
//!
//! # Usage
//!
//! ```text
//! Usage: slfinfo <file> [options]
//! ```
//!
//! Help is printed with the `-h` flag, and `--help` will show examples, default
//! values, examples, and any important behaviour.
//!
//! ## Options
//!
//! By default a summary of the header is printed: title, file type, mesh
//! sizes, variables and coordinate extents.
//!
//! ```bash
//! # Print a summary of the file
//! slfinfo r2d_tidal.slf
//! ```
//!
//! ### List the time frames
//!
//! Every frame time is read with `--times`. Only the time record of each frame
//! is visited, so this is fast even for very large files.
//!
//! ```bash
//! slfinfo r2d_tidal.slf --times
//! ```
//!
//! ### Machine readable output
//!
//! The same information is written to stdout as JSON with `--json`.
//!
//! ```bash
//! slfinfo r2d_tidal.slf --times --json > r2d_tidal.json
//! ```
//!
//! ### French variable names
//!
//! Variable ids are resolved from the English names by default, use `--lang fr`
//! for files written with French names.

// standard libraries
use std::io::Write;

// crate modules
use serafin::header::{Header, HeaderSummary, Language};
use serafin::readers::SerafinReader;
use serafin::utils::{f, value_range, NumberFmt};

// external crates
use anyhow::{Context, Result};
use clap::{arg, Parser};
use log::*;
use serde::Serialize;

#[doc(hidden)]
fn main() -> Result<()> {
    // set up the command line interface and match arguments
    let cli: Cli = Cli::parse();

    // set up logging (+2 to make 'Info' the default)
    let verbosity = cli.verbose as usize + 2;
    logging_init(verbosity, cli.quiet);

    let mut reader = SerafinReader::open(&cli.file, cli.lang)
        .with_context(|| f!("Could not open {}", cli.file))?;
    reader
        .read_header()
        .with_context(|| f!("Invalid header in {}", cli.file))?;

    let times = match cli.times {
        true => Some(reader.scan_times()?.to_vec()),
        false => None,
    };
    let header = reader.header()?;

    match cli.json {
        true => write_json(header, times)?,
        false => print_summary(header, times.as_deref()),
    }

    Ok(())
}

/// Inspect Serafin result files
///
/// Validates the header of a Serafin (Selafin) file and prints a summary of
/// the mesh, the variables, and optionally the time of every frame.
///
/// Examples
/// --------
///
///  Print a summary of the file
///     $ slfinfo r2d_tidal.slf
///
///  Include the time of every frame
///     $ slfinfo r2d_tidal.slf --times
///
///  Write the summary as JSON
///     $ slfinfo r2d_tidal.slf --times --json > info.json
///
///  Read a file with French variable names
///     $ slfinfo r2d_tidal.slf --lang fr
///
/// Notes
/// -----
///
/// Any inconsistency between the header and the size of the file is an
/// error, so a file that passes here can be read frame by frame safely.
#[doc(hidden)]
#[derive(Parser)]
#[command(
    verbatim_doc_comment,
    arg_required_else_help(true),
    before_help(banner()),
    after_help(
        "Typical use: slfinfo r2d_tidal.slf --times\n\nNOTE: --help shows more detail and examples"
    ),
    term_width(70),
    hide_possible_values(true),
    override_usage("slfinfo <file> [options]")
)]
struct Cli {
    // * Positional
    /// Path to Serafin file
    #[arg(name = "file")]
    file: String,

    /// List the time of every frame
    #[arg(help_heading("Info options"))]
    #[arg(short, long)]
    times: bool,

    /// Write the summary to stdout as JSON
    #[arg(help_heading("Info options"))]
    #[arg(short, long)]
    json: bool,

    /// Language of the variable names ('en' default)
    ///
    /// Either 'en' or 'fr', used to resolve variable names into ids.
    #[arg(help_heading("Info options"))]
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
    s += &f!("{:^70}\n", "Serafin :: File Inspector");
    s += &f!("{:-<1$}", "", 70);
    s
}

#[doc(hidden)]
#[derive(Serialize)]
struct Info {
    header: HeaderSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    times: Option<Vec<f64>>,
}

#[doc(hidden)]
/// Write the summary to stdout as json
fn write_json(header: &Header, times: Option<Vec<f64>>) -> Result<()> {
    let info = Info {
        header: header.summary_data(),
        times,
    };
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &info)?;
    writeln!(stdout)?;
    Ok(())
}

#[doc(hidden)]
/// Write summary to the terminal
fn print_summary(header: &Header, times: Option<&[f64]>) {
    let mut s = f!("Title   : {}\n", header.title());
    s += &f!("{}\n\n", textwrap::fill(&header.summary().replace('\n', " "), 70));

    if let Some(date) = header.date() {
        s += &f!(
            "date    : {:04}-{:02}-{:02} {:02}:{:02}:{:02}\n",
            date[0],
            date[1],
            date[2],
            date[3],
            date[4],
            date[5]
        );
    }

    s += "variables\n";
    for variable in header.variables() {
        s += &f!(
            "  {:<6}: {:<16} [{}]\n",
            variable.id,
            variable.name,
            variable.unit
        );
    }

    for (axis, values) in [("x", header.x()), ("y", header.y())] {
        if let Some((lo, hi)) = value_range(values) {
            s += &f!("{axis} range : {} to {}\n", lo.sci(5, 2), hi.sci(5, 2));
        }
    }

    s += &f!(
        "sizes   : header {} bytes, frame {} bytes, file {} bytes",
        header.header_size(),
        header.frame_size(),
        header.file_size()
    );

    if let Some(times) = times {
        s += "\ntimes\n";
        let list = times
            .iter()
            .map(|t| t.sci(5, 2))
            .collect::<Vec<String>>()
            .join(" ");
        s += &textwrap::fill(&list, 70);
    }

    println!("{s}")
}
