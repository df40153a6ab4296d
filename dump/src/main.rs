//! A CLI tool for inspecting a raw data set stream
//! by printing its element tree and the recoveries made reading it,
//! optionally transcoding it to another transfer syntax.
use clap::Parser;
use dcmio_dump::{ColorMode, DumpOptions};
use dcmio_parser::{
    read_dataset, supported_transfer_syntax, write_dataset, ReadOptions, WriteOptions,
};
use snafu::prelude::*;
use snafu::{Report, Whatever};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Seek, SeekFrom, Write};
use std::path::PathBuf;
use tracing::{info, warn, Level};

/// Exit code for when an error emerged while reading the data set.
const ERROR_READ: i32 = -2;
/// Exit code for when an error emerged while dumping the data set.
const ERROR_PRINT: i32 = -3;
/// Exit code for when the data set could not be transcoded.
const ERROR_WRITE: i32 = -4;

/// Dump the contents of a raw data set stream
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// The file holding the data set
    file: PathBuf,
    /// The transfer syntax UID of the data set
    #[arg(long = "ts", default_value = "1.2.840.10008.1.2.1")]
    transfer_syntax: String,
    /// The byte offset at which the data set starts
    #[arg(long = "offset", default_value = "0")]
    offset: u64,
    /// Fail on the first non-conformance instead of recovering from it
    #[arg(long = "strict")]
    strict: bool,
    /// The maximum number of nested sequences
    #[arg(long = "max-depth", default_value = "64")]
    max_depth: u32,
    /// Transcode the data set to the given transfer syntax UID
    #[arg(long = "transcode", requires = "output")]
    transcode: Option<String>,
    /// Write sequences with defined lengths when transcoding
    #[arg(long = "defined-lengths", requires = "transcode")]
    defined_lengths: bool,
    /// The output file of the transcoded data set
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
    /// Do not print the element tree
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
    /// Print all values to the end
    /// (limited to `width` by default)
    #[arg(long = "no-limit")]
    no_limit: bool,
    /// The width of the display
    /// (default is to check automatically)
    #[arg(short = 'w', long = "width")]
    width: Option<u32>,
    /// The color mode
    #[arg(long = "color", default_value = "auto")]
    color: ColorMode,
    /// Verbose mode
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn main() {
    run().unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(ERROR_READ);
    });
}

fn run() -> Result<(), Whatever> {
    let App {
        file,
        transfer_syntax,
        offset,
        strict,
        max_depth,
        transcode,
        defined_lengths,
        output,
        quiet,
        no_limit,
        width,
        color,
        verbose,
    } = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
            .with_writer(std::io::stderr)
            .finish(),
    )
    .whatever_context("Could not set up global logging subscriber")
    .unwrap_or_else(|e: Whatever| {
        eprintln!("[ERROR] {}", Report::from_error(e));
    });

    let ts = supported_transfer_syntax(&transfer_syntax)
        .whatever_context("Could not choose a transfer syntax")?;
    let target = transcode
        .as_deref()
        .map(supported_transfer_syntax)
        .transpose()
        .whatever_context("Could not choose the target transfer syntax")?;

    let mut source = BufReader::new(
        File::open(&file)
            .with_whatever_context(|_| format!("Could not open {}", file.display()))?,
    );
    source
        .seek(SeekFrom::Start(offset))
        .whatever_context("Could not seek to the start of the data set")?;

    let options = ReadOptions::for_transfer_syntax(ts)
        .recover(!strict)
        .max_depth(max_depth)
        .base_offset(offset);
    let outcome = match read_dataset(source, options) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", Report::from_error(e));
            std::process::exit(ERROR_READ);
        }
    };

    if outcome.is_clean() {
        info!("Read {} elements in {}", outcome.dataset.len(), ts.name());
    } else {
        warn!(
            "Read {} elements in {} with {} recoveries",
            outcome.dataset.len(),
            ts.name(),
            outcome.recoveries.len()
        );
    }

    if !quiet {
        let width = width
            .or_else(|| terminal_size::terminal_size().map(|(width, _)| width.0 as u32))
            .unwrap_or(120);
        let mut options = DumpOptions::new();
        options.no_limit(no_limit).width(width).color_mode(color);
        if let Err(e) = options.dump_outcome(&outcome) {
            if e.kind() != ErrorKind::BrokenPipe {
                eprintln!("[ERROR] {}", Report::from_error(e));
                std::process::exit(ERROR_PRINT);
            }
        }
    }

    if let (Some(target), Some(output)) = (target, output) {
        let mut to = BufWriter::new(
            File::create(&output)
                .with_whatever_context(|_| format!("Could not create {}", output.display()))?,
        );
        let options =
            WriteOptions::for_transfer_syntax(target).explicit_sequence_lengths(defined_lengths);
        let bytes = match write_dataset(&mut to, &outcome.dataset, options) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("[ERROR] {}", Report::from_error(e));
                std::process::exit(ERROR_WRITE);
            }
        };
        to.flush()
            .with_whatever_context(|_| format!("Could not write {}", output.display()))?;
        info!("Wrote {} bytes in {} to {}", bytes, target.name(), output.display());
    }

    Ok(())
}
