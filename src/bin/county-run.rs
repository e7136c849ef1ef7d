//! CLI tool to run a command script against county demographics data.
//!
//! Usage:
//!   county-run <ops.script>
//!   county-run <ops.script> --data counties.csv -o report.txt
//!
//! If no output file is specified, writes to stdout.

use clap::Parser;
use county_pipe::{Pipeline, PipelineError, Record, load_records};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Run a script of filter and report commands against county records.
#[derive(Parser)]
#[command(name = "county-run")]
struct Cli {
    /// Script file, one command per line
    script: String,

    /// County demographics CSV file
    #[arg(short, long, default_value = "county_demographics.csv")]
    data: String,

    /// Write report output to file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Log each command on stderr and print a run summary
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::ERROR };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_output(path: Option<&str>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(out_path) => {
            if let Some(parent) = Path::new(out_path).parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            Ok(Box::new(BufWriter::new(File::create(out_path)?)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout()))),
    }
}

/// Load the record store; load failures leave it empty.
fn load(data: &str, out: &mut dyn Write) -> io::Result<Vec<Record>> {
    let records = match load_records(data) {
        Ok(records) => records,
        Err(PipelineError::FileNotFound { path }) => {
            writeln!(out, "Error: '{path}' not found.")?;
            Vec::new()
        }
        Err(e) => {
            writeln!(out, "Error reading the data: {e}")?;
            Vec::new()
        }
    };
    writeln!(out, "Loaded {} county entries", records.len())?;
    Ok(records)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Read script file
    let script = match fs::read_to_string(&cli.script) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error: Could not open {}: {e}", cli.script);
            process::exit(1);
        }
    };

    let mut out = match open_output(cli.output.as_deref()) {
        Ok(out) => out,
        Err(e) => {
            eprintln!(
                "Error opening output '{}': {e}",
                cli.output.as_deref().unwrap_or("(stdout)")
            );
            process::exit(1);
        }
    };

    let records = match load(&cli.data, &mut out) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            process::exit(1);
        }
    };

    if cli.verbose {
        eprintln!("Script:  {}", cli.script);
        eprintln!("Data:    {}", cli.data);
        eprintln!("Output:  {}", cli.output.as_deref().unwrap_or("(stdout)"));
    }

    let mut pipeline = Pipeline::new(&records);
    let result = pipeline
        .run_script(&script, &mut out)
        .and_then(|summary| out.flush().map(|_| summary));

    match result {
        Ok(summary) => {
            if cli.verbose {
                eprintln!(
                    "Lines:   {} ok, {} failed, {} of {} records selected",
                    summary.executed,
                    summary.failed,
                    pipeline.len(),
                    records.len()
                );
            }
        }
        Err(e) => {
            eprintln!("Error writing output: {e}");
            process::exit(1);
        }
    }
}
