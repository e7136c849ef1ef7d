//! Script parser for pipeline commands.
//!
//! Script format, one command per line, arguments separated by `:`:
//! ```text
//! # Counties in California with many graduates
//! filter-state:CA
//! filter-gt:Education.Bachelor's Degree or Higher:40
//! display
//! percent:Ethnicities.Hispanic or Latino
//! ```
//!
//! Supported commands:
//! - `display` - Print county, state and population for each record
//! - `filter-state:<state>` - Keep records whose state matches exactly
//! - `filter-gt:<field>:<threshold>` - Keep records where field > threshold
//! - `filter-lt:<field>:<threshold>` - Keep records where field < threshold
//! - `population-total` - Print the total population
//! - `population:<field>` - Print the sub-population the field represents
//! - `percent:<field>` - Print the population-weighted percentage of the field
//! - Blank lines and lines starting with `#` are skipped

use crate::error::{PipelineError, Result};

/// Parsed pipeline command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// display
    Display,
    /// filter-state:<state>
    FilterState { state: String },
    /// filter-gt:<field>:<threshold>
    FilterGt { field: String, threshold: f64 },
    /// filter-lt:<field>:<threshold>
    FilterLt { field: String, threshold: f64 },
    /// population-total
    PopulationTotal,
    /// population:<field>
    Population { field: String },
    /// percent:<field>
    Percent { field: String },
}

impl Command {
    /// The command token as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Display => "display",
            Command::FilterState { .. } => "filter-state",
            Command::FilterGt { .. } => "filter-gt",
            Command::FilterLt { .. } => "filter-lt",
            Command::PopulationTotal => "population-total",
            Command::Population { .. } => "population",
            Command::Percent { .. } => "percent",
        }
    }
}

/// Iterate over the executable lines of a script as `(line_number, text)`.
///
/// Line numbers are 1-based and count skipped lines, so they match what an
/// editor shows.
pub fn script_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse a single command line.
pub fn parse_command(line: &str) -> Result<Command> {
    let mut parts = line.split(':');
    // split always yields at least one item
    let op = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match op {
        "display" => {
            expect_args(op, &args, 0, "takes no arguments")?;
            Ok(Command::Display)
        }
        "population-total" => {
            expect_args(op, &args, 0, "takes no arguments")?;
            Ok(Command::PopulationTotal)
        }
        "filter-state" => {
            expect_args(op, &args, 1, "expected filter-state:<state>")?;
            Ok(Command::FilterState {
                state: args[0].to_string(),
            })
        }
        "filter-gt" | "filter-lt" => {
            let usage = format!("expected {op}:<field>:<threshold>");
            expect_args(op, &args, 2, &usage)?;
            let field = parse_field(op, args[0])?;
            let threshold = parse_threshold(op, args[1])?;
            if op == "filter-gt" {
                Ok(Command::FilterGt { field, threshold })
            } else {
                Ok(Command::FilterLt { field, threshold })
            }
        }
        "population" | "percent" => {
            let usage = format!("expected {op}:<field>");
            expect_args(op, &args, 1, &usage)?;
            let field = parse_field(op, args[0])?;
            if op == "population" {
                Ok(Command::Population { field })
            } else {
                Ok(Command::Percent { field })
            }
        }
        _ => Err(PipelineError::UnknownOperation(op.to_string())),
    }
}

fn expect_args(op: &str, args: &[&str], n: usize, usage: &str) -> Result<()> {
    if args.len() == n {
        Ok(())
    } else {
        Err(PipelineError::malformed(op, usage))
    }
}

fn parse_field(op: &str, field: &str) -> Result<String> {
    if field.is_empty() {
        return Err(PipelineError::malformed(op, "field path is empty"));
    }
    Ok(field.to_string())
}

fn parse_threshold(op: &str, raw: &str) -> Result<f64> {
    let threshold: f64 = raw
        .trim()
        .parse()
        .map_err(|_| PipelineError::malformed(op, format!("invalid threshold '{raw}'")))?;
    if threshold.is_nan() {
        return Err(PipelineError::malformed(op, "threshold is not a number"));
    }
    Ok(threshold)
}
