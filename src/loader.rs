//! Record store loader for county demographics CSV files.
//!
//! Expected header layout (column order is free, extra columns are ignored):
//! ```text
//! County,State,Age.Percent 65 and Older,Education.Bachelor's Degree or Higher,...,Population
//! ```
//!
//! - `County`, `State` - identity columns, must be non-empty
//! - `<Group>.<Sub-field>` - numeric sub-field of Age, Education, Ethnicities or Income
//! - `Population` - count stored under `"2014 Population"`
//! - `Population.<label>` - count stored under `<label>`

use std::fs::File;
use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::record::{Group, POPULATION_LABEL, Record, RecordBuilder};

/// Role of a CSV column, decided once from the header.
#[derive(Debug, Clone, PartialEq)]
enum Column {
    County,
    State,
    Population(String),
    Field(Group, String),
    Ignored,
}

impl Column {
    fn from_header(header: &str) -> Column {
        let header = header.trim();
        if header.eq_ignore_ascii_case("county") {
            return Column::County;
        }
        if header.eq_ignore_ascii_case("state") {
            return Column::State;
        }
        if header.eq_ignore_ascii_case("population") {
            return Column::Population(POPULATION_LABEL.to_string());
        }

        match header.split_once('.') {
            Some((group, label)) if group.eq_ignore_ascii_case("population") => {
                Column::Population(label.to_string())
            }
            Some((group, name)) => match Group::from_name(group) {
                Some(group) => Column::Field(group, name.to_string()),
                None => Column::Ignored,
            },
            None => Column::Ignored,
        }
    }
}

fn plan_columns(headers: &csv::StringRecord) -> Result<Vec<Column>> {
    let columns: Vec<Column> = headers.iter().map(Column::from_header).collect();

    let has = |wanted: &Column| columns.iter().any(|c| c == wanted);
    let missing = if !has(&Column::County) {
        Some("County")
    } else if !has(&Column::State) {
        Some("State")
    } else if !has(&Column::Population(POPULATION_LABEL.to_string())) {
        Some("Population")
    } else {
        None
    };
    if let Some(name) = missing {
        return Err(PipelineError::InvalidRow {
            row: 0,
            reason: format!("header has no '{name}' column"),
        });
    }

    let ignored = columns.iter().filter(|c| **c == Column::Ignored).count();
    if ignored > 0 {
        debug!(ignored, "ignoring unrecognized columns");
    }
    Ok(columns)
}

fn parse_row(row: usize, columns: &[Column], fields: &csv::StringRecord) -> Result<Record> {
    let invalid = |reason: String| PipelineError::InvalidRow { row, reason };

    let cell = |wanted: &Column| {
        columns
            .iter()
            .zip(fields.iter())
            .find(|(c, _)| *c == wanted)
            .map(|(_, v)| v.trim())
            .unwrap_or_default()
    };
    let mut builder = RecordBuilder::new(cell(&Column::County), cell(&Column::State));

    for (column, raw) in columns.iter().zip(fields.iter()) {
        let raw = raw.trim();
        match column {
            Column::Population(label) => {
                if raw.is_empty() {
                    continue;
                }
                let count: u64 = raw
                    .parse()
                    .map_err(|_| invalid(format!("invalid population '{raw}' for '{label}'")))?;
                builder = builder.population(label.clone(), count);
            }
            Column::Field(group, name) => {
                if raw.is_empty() {
                    continue;
                }
                let value: f64 = raw
                    .parse()
                    .map_err(|_| invalid(format!("invalid number '{raw}' for '{name}'")))?;
                builder = builder.field(*group, name.clone(), value);
            }
            Column::County | Column::State | Column::Ignored => {}
        }
    }

    builder.build().map_err(|e| match e {
        PipelineError::InvalidRecord(reason) => invalid(reason),
        other => other,
    })
}

/// Read records from any CSV source.
pub fn read_records<R: io::Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
    let columns = plan_columns(rdr.headers()?)?;

    let mut records = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let fields = result?;
        records.push(parse_row(idx + 1, &columns, &fields)?);
    }
    Ok(records)
}

/// Load the record store from a CSV file.
///
/// A missing file maps to [`PipelineError::FileNotFound`] so callers can
/// report it distinctly from malformed content.
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PipelineError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => PipelineError::Io(e),
    })?;

    let records = read_records(io::BufReader::new(file))?;
    info!(path = %path.display(), count = records.len(), "loaded record store");
    Ok(records)
}
