//! Line-by-line script executor.
//!
//! A [`Pipeline`] owns the current working set and runs commands against it
//! in order. Filters replace the working set only when they succeed; every
//! other command reads it. Each script line is isolated: a failing line is
//! reported with its line number and the next line runs against the
//! unchanged working set.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::dsl::{Command, parse_command, script_lines};
use crate::error::Result;
use crate::field::FieldResolver;
use crate::ops::{self, WorkingSet};
use crate::record::Record;

/// Counts of script lines that ran and failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub failed: usize,
}

/// Pipeline state: the working set plus the field resolver used by
/// filters and aggregates.
pub struct Pipeline<'a> {
    resolver: FieldResolver,
    working: WorkingSet<'a>,
}

impl<'a> Pipeline<'a> {
    /// Start with every record selected.
    pub fn new(records: &'a [Record]) -> Self {
        Self {
            resolver: FieldResolver::new(),
            working: records.iter().collect(),
        }
    }

    pub fn working_set(&self) -> &[&'a Record] {
        &self.working
    }

    pub fn len(&self) -> usize {
        self.working.len()
    }

    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Execute one command, returning the output lines it produced.
    pub fn execute(&mut self, cmd: &Command) -> Result<Vec<String>> {
        debug!(command = cmd.name(), records = self.working.len(), "executing");

        match cmd {
            Command::Display => Ok(self
                .working
                .iter()
                .map(|r| {
                    format!(
                        "{}, {}: {} people",
                        r.county(),
                        r.state(),
                        r.total_population()
                    )
                })
                .collect()),
            Command::FilterState { state } => {
                let next = ops::filter_state(&self.working, state);
                Ok(vec![self.rebind(next, format!("state == {state}"))])
            }
            Command::FilterGt { field, threshold } => {
                let next = ops::filter_gt(&self.resolver, &self.working, field, *threshold)?;
                let desc = format!("{field} gt {}", format_decimal(*threshold));
                Ok(vec![self.rebind(next, desc)])
            }
            Command::FilterLt { field, threshold } => {
                let next = ops::filter_lt(&self.resolver, &self.working, field, *threshold)?;
                let desc = format!("{field} lt {}", format_decimal(*threshold));
                Ok(vec![self.rebind(next, desc)])
            }
            Command::PopulationTotal => {
                let total = ops::population_total(&self.working);
                Ok(vec![format!("2014 population: {total}")])
            }
            Command::Population { field } => {
                let sub = ops::sub_population(&self.resolver, &self.working, field)?;
                Ok(vec![format!(
                    "2014 {field} population: {}",
                    format_decimal(sub)
                )])
            }
            Command::Percent { field } => {
                let pct = ops::percent(&self.resolver, &self.working, field)?;
                Ok(vec![format!(
                    "2014 {field} percentage: {}",
                    format_decimal(pct)
                )])
            }
        }
    }

    /// Replace the working set with a filter's result and describe it.
    fn rebind(&mut self, next: WorkingSet<'a>, desc: String) -> String {
        debug!(
            filter = %desc,
            before = self.working.len(),
            after = next.len(),
            "working set narrowed"
        );
        self.working = next;
        format!("Filter: {desc} ({} entries)", self.working.len())
    }

    /// Parse and execute a single script line.
    pub fn run_line(&mut self, line: &str) -> Result<Vec<String>> {
        let cmd = parse_command(line)?;
        self.execute(&cmd)
    }

    /// Run every line of `script`, writing output and per-line errors to `out`.
    ///
    /// Only I/O errors on `out` stop the run.
    pub fn run_script<W: Write>(&mut self, script: &str, out: &mut W) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (line_num, line) in script_lines(script) {
            match self.run_line(line) {
                Ok(lines) => {
                    for text in lines {
                        writeln!(out, "{text}")?;
                    }
                    summary.executed += 1;
                }
                Err(e) => {
                    warn!(line = line_num, error = %e, "command failed");
                    writeln!(out, "Error in line {line_num}: {e}")?;
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}

/// Format a decimal the way report lines show it: shortest round-trip
/// digits, with `.0` kept on integral values (`40.0`, `12.5`). Magnitudes
/// outside `[1e-4, 1e16)` switch to exponent form with a signed, two-digit
/// exponent (`1e+16`, `1.5e-07`).
pub fn format_decimal(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let sci = format!("{value:e}");
        let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
        let exp: i32 = exp.parse().unwrap_or_default();
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exp.abs());
    }

    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::loader::load_records;
    use crate::record::Group;
    use std::fs;
    use std::path::Path;

    fn county(name: &str, state: &str, population: u64, bachelors: f64) -> Record {
        Record::builder(name, state)
            .field(Group::Education, "Bachelor's Degree or Higher", bachelors)
            .total_population(population)
            .build()
            .unwrap()
    }

    fn sample() -> Vec<Record> {
        vec![
            county("Alpha County", "CA", 100, 50.0),
            county("Beta County", "CA", 900, 10.0),
            county("Gamma County", "NV", 2000, 30.0),
        ]
    }

    fn run(records: &[Record], script: &str) -> (String, RunSummary) {
        let mut pipeline = Pipeline::new(records);
        let mut out = Vec::new();
        let summary = pipeline.run_script(script, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    // --- Unit tests ---

    #[test]
    fn test_starts_with_all_records() {
        let records = sample();
        let pipeline = Pipeline::new(&records);
        assert_eq!(pipeline.len(), 3);
        assert!(!pipeline.is_empty());
    }

    #[test]
    fn test_display() {
        let records = sample();
        let mut pipeline = Pipeline::new(&records);
        let lines = pipeline.execute(&Command::Display).unwrap();
        assert_eq!(
            lines,
            vec![
                "Alpha County, CA: 100 people",
                "Beta County, CA: 900 people",
                "Gamma County, NV: 2000 people",
            ]
        );
    }

    #[test]
    fn test_filter_state_rebinds() {
        let records = sample();
        let mut pipeline = Pipeline::new(&records);
        let lines = pipeline.run_line("filter-state:CA").unwrap();
        assert_eq!(lines, vec!["Filter: state == CA (2 entries)"]);
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn test_filter_description_formats_threshold() {
        let records = sample();
        let mut pipeline = Pipeline::new(&records);
        let lines = pipeline
            .run_line("filter-gt:Education.Bachelor's Degree or Higher:20")
            .unwrap();
        assert_eq!(
            lines,
            vec!["Filter: Education.Bachelor's Degree or Higher gt 20.0 (2 entries)"]
        );
    }

    #[test]
    fn test_failed_filter_keeps_working_set() {
        let records = sample();
        let mut pipeline = Pipeline::new(&records);
        pipeline.run_line("filter-state:CA").unwrap();
        let before: Vec<*const Record> = pipeline
            .working_set()
            .iter()
            .map(|r| *r as *const Record)
            .collect();

        let err = pipeline.run_line("filter-gt:Education.Nonexistent:1").unwrap_err();
        assert!(matches!(err, PipelineError::FieldNotFound { .. }));

        let after: Vec<*const Record> = pipeline
            .working_set()
            .iter()
            .map(|r| *r as *const Record)
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_filters_never_grow() {
        let records = sample();
        let mut pipeline = Pipeline::new(&records);
        let script = [
            "filter-lt:Education.Bachelor's Degree or Higher:60",
            "filter-state:CA",
            "filter-gt:Education.Bachelor's Degree or Higher:5",
            "filter-state:NV",
        ];
        let mut previous = pipeline.len();
        for line in script {
            pipeline.run_line(line).unwrap();
            assert!(pipeline.len() <= previous, "{line} grew the working set");
            previous = pipeline.len();
        }
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_reports_do_not_change_working_set() {
        let records = sample();
        let mut pipeline = Pipeline::new(&records);
        for line in [
            "display",
            "population-total",
            "population:Education.Bachelor's Degree or Higher",
            "percent:Education.Bachelor's Degree or Higher",
        ] {
            pipeline.run_line(line).unwrap();
            assert_eq!(pipeline.len(), 3);
        }
    }

    #[test]
    fn test_percent_output() {
        let records = [county("A", "CA", 1000, 50.0), county("B", "CA", 3000, 25.0)];
        let (output, summary) = run(
            &records,
            "population-total\npercent:Education.Bachelor's Degree or Higher\n",
        );
        assert_eq!(
            output,
            "2014 population: 4000\n2014 Education.Bachelor's Degree or Higher percentage: 31.25\n"
        );
        assert_eq!(summary, RunSummary { executed: 2, failed: 0 });
    }

    #[test]
    fn test_errors_are_isolated() {
        let records = sample();
        let script = "\
# comment
filter-state:WY
percent:Education.Bachelor's Degree or Higher
bogus

population-total
";
        let (output, summary) = run(&records, script);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Filter: state == WY (0 entries)");
        assert_eq!(
            lines[1],
            "Error in line 3: division by zero computing percentage of \
             'Education.Bachelor's Degree or Higher'"
        );
        assert_eq!(lines[2], "Error in line 4: Unknown operation: bogus");
        assert_eq!(lines[3], "2014 population: 0");
        assert_eq!(summary, RunSummary { executed: 2, failed: 2 });
    }

    #[test]
    fn test_population_total_beyond_u64() {
        let records = [
            county("Alpha County", "CA", u64::MAX, 0.0),
            county("Beta County", "CA", 1, 0.0),
        ];
        let (output, summary) = run(&records, "population-total\ndisplay\n");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "2014 population: 18446744073709551616");
        assert_eq!(lines.len(), 3);
        assert_eq!(summary, RunSummary { executed: 2, failed: 0 });
    }

    #[test]
    fn test_empty_store() {
        let (output, summary) = run(&[], "display\npopulation-total\n");
        assert_eq!(output, "2014 population: 0\n");
        assert_eq!(summary.executed, 2);
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(40.0), "40.0");
        assert_eq!(format_decimal(12.5), "12.5");
        assert_eq!(format_decimal(-3.0), "-3.0");
        assert_eq!(format_decimal(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_decimal(0.0001), "0.0001");
        assert_eq!(format_decimal(9999999999999998.0), "9999999999999998.0");
    }

    #[test]
    fn test_format_decimal_exponent_form() {
        assert_eq!(format_decimal(1e16), "1e+16");
        assert_eq!(format_decimal(1.2345e20), "1.2345e+20");
        assert_eq!(format_decimal(1e-5), "1e-05");
        assert_eq!(format_decimal(-1.5e-7), "-1.5e-07");
        assert_eq!(format_decimal(f64::INFINITY), "inf");
    }

    #[test]
    fn test_huge_sub_population_uses_exponent() {
        let records = [county("Alpha County", "CA", u64::MAX, 100.0)];
        let (output, _) = run(
            &records,
            "population:Education.Bachelor's Degree or Higher\n",
        );
        assert_eq!(
            output,
            "2014 Education.Bachelor's Degree or Higher population: 1.8446744073709552e+19\n"
        );
    }

    // --- Script fixtures under specs/ ---

    /// Run a script fixture against specs/counties.csv and compare with its
    /// `.expected` file.
    fn assert_script(name: &str) {
        let spec_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("specs");
        let records = load_records(spec_dir.join("counties.csv")).unwrap();
        let script = fs::read_to_string(spec_dir.join(format!("{name}.script"))).unwrap();
        let expected = fs::read_to_string(spec_dir.join(format!("{name}.expected"))).unwrap();

        let (output, _) = run(&records, &script);
        assert_eq!(
            output.trim_end(),
            expected.trim_end(),
            "output differs for {name}"
        );
    }

    macro_rules! script_test {
        ($name:ident, $file:expr) => {
            #[test]
            fn $name() {
                assert_script($file);
            }
        };
    }

    script_test!(script_all_counties, "all-counties");
    script_test!(script_errors, "errors");
    script_test!(script_state_filter, "state-filter");
    script_test!(script_threshold_filters, "threshold-filters");
    script_test!(script_weighted_percent, "weighted-percent");
}
