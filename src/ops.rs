//! Filter and aggregate operations over a working set.
//!
//! A working set is a slice of record references. Filters return a new,
//! order-preserving subset; aggregates only read. Any field resolution
//! failure aborts the whole operation so callers never see a partial
//! result.

use crate::error::{PipelineError, Result};
use crate::field::FieldResolver;
use crate::record::Record;

/// Records currently selected by a pipeline.
pub type WorkingSet<'a> = Vec<&'a Record>;

/// Keep records whose state equals `state` exactly (case-sensitive).
pub fn filter_state<'a>(records: &[&'a Record], state: &str) -> WorkingSet<'a> {
    records
        .iter()
        .copied()
        .filter(|r| r.state() == state)
        .collect()
}

/// Keep records where `field` resolves to a value greater than `threshold`.
pub fn filter_gt<'a>(
    resolver: &FieldResolver,
    records: &[&'a Record],
    field: &str,
    threshold: f64,
) -> Result<WorkingSet<'a>> {
    filter_by(resolver, records, field, |value| value > threshold)
}

/// Keep records where `field` resolves to a value less than `threshold`.
pub fn filter_lt<'a>(
    resolver: &FieldResolver,
    records: &[&'a Record],
    field: &str,
    threshold: f64,
) -> Result<WorkingSet<'a>> {
    filter_by(resolver, records, field, |value| value < threshold)
}

fn filter_by<'a>(
    resolver: &FieldResolver,
    records: &[&'a Record],
    field: &str,
    keep: impl Fn(f64) -> bool,
) -> Result<WorkingSet<'a>> {
    let mut kept = Vec::new();
    for &record in records {
        if keep(resolver.resolve(record, field)?) {
            kept.push(record);
        }
    }
    Ok(kept)
}

/// Sum of the canonical population count.
///
/// Accumulates in `u128` so any number of `u64` counts fits.
pub fn population_total(records: &[&Record]) -> u128 {
    records
        .iter()
        .map(|r| u128::from(r.total_population()))
        .sum()
}

/// Estimated absolute sub-population: each county's population scaled by its
/// `field` percentage, summed.
pub fn sub_population(resolver: &FieldResolver, records: &[&Record], field: &str) -> Result<f64> {
    let mut sum = 0.0;
    for &record in records {
        let pct = resolver.resolve(record, field)?;
        sum += record.total_population() as f64 * (pct / 100.0);
    }
    Ok(sum)
}

/// Percentage of the working set's own total population that `field`
/// represents, weighted by each county's population.
pub fn percent(resolver: &FieldResolver, records: &[&Record], field: &str) -> Result<f64> {
    let sub = sub_population(resolver, records, field)?;
    let total = population_total(records);
    if total == 0 {
        return Err(PipelineError::DivisionByZero {
            field: field.to_string(),
        });
    }
    Ok(sub / total as f64 * 100.0)
}
