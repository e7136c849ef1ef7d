//! Dotted field-path resolution.
//!
//! A path such as `Education.Bachelor's Degree or Higher` names a top-level
//! field of a [`Record`] followed by sub-fields inside it. Top-level names
//! are looked up in an accessor table keyed by lower-cased name, built once
//! per [`FieldResolver`]; the final segment must reach a number.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};
use crate::record::{FieldGroup, PopulationTable, Record};

/// A value reached while walking a field path.
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Group(&'a FieldGroup),
    Population(&'a PopulationTable),
}

impl<'a> FieldValue<'a> {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Text(_) => "text",
            FieldValue::Number(_) => "a number",
            FieldValue::Group(_) | FieldValue::Population(_) => "a group",
        }
    }

    /// Descend into a named sub-field.
    fn child(&self, name: &str) -> Option<FieldValue<'a>> {
        match self {
            FieldValue::Group(group) => group.get(name).map(FieldValue::Number),
            FieldValue::Population(table) => table
                .get(name)
                .map(|count| FieldValue::Number(count as f64)),
            FieldValue::Text(_) | FieldValue::Number(_) => None,
        }
    }
}

type Accessor = for<'a> fn(&'a Record) -> FieldValue<'a>;

fn county(r: &Record) -> FieldValue<'_> {
    FieldValue::Text(r.county())
}

fn state(r: &Record) -> FieldValue<'_> {
    FieldValue::Text(r.state())
}

fn age(r: &Record) -> FieldValue<'_> {
    FieldValue::Group(r.age())
}

fn education(r: &Record) -> FieldValue<'_> {
    FieldValue::Group(r.education())
}

fn ethnicities(r: &Record) -> FieldValue<'_> {
    FieldValue::Group(r.ethnicities())
}

fn income(r: &Record) -> FieldValue<'_> {
    FieldValue::Group(r.income())
}

fn population(r: &Record) -> FieldValue<'_> {
    FieldValue::Population(r.population())
}

/// Resolves dotted paths against records.
pub struct FieldResolver {
    accessors: HashMap<&'static str, Accessor>,
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldResolver {
    pub fn new() -> Self {
        let entries: [(&'static str, Accessor); 7] = [
            ("county", county),
            ("state", state),
            ("age", age),
            ("education", education),
            ("ethnicities", ethnicities),
            ("income", income),
            ("population", population),
        ];
        Self {
            accessors: entries.into_iter().collect(),
        }
    }

    /// Walk `path` against `record` without requiring a numeric leaf.
    pub fn lookup<'a>(&self, record: &'a Record, path: &str) -> Result<FieldValue<'a>> {
        let mut segments = path.split('.');
        // split always yields at least one item
        let first = segments.next().unwrap_or_default();
        let not_found = |segment: &str| PipelineError::FieldNotFound {
            segment: segment.to_string(),
            path: path.to_string(),
        };

        let accessor = self
            .accessors
            .get(first.to_lowercase().as_str())
            .ok_or_else(|| not_found(first))?;
        let mut value = accessor(record);

        for segment in segments {
            value = value.child(segment).ok_or_else(|| not_found(segment))?;
        }
        Ok(value)
    }

    /// Resolve `path` to a number.
    pub fn resolve(&self, record: &Record, path: &str) -> Result<f64> {
        match self.lookup(record, path)? {
            FieldValue::Number(n) => Ok(n),
            other => Err(PipelineError::TypeMismatch {
                path: path.to_string(),
                found: other.kind(),
            }),
        }
    }
}
