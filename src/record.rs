//! County demographic records.
//!
//! A [`Record`] is one county's snapshot: identity fields (county, state),
//! four groups of percentage-like figures, and a population table keyed by
//! label. Records are immutable once built; pipelines only ever hold
//! references to them.

use std::collections::BTreeMap;

use crate::error::{PipelineError, Result};

/// Label of the population figure used for all totals.
pub const POPULATION_LABEL: &str = "2014 Population";

/// Named numeric sub-fields of a record group (e.g. `Income`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldGroup {
    fields: BTreeMap<String, f64>,
}

impl FieldGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a sub-field.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a sub-field, preferring an exact name match and falling back
    /// to an ASCII case-insensitive one.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().or_else(|| {
            self.fields
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| *value)
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FieldGroup {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut group = FieldGroup::new();
        for (name, value) in iter {
            group.insert(name, value);
        }
        group
    }
}

/// Population counts keyed by label (e.g. "2014 Population").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationTable {
    counts: BTreeMap<String, u64>,
}

impl PopulationTable {
    pub fn insert(&mut self, label: impl Into<String>, count: u64) {
        self.counts.insert(label.into(), count);
    }

    /// Same matching rules as [`FieldGroup::get`].
    pub fn get(&self, label: &str) -> Option<u64> {
        self.counts.get(label).copied().or_else(|| {
            self.counts
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(label))
                .map(|(_, count)| *count)
        })
    }
}

/// One county's demographic snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    county: String,
    state: String,
    age: FieldGroup,
    education: FieldGroup,
    ethnicities: FieldGroup,
    income: FieldGroup,
    population: PopulationTable,
    // Cached canonical count; always equal to population[POPULATION_LABEL].
    total: u64,
}

impl Record {
    pub fn builder(county: impl Into<String>, state: impl Into<String>) -> RecordBuilder {
        RecordBuilder::new(county, state)
    }

    pub fn county(&self) -> &str {
        &self.county
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn age(&self) -> &FieldGroup {
        &self.age
    }

    pub fn education(&self) -> &FieldGroup {
        &self.education
    }

    pub fn ethnicities(&self) -> &FieldGroup {
        &self.ethnicities
    }

    pub fn income(&self) -> &FieldGroup {
        &self.income
    }

    pub fn population(&self) -> &PopulationTable {
        &self.population
    }

    /// The canonical population count (`"2014 Population"`).
    pub fn total_population(&self) -> u64 {
        self.total
    }
}

/// Which group a sub-field belongs to when building a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Age,
    Education,
    Ethnicities,
    Income,
}

impl Group {
    /// Match a group name case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "age" => Some(Group::Age),
            "education" => Some(Group::Education),
            "ethnicities" => Some(Group::Ethnicities),
            "income" => Some(Group::Income),
            _ => None,
        }
    }
}

/// Builder that enforces the record invariants: non-empty county and state,
/// and a canonical population figure.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    county: String,
    state: String,
    age: FieldGroup,
    education: FieldGroup,
    ethnicities: FieldGroup,
    income: FieldGroup,
    population: PopulationTable,
}

impl RecordBuilder {
    pub fn new(county: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            county: county.into(),
            state: state.into(),
            age: FieldGroup::new(),
            education: FieldGroup::new(),
            ethnicities: FieldGroup::new(),
            income: FieldGroup::new(),
            population: PopulationTable::default(),
        }
    }

    pub fn field(mut self, group: Group, name: impl Into<String>, value: f64) -> Self {
        let target = match group {
            Group::Age => &mut self.age,
            Group::Education => &mut self.education,
            Group::Ethnicities => &mut self.ethnicities,
            Group::Income => &mut self.income,
        };
        target.insert(name, value);
        self
    }

    pub fn population(mut self, label: impl Into<String>, count: u64) -> Self {
        self.population.insert(label, count);
        self
    }

    /// Shorthand for the canonical population label.
    pub fn total_population(self, count: u64) -> Self {
        self.population(POPULATION_LABEL, count)
    }

    pub fn build(self) -> Result<Record> {
        if self.county.trim().is_empty() {
            return Err(PipelineError::InvalidRecord("county name is empty".to_string()));
        }
        if self.state.trim().is_empty() {
            return Err(PipelineError::InvalidRecord(format!(
                "state is empty for county '{}'",
                self.county
            )));
        }
        let total = self.population.get(POPULATION_LABEL).ok_or_else(|| {
            PipelineError::InvalidRecord(format!(
                "missing '{POPULATION_LABEL}' for '{}'",
                self.county
            ))
        })?;

        Ok(Record {
            county: self.county,
            state: self.state,
            age: self.age,
            education: self.education,
            ethnicities: self.ethnicities,
            income: self.income,
            population: self.population,
            total,
        })
    }
}
