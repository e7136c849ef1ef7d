//! # county-pipe
//!
//! Run small scripts of filter and report commands against a table of
//! county demographic records.
//!
//! ## Overview
//!
//! A script is evaluated line by line against a single working set:
//! - **Filters** (`filter-state`, `filter-gt`, `filter-lt`) narrow the working set
//! - **Reports** (`display`, `population-total`, `population`, `percent`) read it
//! - **Field paths** such as `Education.Bachelor's Degree or Higher` reach
//!   into a record's grouped figures
//! - **Errors** are reported per line; the working set is left as it was
//!
//! ## Example
//!
//! ```
//! use county_pipe::{Group, Pipeline, Record};
//!
//! let records = vec![
//!     Record::builder("Alpha County", "CA")
//!         .field(Group::Education, "Bachelor's Degree or Higher", 50.0)
//!         .total_population(100)
//!         .build()
//!         .unwrap(),
//!     Record::builder("Beta County", "CA")
//!         .field(Group::Education, "Bachelor's Degree or Higher", 10.0)
//!         .total_population(900)
//!         .build()
//!         .unwrap(),
//! ];
//!
//! let mut pipeline = Pipeline::new(&records);
//! let mut out = Vec::new();
//! pipeline
//!     .run_script("filter-state:CA\npopulation-total\n", &mut out)
//!     .unwrap();
//!
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "Filter: state == CA (2 entries)\n2014 population: 1000\n"
//! );
//! ```

pub mod dsl;
pub mod error;
pub mod executor;
pub mod field;
pub mod loader;
pub mod ops;
pub mod record;

pub use dsl::{Command, parse_command, script_lines};
pub use error::{PipelineError, Result};
pub use executor::{Pipeline, RunSummary, format_decimal};
pub use field::{FieldResolver, FieldValue};
pub use loader::{load_records, read_records};
pub use ops::WorkingSet;
pub use record::{FieldGroup, Group, POPULATION_LABEL, PopulationTable, Record, RecordBuilder};
