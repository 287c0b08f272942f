//! Row-selection filters for report routing.
//!
//! A filter is a named, stateless function from `(args, table)` to the set
//! of passing rows. Filters are invoked through textual calls such as
//! `matches(patient_state, AZ|CA)`, resolved against a [`FilterRegistry`]
//! and combined into AND-ed [`FilterList`]s.

pub mod defaults;
pub mod definition;
pub mod error;
pub mod filters;
pub mod list;
pub mod registry;

pub use defaults::default_filters;
pub use definition::{FilterContext, FilterDefinition};
pub use error::{FilterError, Result};
pub use list::{FilterElimination, FilterList, FilterOutcome};
pub use registry::{FilterRegistry, standard_registry};
