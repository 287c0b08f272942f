//! Compiled filter lists combined with logical AND.

use std::fmt;
use std::sync::Arc;

use elr_model::{Call, Selection};
use polars::prelude::DataFrame;
use tracing::debug;

use crate::definition::{FilterContext, FilterDefinition};
use crate::error::Result;
use crate::registry::FilterRegistry;

/// Rows removed by one filter of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterElimination {
    /// Call text, e.g. `matches(patient_state, AZ)`.
    pub filter: String,
    pub before: usize,
    pub after: usize,
}

/// Result of applying a [`FilterList`].
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub selection: Selection,
    /// One entry per filter that removed at least one row, in list order.
    pub eliminations: Vec<FilterElimination>,
}

#[derive(Clone)]
struct CompiledFilter {
    call: Call,
    definition: Arc<dyn FilterDefinition>,
}

/// An ordered list of filter calls, parsed and validated up front.
#[derive(Clone, Default)]
pub struct FilterList {
    filters: Vec<CompiledFilter>,
}

impl FilterList {
    /// Parses and validates every call against `registry`.
    pub fn parse<S: AsRef<str>>(registry: &FilterRegistry, calls: &[S]) -> Result<Self> {
        let filters = calls
            .iter()
            .map(|text| {
                let call = Call::parse(text.as_ref())?;
                let definition = registry.resolve(call.name())?;
                definition.validate_args(call.args())?;
                Ok(CompiledFilter { call, definition })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { filters })
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn calls(&self) -> impl Iterator<Item = &Call> {
        self.filters.iter().map(|filter| &filter.call)
    }

    /// Intersection of every filter's selection over `table`.
    ///
    /// Stops as soon as no rows remain. An empty list selects every row.
    pub fn apply(&self, table: &DataFrame, ctx: &FilterContext) -> Result<FilterOutcome> {
        let mut selection = Selection::all(table.height());
        let mut eliminations = Vec::new();
        for filter in &self.filters {
            if selection.is_empty() {
                break;
            }
            let before = selection.count();
            let passed = filter
                .definition
                .selection(filter.call.args(), table, ctx)?;
            selection = selection.and(&passed);
            let after = selection.count();
            if after < before {
                debug!(filter = %filter.call, before, after, "filter eliminated rows");
                eliminations.push(FilterElimination {
                    filter: filter.call.to_string(),
                    before,
                    after,
                });
            }
        }
        Ok(FilterOutcome {
            selection,
            eliminations,
        })
    }
}

impl fmt::Debug for FilterList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.call.to_string()))
            .finish()
    }
}
