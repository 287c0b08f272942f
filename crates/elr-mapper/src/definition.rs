use std::collections::HashMap;

use chrono::{DateTime, Utc};
use elr_model::{Element, LookupTable};

use crate::error::{MapperError, Result};

/// Read access to the lookup tables a mapper may consult.
pub trait TableSource: Send + Sync {
    fn lookup_table(&self, name: &str) -> Option<&LookupTable>;
}

impl TableSource for HashMap<String, LookupTable> {
    fn lookup_table(&self, name: &str) -> Option<&LookupTable> {
        self.get(name)
    }
}

/// Everything a mapper may read besides the row values.
#[derive(Clone, Copy)]
pub struct MapperContext<'a> {
    pub tables: Option<&'a dyn TableSource>,
    /// Clock reading used by time-dependent mappers.
    pub now: DateTime<Utc>,
}

impl<'a> MapperContext<'a> {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { tables: None, now }
    }

    #[must_use]
    pub fn with_tables(mut self, tables: &'a dyn TableSource) -> Self {
        self.tables = Some(tables);
        self
    }

    /// The table named by `element.table`.
    pub(crate) fn table_for(
        &self,
        mapper: &'static str,
        element: &Element,
    ) -> Result<&'a LookupTable> {
        let name = element.table.as_deref().ok_or_else(|| MapperError::MissingTable {
            mapper,
            element: element.name.clone(),
        })?;
        self.tables
            .and_then(|tables| tables.lookup_table(name))
            .ok_or_else(|| MapperError::UnknownTable {
                mapper,
                element: element.name.clone(),
                table: name.to_string(),
            })
    }
}

impl Default for MapperContext<'_> {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// A fetched dependency: the element it came from and its non-blank value.
#[derive(Debug, Clone)]
pub struct ElementAndValue<'a> {
    pub element: &'a Element,
    pub value: String,
}

impl<'a> ElementAndValue<'a> {
    pub fn new(element: &'a Element, value: impl Into<String>) -> Self {
        Self {
            element,
            value: value.into(),
        }
    }
}

/// Value of the dependency named `name`, matched ignoring case.
pub fn value_of<'v>(values: &'v [ElementAndValue<'_>], name: &str) -> Option<&'v str> {
    values
        .iter()
        .find(|candidate| candidate.element.name.eq_ignore_ascii_case(name))
        .map(|candidate| candidate.value.as_str())
}

/// A named, stateless value derivation.
pub trait Mapper: Send + Sync {
    /// Name used in call expressions.
    fn name(&self) -> &'static str;

    /// Element names whose values [`apply`](Self::apply) needs.
    ///
    /// Literal arguments are excluded. Wrong arity is reported here so that
    /// catalog validation catches it before any row is mapped.
    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>>;

    /// Computes the element's value; `None` falls through to the default.
    ///
    /// `values` holds the non-blank dependencies, in `value_names` order.
    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        ctx: &MapperContext<'_>,
    ) -> Result<Option<String>>;

    /// Order in which this mapper's unresolved dependents should be
    /// evaluated when they cannot be ordered by dependencies alone.
    fn dependency_preference(&self) -> &'static [&'static str] {
        &[]
    }
}
