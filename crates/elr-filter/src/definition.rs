use chrono::{DateTime, Utc};
use elr_model::Selection;
use polars::prelude::DataFrame;

use crate::error::Result;

/// Evaluation context shared by every filter in a pass.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext {
    /// Instant that `now` arguments resolve to.
    pub now: DateTime<Utc>,
}

impl FilterContext {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

impl Default for FilterContext {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

/// A named, stateless row-selection function.
///
/// Implementations must be pure: the same arguments and table always
/// produce the same selection.
pub trait FilterDefinition: Send + Sync {
    /// Name used in call expressions.
    fn name(&self) -> &'static str;

    /// Checks argument count and syntax without looking at any data.
    fn validate_args(&self, args: &[String]) -> Result<()>;

    /// Rows of `table` that pass.
    fn selection(&self, args: &[String], table: &DataFrame, ctx: &FilterContext)
    -> Result<Selection>;
}
