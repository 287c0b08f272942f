use elr_model::Selection;
use polars::prelude::DataFrame;

use crate::definition::{FilterContext, FilterDefinition};
use crate::error::{FilterError, Result};

fn no_args(filter: &'static str, args: &[String]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(FilterError::arity(filter, "no", args.len()))
    }
}

/// `allowAll()`: every row passes.
pub struct AllowAll;

impl FilterDefinition for AllowAll {
    fn name(&self) -> &'static str {
        "allowAll"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        no_args(self.name(), args)
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        Ok(Selection::all(table.height()))
    }
}

/// `allowNone()`: no row passes.
pub struct AllowNone;

impl FilterDefinition for AllowNone {
    fn name(&self) -> &'static str {
        "allowNone"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        no_args(self.name(), args)
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        Ok(Selection::none(table.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::fixtures::{args, frame};

    #[test]
    fn any_table_shape() {
        let ctx = FilterContext::default();
        let table = frame(&[("x", &["1", "2", "3"])]);
        assert_eq!(AllowAll.selection(&[], &table, &ctx).unwrap().count(), 3);
        assert!(AllowNone.selection(&[], &table, &ctx).unwrap().is_empty());
        assert_eq!(
            AllowAll.selection(&[], &DataFrame::empty(), &ctx).unwrap().count(),
            0
        );
    }

    #[test]
    fn rejects_arguments() {
        assert!(AllowAll.validate_args(&args(&["x"])).is_err());
        assert!(AllowNone.validate_args(&args(&["x"])).is_err());
    }
}
