use elr_common::column_values;
use elr_model::Selection;
use polars::prelude::DataFrame;

use super::{at_least, full_matches, matches_any};
use crate::definition::{FilterContext, FilterDefinition};
use crate::error::{FilterError, Result};

/// `matches(col, re1, re2, ...)`: rows whose `col` matches any pattern.
///
/// An absent column selects nothing.
pub struct Matches;

impl FilterDefinition for Matches {
    fn name(&self) -> &'static str {
        "matches"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        at_least(self.name(), args, 2, "a column and one or more pattern")?;
        full_matches(self.name(), &args[1..]).map(|_| ())
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        let regexes = full_matches(self.name(), &args[1..])?;
        let Some(values) = column_values(table, &args[0])? else {
            return Ok(Selection::none(table.height()));
        };
        Ok(Selection::from_mask(
            values.iter().map(|value| matches_any(&regexes, value)).collect(),
        ))
    }
}

/// `doesNotMatch(col, re1, re2, ...)`: rows whose `col` matches no pattern.
///
/// An absent column selects every row.
pub struct DoesNotMatch;

impl FilterDefinition for DoesNotMatch {
    fn name(&self) -> &'static str {
        "doesNotMatch"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        at_least(self.name(), args, 2, "a column and one or more pattern")?;
        full_matches(self.name(), &args[1..]).map(|_| ())
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        let regexes = full_matches(self.name(), &args[1..])?;
        let Some(values) = column_values(table, &args[0])? else {
            return Ok(Selection::all(table.height()));
        };
        Ok(Selection::from_mask(
            values.iter().map(|value| !matches_any(&regexes, value)).collect(),
        ))
    }
}

/// `orEquals(col1, re1, col2, re2, ...)`: rows where any pair matches.
///
/// Pairs naming an absent column are skipped.
pub struct OrEquals;

impl FilterDefinition for OrEquals {
    fn name(&self) -> &'static str {
        "orEquals"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        if args.is_empty() || args.len() % 2 != 0 {
            return Err(FilterError::arity(self.name(), "a positive even number of", args.len()));
        }
        let patterns: Vec<String> = args.iter().skip(1).step_by(2).cloned().collect();
        full_matches(self.name(), &patterns).map(|_| ())
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        let mut selection = Selection::none(table.height());
        for pair in args.chunks(2) {
            let Some(values) = column_values(table, &pair[0])? else {
                continue;
            };
            let regexes = full_matches(self.name(), &pair[1..])?;
            let hits = Selection::from_mask(
                values.iter().map(|value| matches_any(&regexes, value)).collect(),
            );
            selection = selection.or(&hits);
        }
        Ok(selection)
    }
}
