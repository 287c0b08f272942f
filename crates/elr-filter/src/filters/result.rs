use elr_common::column_values;
use elr_model::Selection;
use polars::prelude::DataFrame;

use super::{at_least, full_matches, matches_any};
use crate::definition::{FilterContext, FilterDefinition};
use crate::error::Result;

const TEST_TYPE_COLUMN: &str = "test_type";
const ANTIGEN: &str = "antigen";

/// `filterOutNegativeAntigenTestType(col, re1, re2, ...)`: drops antigen
/// tests whose result in `col` matches any pattern.
///
/// Rows are kept unless both the result matches and `test_type` is
/// `antigen`. When either column is absent every row is kept.
pub struct FilterOutNegativeAntigenTestType;

impl FilterDefinition for FilterOutNegativeAntigenTestType {
    fn name(&self) -> &'static str {
        "filterOutNegativeAntigenTestType"
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
        let (Some(results), Some(test_types)) = (
            column_values(table, &args[0])?,
            column_values(table, TEST_TYPE_COLUMN)?,
        ) else {
            return Ok(Selection::all(table.height()));
        };
        Ok(Selection::from_mask(
            results
                .iter()
                .zip(&test_types)
                .map(|(result, test_type)| {
                    !(matches_any(&regexes, result)
                        && test_type.trim().eq_ignore_ascii_case(ANTIGEN))
                })
                .collect(),
        ))
    }
}
