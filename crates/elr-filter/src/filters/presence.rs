use elr_common::{column_values, is_blank};
use elr_model::Selection;
use polars::prelude::DataFrame;

use super::at_least;
use crate::definition::{FilterContext, FilterDefinition};
use crate::error::Result;

const CLIA_LENGTH: usize = 10;

/// `hasValidDataFor(col1, col2, ...)`: rows where every column is non-blank.
///
/// A column absent from the table is never valid, so any absent column
/// selects nothing.
pub struct HasValidDataFor;

impl FilterDefinition for HasValidDataFor {
    fn name(&self) -> &'static str {
        "hasValidDataFor"
    }

    fn validate_args(&self, _args: &[String]) -> Result<()> {
        Ok(())
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        let height = table.height();
        let mut selection = Selection::all(height);
        for column in args {
            let Some(values) = column_values(table, column)? else {
                return Ok(Selection::none(height));
            };
            let present =
                Selection::from_mask(values.iter().map(|value| !is_blank(value)).collect());
            selection = selection.and(&present);
        }
        Ok(selection)
    }
}

/// `hasAtLeastOneOf(col1, col2, ...)`: rows where some column is non-blank.
///
/// Absent columns are skipped.
pub struct HasAtLeastOneOf;

impl FilterDefinition for HasAtLeastOneOf {
    fn name(&self) -> &'static str {
        "hasAtLeastOneOf"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        at_least(self.name(), args, 1, "one or more")
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        any_column(table, args, |value| !is_blank(value))
    }
}

/// `atLeastOneHasValue(value, col1, col2, ...)`: rows where some column
/// equals `value`, ignoring case.
pub struct AtLeastOneHasValue;

impl FilterDefinition for AtLeastOneHasValue {
    fn name(&self) -> &'static str {
        "atLeastOneHasValue"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        at_least(self.name(), args, 2, "a value and one or more column")
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        let wanted = &args[0];
        any_column(table, &args[1..], |value| value.eq_ignore_ascii_case(wanted))
    }
}

/// `isValidCLIA(col1, col2, ...)`: rows where some column holds a
/// ten character alphanumeric CLIA number.
pub struct IsValidClia;

impl FilterDefinition for IsValidClia {
    fn name(&self) -> &'static str {
        "isValidCLIA"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        at_least(self.name(), args, 1, "one or more")
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        any_column(table, args, is_valid_clia)
    }
}

pub(crate) fn is_valid_clia(value: &str) -> bool {
    value.len() == CLIA_LENGTH && value.chars().all(|ch| ch.is_ascii_alphanumeric())
}

/// OR of `predicate` over the present columns in `columns`.
fn any_column(
    table: &DataFrame,
    columns: &[String],
    predicate: impl Fn(&str) -> bool,
) -> Result<Selection> {
    let mut selection = Selection::none(table.height());
    for column in columns {
        if let Some(values) = column_values(table, column)? {
            let hits = Selection::from_mask(values.iter().map(|value| predicate(value)).collect());
            selection = selection.or(&hits);
        }
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::fixtures::{args, frame};

    fn indices(selection: &Selection) -> Vec<usize> {
        selection.indices().collect()
    }

    #[test]
    fn valid_data_requires_every_column() {
        let table = frame(&[
            ("a", &["x", "", "x", " "]),
            ("b", &["y", "y", "", "y"]),
        ]);
        let ctx = FilterContext::default();
        let selected = HasValidDataFor.selection(&args(&["a", "b"]), &table, &ctx).unwrap();
        assert_eq!(indices(&selected), [0]);
        let everything = HasValidDataFor.selection(&[], &table, &ctx).unwrap();
        assert_eq!(everything.count(), 4);
    }

    #[test]
    fn valid_data_with_absent_column_selects_nothing() {
        let table = frame(&[("a", &["x", "x"])]);
        let selected = HasValidDataFor
            .selection(&args(&["a", "b"]), &table, &FilterContext::default())
            .unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn at_least_one_skips_absent_columns() {
        let table = frame(&[
            ("patient_street", &["1 Main", "", ""]),
            ("patient_email", &["", "a@b.org", ""]),
        ]);
        let selected = HasAtLeastOneOf
            .selection(
                &args(&["patient_street", "patient_zip_code", "patient_email"]),
                &table,
                &FilterContext::default(),
            )
            .unwrap();
        assert_eq!(indices(&selected), [0, 1]);
        assert!(HasAtLeastOneOf.validate_args(&[]).is_err());
    }

    #[test]
    fn has_value_ignores_case() {
        let table = frame(&[("a", &["Y", "n", ""]), ("b", &["", "y", ""])]);
        let selected = AtLeastOneHasValue
            .selection(&args(&["y", "a", "b", "c"]), &table, &FilterContext::default())
            .unwrap();
        assert_eq!(indices(&selected), [0, 1]);
    }

    #[test]
    fn clia_shape() {
        let table = frame(&[
            ("testing_lab_clia", &["05D2222542", "05D22225", "", "05D-222254"]),
            ("reporting_facility_clia", &["", "", "10D0999999", ""]),
        ]);
        let selected = IsValidClia
            .selection(
                &args(&["testing_lab_clia", "reporting_facility_clia"]),
                &table,
                &FilterContext::default(),
            )
            .unwrap();
        assert_eq!(indices(&selected), [0, 2]);
    }
}
