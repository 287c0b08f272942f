use elr_common::column_values;
use elr_model::Selection;
use polars::prelude::DataFrame;

use crate::definition::{FilterContext, FilterDefinition};
use crate::error::{FilterError, Result};

/// State and county columns checked together.
const LOCATION_COLUMNS: &[(&str, &str)] = &[
    ("patient_state", "patient_county"),
    ("ordering_facility_state", "ordering_facility_county"),
];

/// `filterByCounty(state, county)`: rows located in the county, either by
/// patient address or by ordering facility.
///
/// The state must equal `state` and the county must contain `county`,
/// both ignoring case. A location pair with a missing column is ignored;
/// with no usable pair nothing passes.
pub struct FilterByCounty;

impl FilterDefinition for FilterByCounty {
    fn name(&self) -> &'static str {
        "filterByCounty"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        if args.len() != 2 {
            return Err(FilterError::arity(self.name(), "exactly 2", args.len()));
        }
        Ok(())
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        _ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        let state = args[0].trim();
        let county = args[1].trim().to_lowercase();
        let mut selection = Selection::none(table.height());
        for (state_column, county_column) in LOCATION_COLUMNS {
            let (Some(states), Some(counties)) = (
                column_values(table, state_column)?,
                column_values(table, county_column)?,
            ) else {
                continue;
            };
            let hits = Selection::from_mask(
                states
                    .iter()
                    .zip(&counties)
                    .map(|(row_state, row_county)| {
                        row_state.trim().eq_ignore_ascii_case(state)
                            && row_county.to_lowercase().contains(&county)
                    })
                    .collect(),
            );
            selection = selection.or(&hits);
        }
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::fixtures::{args, frame};

    #[test]
    fn patient_or_facility_location() {
        let table = frame(&[
            ("patient_state", &["AZ", "az", "CA", "AZ"]),
            ("patient_county", &["Pima County", "pima", "Pima", "Maricopa"]),
            ("ordering_facility_state", &["", "", "", "AZ"]),
            ("ordering_facility_county", &["", "", "", "Pima"]),
        ]);
        let selected = FilterByCounty
            .selection(&args(&["AZ", "Pima"]), &table, &FilterContext::default())
            .unwrap();
        assert_eq!(selected.indices().collect::<Vec<_>>(), [0, 1, 3]);
    }

    #[test]
    fn incomplete_pairs_are_ignored() {
        let table = frame(&[("patient_state", &["AZ"]), ("ordering_facility_county", &["Pima"])]);
        let selected = FilterByCounty
            .selection(&args(&["AZ", "Pima"]), &table, &FilterContext::default())
            .unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn needs_state_and_county() {
        assert!(FilterByCounty.validate_args(&args(&["AZ"])).is_err());
        assert!(FilterByCounty.validate_args(&args(&["AZ", "Pima", "x"])).is_err());
    }
}
