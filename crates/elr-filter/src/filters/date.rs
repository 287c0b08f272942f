use chrono::{DateTime, FixedOffset};
use elr_common::{IsoPeriod, column_values, is_blank, parse_datetime};
use elr_model::Selection;
use polars::prelude::DataFrame;

use crate::definition::{FilterContext, FilterDefinition};
use crate::error::{FilterError, Result};

const NOW: &str = "now";

/// `inDateInterval(col, date|now, period)`: rows whose `col` falls in
/// the half-open interval spanned by `period` from the anchor date.
///
/// A negative period such as `-P7D` looks back from the anchor. Values
/// that do not parse as dates are dropped, as is every row when the
/// column is absent.
pub struct InDateInterval;

impl InDateInterval {
    fn anchor(&self, arg: &str, ctx: &FilterContext) -> Result<DateTime<FixedOffset>> {
        if arg.trim().eq_ignore_ascii_case(NOW) {
            return Ok(ctx.now.fixed_offset());
        }
        parse_datetime(arg).ok_or_else(|| {
            FilterError::invalid(self.name(), format!("unparsable anchor date {arg:?}"))
        })
    }

    fn period(&self, arg: &str) -> Result<IsoPeriod> {
        arg.parse::<IsoPeriod>()
            .map_err(|err| FilterError::invalid(self.name(), err.to_string()))
    }
}

impl FilterDefinition for InDateInterval {
    fn name(&self) -> &'static str {
        "inDateInterval"
    }

    fn validate_args(&self, args: &[String]) -> Result<()> {
        if args.len() != 3 {
            return Err(FilterError::arity(self.name(), "exactly 3", args.len()));
        }
        if is_blank(&args[0]) {
            return Err(FilterError::invalid(self.name(), "column name is blank"));
        }
        if !args[1].trim().eq_ignore_ascii_case(NOW) && parse_datetime(&args[1]).is_none() {
            return Err(FilterError::invalid(
                self.name(),
                format!("unparsable anchor date {:?}", args[1]),
            ));
        }
        self.period(&args[2]).map(|_| ())
    }

    fn selection(
        &self,
        args: &[String],
        table: &DataFrame,
        ctx: &FilterContext,
    ) -> Result<Selection> {
        self.validate_args(args)?;
        let anchor = self.anchor(&args[1], ctx)?;
        let (start, end) = self
            .period(&args[2])?
            .interval_from(anchor)
            .ok_or_else(|| FilterError::invalid(self.name(), "interval overflows the calendar"))?;
        let Some(values) = column_values(table, &args[0])? else {
            return Ok(Selection::none(table.height()));
        };
        Ok(Selection::from_mask(
            values
                .iter()
                .map(|value| parse_datetime(value).is_some_and(|at| start <= at && at < end))
                .collect(),
        ))
    }
}
