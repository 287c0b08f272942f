use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Months, TimeDelta};
use elr_common::{format_datetime, parse_date, parse_datetime};
use elr_model::Element;

use super::{exactly, first_value, within};
use crate::definition::{ElementAndValue, Mapper, MapperContext, value_of};
use crate::error::{MapperError, Result};

const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.3f%z";
const FALLBACK_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// `timestamp([format])`: the context clock rendered with a strftime
/// pattern. An unusable pattern falls back to `%Y%m%d%H%M%S`.
pub struct TimestampMapper;

impl Mapper for TimestampMapper {
    fn name(&self) -> &'static str {
        "timestamp"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        within(self.name(), args, 0..=1, "at most 1")?;
        Ok(Vec::new())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        _values: &[ElementAndValue<'_>],
        ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let pattern = args.first().map_or(DEFAULT_TIMESTAMP_FORMAT, String::as_str);
        let mut rendered = String::new();
        if write!(rendered, "{}", ctx.now.format(pattern)).is_err() {
            rendered = ctx.now.format(FALLBACK_TIMESTAMP_FORMAT).to_string();
        }
        Ok(Some(rendered))
    }
}

#[derive(Debug, Clone, Copy)]
enum OffsetUnit {
    Seconds,
    Minutes,
    Days,
    Months,
    Years,
}

/// `offsetDateTime(element, unit, amount)`: shifts a date-time by a signed
/// number of seconds, minutes, days, months or years.
pub struct DateTimeOffsetMapper;

impl DateTimeOffsetMapper {
    fn unit(&self, element: &Element, arg: &str) -> Result<OffsetUnit> {
        match arg.to_ascii_lowercase().as_str() {
            "second" | "seconds" => Ok(OffsetUnit::Seconds),
            "minute" | "minutes" => Ok(OffsetUnit::Minutes),
            "day" | "days" => Ok(OffsetUnit::Days),
            "month" | "months" => Ok(OffsetUnit::Months),
            "year" | "years" => Ok(OffsetUnit::Years),
            other => Err(MapperError::invalid(
                self.name(),
                &element.name,
                format!("unknown unit {other:?}"),
            )),
        }
    }

    fn amount(&self, element: &Element, arg: &str) -> Result<i64> {
        arg.parse().map_err(|_| {
            MapperError::invalid(
                self.name(),
                &element.name,
                format!("{arg:?} is not an integer"),
            )
        })
    }

    fn shift(
        unit: OffsetUnit,
        at: DateTime<FixedOffset>,
        amount: i64,
    ) -> Option<DateTime<FixedOffset>> {
        let months = |count: i64| {
            let months = Months::new(u32::try_from(count.unsigned_abs()).ok()?);
            if count < 0 {
                at.checked_sub_months(months)
            } else {
                at.checked_add_months(months)
            }
        };
        match unit {
            OffsetUnit::Seconds => at.checked_add_signed(TimeDelta::try_seconds(amount)?),
            OffsetUnit::Minutes => at.checked_add_signed(TimeDelta::try_minutes(amount)?),
            OffsetUnit::Days => at.checked_add_signed(TimeDelta::try_days(amount)?),
            OffsetUnit::Months => months(amount),
            OffsetUnit::Years => months(amount.checked_mul(12)?),
        }
    }
}

impl Mapper for DateTimeOffsetMapper {
    fn name(&self) -> &'static str {
        "offsetDateTime"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 3, "exactly 3")?;
        self.unit(element, &args[1])?;
        self.amount(element, &args[2])?;
        Ok(vec![args[0].clone()])
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let Some(value) = first_value(values) else {
            return Ok(None);
        };
        let unit = self.unit(element, &args[1])?;
        let amount = self.amount(element, &args[2])?;
        let at = parse_datetime(value)
            .ok_or_else(|| MapperError::invalid(self.name(), &element.name, "invalid date"))?;
        let shifted = Self::shift(unit, at, amount).ok_or_else(|| {
            MapperError::invalid(self.name(), &element.name, "offset out of range")
        })?;
        Ok(Some(format_datetime(&shifted)))
    }
}

/// `patientAge(age, collected, dob)`: a stated age, or whole years
/// between birth and specimen collection.
///
/// Unparsable dates and births on or after collection give no value.
pub struct PatientAgeMapper;

impl Mapper for PatientAgeMapper {
    fn name(&self) -> &'static str {
        "patientAge"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 3, "exactly 3")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        if let Some(age) = value_of(values, &args[0]) {
            return Ok(Some(age.trim().to_string()));
        }
        let collected = value_of(values, &args[1]).and_then(parse_date);
        let born = value_of(values, &args[2]).and_then(parse_date);
        let (Some(collected), Some(born)) = (collected, born) else {
            return Ok(None);
        };
        if born >= collected {
            return Ok(None);
        }
        Ok(collected.years_since(born).map(|years| years.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::mappers::fixtures::{args, values};

    fn ctx() -> MapperContext<'static> {
        MapperContext::new(Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 7).unwrap())
    }

    #[test]
    fn timestamp_uses_context_clock() {
        let element = Element::new("file_created_date");
        assert_eq!(
            TimestampMapper
                .apply(&element, &args(&["%Y-%m-%d"]), &[], &ctx())
                .unwrap()
                .as_deref(),
            Some("2024-02-29")
        );
        assert_eq!(
            TimestampMapper
                .apply(&element, &args(&["%Q"]), &[], &ctx())
                .unwrap()
                .as_deref(),
            Some("20240229134507")
        );
        assert!(TimestampMapper.value_names(&element, &args(&["a", "b"])).is_err());
    }

    #[test]
    fn offsets_by_unit() {
        let element = Element::new("shifted");
        let source = Element::new("specimen_collection_date_time");
        let row = values(&[(&source, "20240131120000+0000")]);
        let shift = |unit: &str, amount: &str| {
            let call = args(&["specimen_collection_date_time", unit, amount]);
            DateTimeOffsetMapper
                .apply(&element, &call, &row, &ctx())
                .unwrap()
                .unwrap()
        };
        assert_eq!(shift("months", "1"), "20240229120000+0000");
        assert_eq!(shift("days", "-31"), "20231231120000+0000");
        assert_eq!(shift("minutes", "90"), "20240131133000+0000");
        assert_eq!(shift("year", "1"), "20250131120000+0000");
        assert!(
            DateTimeOffsetMapper
                .value_names(&element, &args(&["d", "fortnights", "1"]))
                .is_err()
        );
    }

    #[test]
    fn patient_age() {
        let element = Element::new("patient_age");
        let age = Element::new("patient_age");
        let collected = Element::new("specimen_collection_date_time");
        let dob = Element::new("patient_dob");
        let call = args(&["patient_age", "specimen_collection_date_time", "patient_dob"]);
        let compute = |row: &[ElementAndValue<'_>]| {
            PatientAgeMapper
                .apply(&element, &call, row, &ctx())
                .unwrap()
        };

        assert_eq!(
            compute(&values(&[(&age, "41"), (&dob, "19900101")])).as_deref(),
            Some("41")
        );
        let row = values(&[(&collected, "2024-03-01T10:00:00Z"), (&dob, "1990-03-02")]);
        assert_eq!(compute(&row).as_deref(), Some("33"));
        assert_eq!(
            compute(&values(&[(&collected, "2024-03-01"), (&dob, "2024-05-01")])),
            None
        );
        assert_eq!(compute(&values(&[(&dob, "1990-03-02")])), None);
    }
}
