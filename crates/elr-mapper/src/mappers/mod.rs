//! The closed set of standard mappers.

mod coded;
mod conditional;
mod datetime;
mod lookup;
mod text;

pub use coded::{CountryMapper, HashMapper, Obx8Mapper};
pub use conditional::{IfNotPresentMapper, IfNpiMapper, IfPresentMapper, IfThenElseMapper};
pub use datetime::{DateTimeOffsetMapper, PatientAgeMapper, TimestampMapper};
pub use lookup::{LivdLookupMapper, LookupMapper, ZipCodeToCountyMapper, ZipCodeToStateMapper};
pub use text::{
    CoalesceMapper, ConcatenateMapper, MiddleInitialMapper, NullMapper, SplitByCommaMapper,
    SplitMapper, StripNonNumericMapper, StripNumericMapper, StripPhoneFormattingMapper,
    TrimBlanksMapper, UseMapper,
};

use std::ops::RangeInclusive;

use crate::definition::ElementAndValue;
use crate::error::{MapperError, Result};

pub(crate) fn exactly(
    mapper: &'static str,
    args: &[String],
    count: usize,
    expected: &'static str,
) -> Result<()> {
    if args.len() != count {
        return Err(MapperError::arity(mapper, expected, args.len()));
    }
    Ok(())
}

pub(crate) fn within(
    mapper: &'static str,
    args: &[String],
    range: RangeInclusive<usize>,
    expected: &'static str,
) -> Result<()> {
    if !range.contains(&args.len()) {
        return Err(MapperError::arity(mapper, expected, args.len()));
    }
    Ok(())
}

pub(crate) fn first_value<'v>(values: &'v [ElementAndValue<'_>]) -> Option<&'v str> {
    values.first().map(|value| value.value.as_str())
}

/// Parses a non-negative index argument.
pub(crate) fn index_arg(mapper: &'static str, element: &str, arg: &str) -> Result<usize> {
    arg.trim()
        .parse()
        .map_err(|_| MapperError::invalid(mapper, element, format!("{arg:?} is not an index")))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use elr_model::Element;

    use crate::definition::ElementAndValue;

    pub fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    pub fn values<'a>(pairs: &[(&'a Element, &str)]) -> Vec<ElementAndValue<'a>> {
        pairs
            .iter()
            .map(|(element, value)| ElementAndValue::new(element, *value))
            .collect()
    }
}
