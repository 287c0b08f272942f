//! The closed set of standard filters.

mod constant;
mod date;
mod jurisdiction;
mod matching;
mod presence;
mod result;

pub use constant::{AllowAll, AllowNone};
pub use date::InDateInterval;
pub use jurisdiction::FilterByCounty;
pub use matching::{DoesNotMatch, Matches, OrEquals};
pub use presence::{AtLeastOneHasValue, HasAtLeastOneOf, HasValidDataFor, IsValidClia};
pub use result::FilterOutNegativeAntigenTestType;

use regex::Regex;

use crate::error::{FilterError, Result};

/// Compiles `pattern` so that it must match the whole value.
pub(crate) fn full_match(filter: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| FilterError::Regex {
        filter,
        pattern: pattern.to_string(),
        source,
    })
}

pub(crate) fn full_matches(filter: &'static str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| full_match(filter, pattern))
        .collect()
}

pub(crate) fn matches_any(regexes: &[Regex], value: &str) -> bool {
    regexes.iter().any(|regex| regex.is_match(value))
}

pub(crate) fn at_least(
    filter: &'static str,
    args: &[String],
    min: usize,
    expected: &'static str,
) -> Result<()> {
    if args.len() < min {
        return Err(FilterError::arity(filter, expected, args.len()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use elr_common::string_frame;
    use polars::prelude::DataFrame;

    /// Frame from `(column, values)` pairs of equal length.
    pub fn frame(columns: &[(&str, &[&str])]) -> DataFrame {
        let names: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let height = columns.first().map_or(0, |(_, values)| values.len());
        let rows: Vec<Vec<String>> = (0..height)
            .map(|row| {
                columns
                    .iter()
                    .map(|(_, values)| values[row].to_string())
                    .collect()
            })
            .collect();
        string_frame(&names, &rows).unwrap()
    }

    pub fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }
}
