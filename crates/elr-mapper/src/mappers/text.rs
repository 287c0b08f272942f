use std::sync::LazyLock;

use elr_common::format_date;
use elr_model::{Element, ElementType};
use regex::Regex;

use super::{exactly, first_value, index_arg, within};
use crate::definition::{ElementAndValue, Mapper, MapperContext};
use crate::error::{MapperError, Result};

const DEFAULT_DELIMITER: &str = ", ";

/// `middleInitial(name)`: first letter, upper-cased.
pub struct MiddleInitialMapper;

impl Mapper for MiddleInitialMapper {
    fn name(&self) -> &'static str {
        "middleInitial"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok(first_value(values)
            .and_then(|name| name.trim().chars().next())
            .map(|initial| initial.to_uppercase().collect()))
    }
}

/// `use(a, b, ...)`: the first dependency with a value.
///
/// A date-time copied into a `DATE` element is narrowed to its date.
pub struct UseMapper;

impl Mapper for UseMapper {
    fn name(&self) -> &'static str {
        "use"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let Some(first) = values.first() else {
            return Ok(None);
        };
        if element.element_type == Some(ElementType::Date)
            && first.element.element_type == Some(ElementType::Datetime)
        {
            let date = elr_common::parse_date(&first.value).ok_or_else(|| {
                MapperError::invalid(
                    self.name(),
                    &element.name,
                    format!("invalid date in {}", first.element.name),
                )
            })?;
            return Ok(Some(format_date(date)));
        }
        Ok(Some(first.value.clone()))
    }
}

/// `concat(a, b, ...)`: values joined by the element's delimiter.
pub struct ConcatenateMapper;

impl Mapper for ConcatenateMapper {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        if args.len() < 2 {
            return Err(MapperError::arity(self.name(), "two or more", args.len()));
        }
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        if values.is_empty() {
            return Ok(None);
        }
        let delimiter = element.delimiter.as_deref().unwrap_or(DEFAULT_DELIMITER);
        let parts: Vec<&str> = values.iter().map(|value| value.value.as_str()).collect();
        Ok(Some(parts.join(delimiter)))
    }
}

/// `coalesce(a, b, ...)`: the first non-empty value.
pub struct CoalesceMapper;

impl Mapper for CoalesceMapper {
    fn name(&self) -> &'static str {
        "coalesce"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            values
                .iter()
                .find(|value| !value.value.is_empty())
                .map(|value| value.value.clone())
                .unwrap_or_default(),
        ))
    }
}

pub struct TrimBlanksMapper;

impl Mapper for TrimBlanksMapper {
    fn name(&self) -> &'static str {
        "trimBlanks"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok(Some(first_value(values).unwrap_or_default().trim().to_string()))
    }
}

static NON_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\D").expect("Invalid non-digit regex"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("Invalid digit regex"));

/// `stripPhoneFormatting(phone)`: digits only, in the `number:1:` layout.
pub struct StripPhoneFormattingMapper;

impl Mapper for StripPhoneFormattingMapper {
    fn name(&self) -> &'static str {
        "stripPhoneFormatting"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok(first_value(values).map(|phone| format!("{}:1:", NON_DIGITS.replace_all(phone, ""))))
    }
}

pub struct StripNonNumericMapper;

impl Mapper for StripNonNumericMapper {
    fn name(&self) -> &'static str {
        "stripNonNumeric"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok(first_value(values).map(|value| NON_DIGITS.replace_all(value, "").trim().to_string()))
    }
}

pub struct StripNumericMapper;

impl Mapper for StripNumericMapper {
    fn name(&self) -> &'static str {
        "stripNumeric"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok(first_value(values).map(|value| DIGITS.replace_all(value, "").trim().to_string()))
    }
}

fn split_part(value: &str, delimiter: &str, index: usize) -> Option<String> {
    value.split(delimiter).nth(index).map(|part| part.trim().to_string())
}

/// `split(value, index[, delimiter])`: one part of a delimited value.
///
/// The delimiter defaults to a single space.
pub struct SplitMapper;

impl Mapper for SplitMapper {
    fn name(&self) -> &'static str {
        "split"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>> {
        within(self.name(), args, 2..=3, "2 or 3")?;
        index_arg(self.name(), &element.name, &args[1])?;
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
        let index = index_arg(self.name(), &element.name, &args[1])?;
        let delimiter = args.get(2).map_or(" ", String::as_str);
        Ok(split_part(value, delimiter, index))
    }
}

pub struct SplitByCommaMapper;

impl Mapper for SplitByCommaMapper {
    fn name(&self) -> &'static str {
        "splitByComma"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 2, "exactly 2")?;
        index_arg(self.name(), &element.name, &args[1])?;
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
        let index = index_arg(self.name(), &element.name, &args[1])?;
        Ok(split_part(value, ",", index))
    }
}

/// `none()`: never produces a value. Clears a mapper inherited from a base
/// schema.
pub struct NullMapper;

impl Mapper for NullMapper {
    fn name(&self) -> &'static str {
        "none"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 0, "no")?;
        Ok(Vec::new())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        _values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{args, values};

    #[test]
    fn middle_initial() {
        let element = Element::new("patient_middle_initial");
        let middle = Element::new("patient_middle_name");
        let ctx = MapperContext::default();
        let result = MiddleInitialMapper
            .apply(&element, &[], &values(&[(&middle, "rose")]), &ctx)
            .unwrap();
        assert_eq!(result.as_deref(), Some("R"));
        assert_eq!(MiddleInitialMapper.apply(&element, &[], &[], &ctx).unwrap(), None);
        assert!(MiddleInitialMapper.value_names(&element, &args(&["a", "b"])).is_err());
    }

    #[test]
    fn use_narrows_datetime_to_date() {
        let element = Element::new("order_test_date").with_type(ElementType::Date);
        let source = Element::new("specimen_collection_date_time").with_type(ElementType::Datetime);
        let result = UseMapper
            .apply(
                &element,
                &[],
                &values(&[(&source, "20240115093000-0500")]),
                &MapperContext::default(),
            )
            .unwrap();
        assert_eq!(result.as_deref(), Some("20240115"));
    }

    #[test]
    fn concat_uses_element_delimiter() {
        let first = Element::new("first_name");
        let last = Element::new("last_name");
        let pairs = values(&[(&first, "Ada"), (&last, "Lovelace")]);
        let ctx = MapperContext::default();
        let plain = Element::new("full_name");
        assert_eq!(
            ConcatenateMapper.apply(&plain, &[], &pairs, &ctx).unwrap().as_deref(),
            Some("Ada, Lovelace")
        );
        let mut spaced = Element::new("full_name");
        spaced.delimiter = Some(" ".into());
        assert_eq!(
            ConcatenateMapper.apply(&spaced, &[], &pairs, &ctx).unwrap().as_deref(),
            Some("Ada Lovelace")
        );
        assert!(ConcatenateMapper.value_names(&plain, &args(&["first_name"])).is_err());
    }

    #[test]
    fn phone_and_digit_stripping() {
        let element = Element::new("phone");
        let source = Element::new("raw");
        let ctx = MapperContext::default();
        let raw = values(&[(&source, "(555) 123-4567 x9")]);
        assert_eq!(
            StripPhoneFormattingMapper.apply(&element, &[], &raw, &ctx).unwrap().as_deref(),
            Some("55512345679:1:")
        );
        assert_eq!(
            StripNonNumericMapper.apply(&element, &[], &raw, &ctx).unwrap().as_deref(),
            Some("55512345679")
        );
        assert_eq!(
            StripNumericMapper.apply(&element, &[], &raw, &ctx).unwrap().as_deref(),
            Some("() - x")
        );
    }

    #[test]
    fn split_by_index() {
        let element = Element::new("patient_first_name");
        let source = Element::new("patient_name");
        let ctx = MapperContext::default();
        let name = values(&[(&source, "Doe, Jane Q")]);
        assert_eq!(
            SplitByCommaMapper
                .apply(&element, &args(&["patient_name", "1"]), &name, &ctx)
                .unwrap()
                .as_deref(),
            Some("Jane Q")
        );
        assert_eq!(
            SplitMapper
                .apply(&element, &args(&["patient_name", "2"]), &name, &ctx)
                .unwrap()
                .as_deref(),
            Some("Q")
        );
        assert_eq!(
            SplitMapper
                .apply(&element, &args(&["patient_name", "5"]), &name, &ctx)
                .unwrap(),
            None
        );
        assert!(SplitMapper.value_names(&element, &args(&["patient_name", "x"])).is_err());
    }

    #[test]
    fn coalesce_and_none() {
        let element = Element::new("x");
        let a = Element::new("a");
        let ctx = MapperContext::default();
        assert_eq!(CoalesceMapper.apply(&element, &[], &[], &ctx).unwrap(), None);
        assert_eq!(
            CoalesceMapper
                .apply(&element, &[], &values(&[(&a, "1")]), &ctx)
                .unwrap()
                .as_deref(),
            Some("1")
        );
        assert_eq!(NullMapper.apply(&element, &[], &[], &ctx).unwrap(), None);
        assert!(NullMapper.value_names(&element, &args(&["a"])).is_err());
    }
}
