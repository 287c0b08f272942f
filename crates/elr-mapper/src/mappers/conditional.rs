use std::cmp::Ordering;

use elr_common::{is_blank, parse_f64};
use elr_model::Element;

use super::{exactly, first_value, within};
use crate::definition::{ElementAndValue, Mapper, MapperContext, value_of};
use crate::error::{MapperError, Result};

/// `ifThenElse(op, left, right, then, else)`.
///
/// Every argument after the operator is the value of the dependency of
/// that name when one was fetched, otherwise the literal text. A
/// misspelled element name therefore reads as a literal.
pub struct IfThenElseMapper;

impl IfThenElseMapper {
    fn compare(&self, element: &Element, op: &str, left: &str, right: &str) -> Result<bool> {
        let ordering = match (parse_f64(left), parse_f64(right)) {
            (Some(left), Some(right)) => left.partial_cmp(&right),
            (None, None) => Some(left.cmp(right)),
            (Some(_), None) => {
                return Err(MapperError::invalid(
                    self.name(),
                    &element.name,
                    format!("{right:?} is not numeric"),
                ));
            }
            (None, Some(_)) => {
                return Err(MapperError::invalid(
                    self.name(),
                    &element.name,
                    format!("{left:?} is not numeric"),
                ));
            }
        };
        let Some(ordering) = ordering else {
            return Ok(op == "!=");
        };
        match op {
            "==" => Ok(ordering == Ordering::Equal),
            "!=" => Ok(ordering != Ordering::Equal),
            ">=" => Ok(ordering != Ordering::Less),
            "<=" => Ok(ordering != Ordering::Greater),
            "<" => Ok(ordering == Ordering::Less),
            ">" => Ok(ordering == Ordering::Greater),
            other => Err(MapperError::invalid(
                self.name(),
                &element.name,
                format!("unknown operator {other:?}"),
            )),
        }
    }
}

impl Mapper for IfThenElseMapper {
    fn name(&self) -> &'static str {
        "ifThenElse"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 5, "exactly 5")?;
        if !matches!(args[0].as_str(), "==" | "!=" | ">=" | "<=" | "<" | ">") {
            return Err(MapperError::invalid(
                self.name(),
                &element.name,
                format!("unknown operator {:?}", args[0]),
            ));
        }
        Ok(args[1..].to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        exactly(self.name(), args, 5, "exactly 5")?;
        let decode = |arg: &str| value_of(values, arg).unwrap_or(arg).to_string();
        let chosen = if self.compare(element, &args[0], &decode(&args[1]), &decode(&args[2]))? {
            &args[3]
        } else {
            &args[4]
        };
        Ok(Some(decode(chosen)))
    }
}

/// `ifPresent(element, value)`: `value` when `element` has a value.
pub struct IfPresentMapper;

impl Mapper for IfPresentMapper {
    fn name(&self) -> &'static str {
        "ifPresent"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 2, "exactly 2")?;
        Ok(vec![args[0].clone()])
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        Ok((values.len() == 1).then(|| args[1].clone()))
    }
}

const MODE_PREFIX: &str = "$mode:";
const STRING_PREFIX: &str = "$string:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotPresentMode {
    Literal,
    Lookup,
}

/// `ifNotPresent($mode:literal|lookup, operand, cond1, cond2, ...)`.
///
/// When every condition element is blank, yields the operand itself in
/// literal mode or the value of the operand element in lookup mode.
///
/// ```text
/// ifNotPresent($mode:literal, $string:NO ADDRESS, patient_zip_code, patient_state)
/// ifNotPresent($mode:lookup, ordering_provider_city, patient_zip_code)
/// ```
pub struct IfNotPresentMapper;

impl IfNotPresentMapper {
    fn mode(&self, element: &Element, arg: &str) -> Result<NotPresentMode> {
        match arg.strip_prefix(MODE_PREFIX).unwrap_or(arg) {
            "literal" => Ok(NotPresentMode::Literal),
            "lookup" => Ok(NotPresentMode::Lookup),
            other => Err(MapperError::invalid(
                self.name(),
                &element.name,
                format!("unknown mode {other:?}"),
            )),
        }
    }

    fn operand(arg: &str) -> &str {
        arg.strip_prefix(STRING_PREFIX).unwrap_or(arg)
    }
}

impl Mapper for IfNotPresentMapper {
    fn name(&self) -> &'static str {
        "ifNotPresent"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>> {
        if args.len() < 2 {
            return Err(MapperError::arity(
                self.name(),
                "a mode, an operand and conditions",
                args.len(),
            ));
        }
        let mut names = Vec::with_capacity(args.len() - 1);
        if self.mode(element, &args[0])? == NotPresentMode::Lookup {
            names.push(Self::operand(&args[1]).to_string());
        }
        names.extend(args[2..].iter().cloned());
        Ok(names)
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let mode = self.mode(element, &args[0])?;
        let present = args[2..]
            .iter()
            .any(|condition| value_of(values, condition).is_some_and(|value| !is_blank(value)));
        if present {
            return Ok(None);
        }
        let operand = Self::operand(&args[1]);
        Ok(match mode {
            NotPresentMode::Literal => Some(operand.to_string()),
            NotPresentMode::Lookup => value_of(values, operand).map(str::to_string),
        })
    }
}

/// Card issuer prefix CMS prepends before the Luhn check of an NPI.
const NPI_PREFIX: &str = "80840";
const NPI_LENGTH: usize = 10;

/// Whether `value` is a well-formed National Provider Identifier.
pub(crate) fn is_valid_npi(value: &str) -> bool {
    let value = value.trim();
    if value.len() != NPI_LENGTH || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return false;
    }
    let sum: u32 = NPI_PREFIX
        .bytes()
        .chain(value.bytes())
        .rev()
        .enumerate()
        .map(|(position, byte)| {
            let digit = u32::from(byte - b'0');
            if position % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}

/// `ifNPI(element, yes[, no])`: `yes` when `element` holds a valid NPI.
pub struct IfNpiMapper;

impl Mapper for IfNpiMapper {
    fn name(&self) -> &'static str {
        "ifNPI"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        within(self.name(), args, 2..=3, "2 or 3")?;
        Ok(vec![args[0].clone()])
    }

    fn apply(
        &self,
        _element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let Some(candidate) = first_value(values) else {
            return Ok(None);
        };
        if is_valid_npi(candidate) {
            Ok(Some(args[1].clone()))
        } else {
            Ok(args.get(2).cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{args, values};

    #[test]
    fn if_then_else_decodes_elements_and_literals() {
        let element = Element::new("source_state");
        let flag = Element::new("otc_flag");
        let patient = Element::new("patient_state");
        let provider = Element::new("ordering_provider_state");
        let row = values(&[(&flag, "OTC"), (&patient, "AZ"), (&provider, "CA")]);
        let call = args(&["==", "otc_flag", "OTC", "patient_state", "ordering_provider_state"]);
        let ctx = MapperContext::default();
        assert_eq!(
            IfThenElseMapper.apply(&element, &call, &row, &ctx).unwrap().as_deref(),
            Some("AZ")
        );
        let row = values(&[(&flag, "RX"), (&patient, "AZ"), (&provider, "CA")]);
        assert_eq!(
            IfThenElseMapper.apply(&element, &call, &row, &ctx).unwrap().as_deref(),
            Some("CA")
        );
    }

    #[test]
    fn if_then_else_compares_numbers_numerically() {
        let element = Element::new("band");
        let age = Element::new("patient_age");
        let ctx = MapperContext::default();
        let call = args(&[">=", "patient_age", "18", "adult", "minor"]);
        let row = values(&[(&age, "9")]);
        assert_eq!(
            IfThenElseMapper.apply(&element, &call, &row, &ctx).unwrap().as_deref(),
            Some("minor")
        );
        let row = values(&[(&age, "nine")]);
        assert!(IfThenElseMapper.apply(&element, &call, &row, &ctx).is_err());
        assert!(
            IfThenElseMapper
                .value_names(&element, &args(&["=~", "a", "b", "c", "d"]))
                .is_err()
        );
    }

    #[test]
    fn if_not_present_modes() {
        let element = Element::new("patient_street");
        let zip = Element::new("patient_zip_code");
        let city = Element::new("ordering_provider_city");
        let ctx = MapperContext::default();
        let literal = args(&[
            "$mode:literal",
            "$string:NO ADDRESS",
            "patient_zip_code",
            "patient_state",
        ]);
        assert_eq!(
            IfNotPresentMapper
                .value_names(&element, &literal)
                .unwrap(),
            ["patient_zip_code", "patient_state"]
        );
        assert_eq!(
            IfNotPresentMapper.apply(&element, &literal, &[], &ctx).unwrap().as_deref(),
            Some("NO ADDRESS")
        );
        assert_eq!(
            IfNotPresentMapper
                .apply(&element, &literal, &values(&[(&zip, "85701")]), &ctx)
                .unwrap(),
            None
        );
        let lookup = args(&["$mode:lookup", "ordering_provider_city", "patient_zip_code"]);
        assert_eq!(
            IfNotPresentMapper
                .value_names(&element, &lookup)
                .unwrap(),
            ["ordering_provider_city", "patient_zip_code"]
        );
        assert_eq!(
            IfNotPresentMapper
                .apply(&element, &lookup, &values(&[(&city, "Tucson")]), &ctx)
                .unwrap()
                .as_deref(),
            Some("Tucson")
        );
        assert!(IfNotPresentMapper.value_names(&element, &args(&["$mode:guess", "x"])).is_err());
    }

    #[test]
    fn npi_check_digit() {
        assert!(is_valid_npi("1234567893"));
        assert!(!is_valid_npi("1234567890"));
        assert!(!is_valid_npi("123456789"));
        assert!(!is_valid_npi("12345678AB"));

        let element = Element::new("ordering_provider_id_authority_type");
        let id = Element::new("ordering_provider_id");
        let ctx = MapperContext::default();
        let call = args(&["ordering_provider_id", "NPI", "U"]);
        assert_eq!(
            IfNpiMapper
                .apply(&element, &call, &values(&[(&id, "1234567893")]), &ctx)
                .unwrap()
                .as_deref(),
            Some("NPI")
        );
        assert_eq!(
            IfNpiMapper
                .apply(&element, &call, &values(&[(&id, "42")]), &ctx)
                .unwrap()
                .as_deref(),
            Some("U")
        );
    }

    #[test]
    fn if_present() {
        let element = Element::new("x");
        let dep = Element::new("a");
        let call = args(&["a", "yes"]);
        let ctx = MapperContext::default();
        assert_eq!(
            IfPresentMapper
                .apply(&element, &call, &values(&[(&dep, "1")]), &ctx)
                .unwrap()
                .as_deref(),
            Some("yes")
        );
        assert_eq!(IfPresentMapper.apply(&element, &call, &[], &ctx).unwrap(), None);
    }
}
