use std::sync::LazyLock;

use elr_model::Element;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::{exactly, first_value};
use crate::definition::{ElementAndValue, Mapper, MapperContext, value_of};
use crate::error::{MapperError, Result};

/// Forward sortation area plus local delivery unit, e.g. `H0H 0H0`.
static CANADIAN_POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[A-Z][0-9][A-Z]\s?[0-9][A-Z][0-9]$").expect("Invalid postal code regex")
});

const USA: &str = "USA";
const CANADA: &str = "CAN";

/// `countryMapper(country, postal_code)`: keeps a reported country,
/// otherwise infers `CAN` from a Canadian postal code and `USA` from
/// anything else.
pub struct CountryMapper;

impl Mapper for CountryMapper {
    fn name(&self) -> &'static str {
        "countryMapper"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        if args.is_empty() {
            return Err(MapperError::arity(self.name(), "one or more", 0));
        }
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        if let Some(country) = value_of(values, &element.name) {
            return Ok(Some(country.to_string()));
        }
        let canadian = args
            .iter()
            .filter(|arg| !arg.eq_ignore_ascii_case(&element.name))
            .filter_map(|arg| value_of(values, arg))
            .any(|postal_code| CANADIAN_POSTAL_CODE.is_match(postal_code.trim()));
        Ok(Some(if canadian { CANADA } else { USA }.to_string()))
    }
}

/// `hash(a, b, ...)`: lowercase hex SHA-256 of the concatenated values.
pub struct HashMapper;

impl Mapper for HashMapper {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        if args.is_empty() {
            return Err(MapperError::arity(self.name(), "one or more", 0));
        }
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let concatenation: String = values.iter().map(|value| value.value.as_str()).collect();
        if concatenation.is_empty() {
            return Ok(None);
        }
        Ok(Some(hex::encode(Sha256::digest(concatenation.as_bytes()))))
    }
}

/// SNOMED CT result codes reported as abnormal.
const ABNORMAL_RESULTS: &[&str] = &[
    "260373001",
    "720735008",
    "10828004",
    "462371000124108",
    "840539006",
    "840544004",
    "840546002",
    "840533007",
    "840536004",
    "840535000",
    "840534001",
];

/// SNOMED CT result codes reported as normal.
const NORMAL_RESULTS: &[&str] = &[
    "260415000",
    "42425007",
    "260385009",
    "895231008",
    "419984006",
    "125154007",
    "455371000124106",
    "373121007",
    "82334004",
];

const TEST_RESULT: &str = "test_result";

/// `obx8()`: HL7 abnormal flag (`A` or `N`) for the row's `test_result`.
pub struct Obx8Mapper;

impl Mapper for Obx8Mapper {
    fn name(&self) -> &'static str {
        "obx8"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 0, "no")?;
        Ok(vec![TEST_RESULT.to_string()])
    }

    fn apply(
        &self,
        _element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        _ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let flag = first_value(values).map(str::trim).and_then(|code| {
            if ABNORMAL_RESULTS.contains(&code) {
                Some("A")
            } else if NORMAL_RESULTS.contains(&code) {
                Some("N")
            } else {
                None
            }
        });
        Ok(flag.map(str::to_string))
    }
}
