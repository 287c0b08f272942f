use elr_model::{Element, LookupFilter};
use tracing::debug;

use super::{exactly, first_value};
use crate::definition::{ElementAndValue, Mapper, MapperContext, value_of};
use crate::error::{MapperError, Result};

const COLUMN_PREFIX: &str = "$Column:";

fn table_column<'e>(mapper: &'static str, element: &'e Element) -> Result<&'e str> {
    element
        .table_column
        .as_deref()
        .ok_or_else(|| MapperError::invalid(mapper, &element.name, "no table column"))
}

/// `lookup(element1, $Column:C1[, element2, $Column:C2])`: the element's
/// `table_column` from the single table row matching every pair.
///
/// Yields nothing unless every keyed element has a value and the matching
/// rows agree on one result.
pub struct LookupMapper;

impl LookupMapper {
    fn index_column<'a>(&self, element: &Element, arg: &'a str) -> Result<&'a str> {
        let column = arg.strip_prefix(COLUMN_PREFIX).unwrap_or(arg).trim();
        if column.is_empty() {
            return Err(MapperError::invalid(
                self.name(),
                &element.name,
                format!("no column in {arg:?}"),
            ));
        }
        Ok(column)
    }
}

impl Mapper for LookupMapper {
    fn name(&self) -> &'static str {
        "lookup"
    }

    fn value_names(&self, element: &Element, args: &[String]) -> Result<Vec<String>> {
        if !matches!(args.len(), 2 | 4) {
            return Err(MapperError::arity(self.name(), "2 or 4", args.len()));
        }
        args.chunks(2)
            .map(|pair| {
                self.index_column(element, &pair[1])?;
                Ok(pair[0].clone())
            })
            .collect()
    }

    fn apply(
        &self,
        element: &Element,
        args: &[String],
        values: &[ElementAndValue<'_>],
        ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        if values.len() * 2 != args.len() {
            return Ok(None);
        }
        let table = ctx.table_for(self.name(), element)?;
        let result_column = table_column(self.name(), element)?;
        let mut filter = table.filter();
        for pair in args.chunks(2) {
            let Some(value) = value_of(values, &pair[0]) else {
                return Ok(None);
            };
            filter = filter.equals_ignore_case(self.index_column(element, &pair[1])?, value);
        }
        Ok(filter.find_single_result(result_column))
    }
}

const ZIPCODE_COLUMN: &str = "zipcode";
const COUNTY_COLUMN: &str = "county";

/// Strips a ZIP+4 extension.
fn five_digit_zip(zip: &str) -> &str {
    zip.split('-').next().unwrap_or(zip).trim()
}

/// `zipCodeToCounty(zip)`: county of a ZIP code from the element's table.
pub struct ZipCodeToCountyMapper;

impl Mapper for ZipCodeToCountyMapper {
    fn name(&self) -> &'static str {
        "zipCodeToCounty"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let Some(zip) = first_value(values) else {
            return Ok(None);
        };
        let table = ctx.table_for(self.name(), element)?;
        Ok(table
            .filter()
            .equals_ignore_case(ZIPCODE_COLUMN, five_digit_zip(zip))
            .find_single_result(COUNTY_COLUMN))
    }
}

/// `zipCodeToState(zip)`: the element's `table_column` for a ZIP code.
pub struct ZipCodeToStateMapper;

impl Mapper for ZipCodeToStateMapper {
    fn name(&self) -> &'static str {
        "zipCodeToState"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 1, "exactly 1")?;
        Ok(args.to_vec())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let Some(zip) = first_value(values) else {
            return Ok(None);
        };
        let table = ctx.table_for(self.name(), element)?;
        let column = table_column(self.name(), element)?;
        Ok(table
            .filter()
            .equals_ignore_case(ZIPCODE_COLUMN, five_digit_zip(zip))
            .find_single_result(column))
    }
}

mod livd {
    pub const TESTKIT_NAME_ID: &str = "Testkit Name ID";
    pub const EQUIPMENT_UID: &str = "Equipment UID";
    pub const MODEL: &str = "Model";
    pub const TEST_PERFORMED_CODE: &str = "Test Performed LOINC Code";
    pub const PROCESSING_MODE_CODE: &str = "processing_mode_code";
}

const DEVICE_ID: &str = "device_id";
const EQUIPMENT_MODEL_ID: &str = "equipment_model_id";
const EQUIPMENT_MODEL_NAME: &str = "equipment_model_name";
const TEST_KIT_NAME_ID: &str = "test_kit_name_id";
const TEST_PERFORMED_CODE: &str = "test_performed_code";
const PROCESSING_MODE_CODE: &str = "processing_mode_code";

/// Model name first: device ids change as devices move from emergency use
/// to full authorization.
const LIVD_VALUE_NAMES: &[&str] = &[
    EQUIPMENT_MODEL_NAME,
    DEVICE_ID,
    EQUIPMENT_MODEL_ID,
    TEST_KIT_NAME_ID,
    TEST_PERFORMED_CODE,
    PROCESSING_MODE_CODE,
];

const ELR_99_SUFFIXES: &[&str] = &["EUA", "DII", "DIT", "DIM", "MNT", "MNI", "MNM"];
const TEST_PROCESSING_MODE: &str = "T";

/// `livdLookup()`: device metadata from a LIVD table.
///
/// Tries the model name, device id, equipment UID and test kit id in turn
/// and returns the first unambiguous `table_column` value. Rows are
/// limited to the reported LOINC code when one is present, and test
/// devices are ignored unless the row itself is test data.
pub struct LivdLookupMapper;

impl LivdLookupMapper {
    fn lookup_device_id(
        filter: &LookupFilter<'_>,
        column: &str,
        device_id: &str,
    ) -> Option<String> {
        let exact = |value: &str, table_column: &str| {
            filter
                .clone()
                .equals_ignore_case(table_column, value)
                .find_single_result(column)
        };
        if let Some((value, suffix)) = device_id.rsplit_once('_')
            && ELR_99_SUFFIXES.contains(&suffix)
        {
            return exact(value, livd::TESTKIT_NAME_ID)
                .or_else(|| exact(value, livd::EQUIPMENT_UID));
        }
        if let Some(value) = device_id.strip_suffix('#') {
            let prefix = |table_column: &str| {
                filter
                    .clone()
                    .starts_with_ignore_case(table_column, value)
                    .find_single_result(column)
            };
            return prefix(livd::TESTKIT_NAME_ID).or_else(|| prefix(livd::EQUIPMENT_UID));
        }
        exact(device_id, livd::TESTKIT_NAME_ID).or_else(|| exact(device_id, livd::EQUIPMENT_UID))
    }
}

impl Mapper for LivdLookupMapper {
    fn name(&self) -> &'static str {
        "livdLookup"
    }

    fn value_names(&self, _element: &Element, args: &[String]) -> Result<Vec<String>> {
        exactly(self.name(), args, 0, "no")?;
        Ok(LIVD_VALUE_NAMES.iter().map(|name| (*name).to_string()).collect())
    }

    fn apply(
        &self,
        element: &Element,
        _args: &[String],
        values: &[ElementAndValue<'_>],
        ctx: &MapperContext<'_>,
    ) -> Result<Option<String>> {
        let table = ctx.table_for(self.name(), element)?;
        let column = table_column(self.name(), element)?;
        let mut filter = table.filter();
        if let Some(code) = value_of(values, TEST_PERFORMED_CODE) {
            filter = filter.equals_ignore_case(livd::TEST_PERFORMED_CODE, code);
        }
        let test_data = value_of(values, PROCESSING_MODE_CODE)
            .is_some_and(|mode| mode.trim().eq_ignore_ascii_case(TEST_PROCESSING_MODE));
        if !test_data {
            filter =
                filter.not_equals_ignore_case(livd::PROCESSING_MODE_CODE, TEST_PROCESSING_MODE);
        }

        for dependency in values {
            let value = dependency.value.trim();
            if value.is_empty() {
                continue;
            }
            let name = dependency.element.name.as_str();
            let found = if name.eq_ignore_ascii_case(DEVICE_ID) {
                Self::lookup_device_id(&filter, column, value)
            } else if name.eq_ignore_ascii_case(EQUIPMENT_MODEL_ID) {
                filter
                    .clone()
                    .equals_ignore_case(livd::EQUIPMENT_UID, value)
                    .find_single_result(column)
            } else if name.eq_ignore_ascii_case(TEST_KIT_NAME_ID) {
                filter
                    .clone()
                    .equals_ignore_case(livd::TESTKIT_NAME_ID, value)
                    .find_single_result(column)
            } else if name.eq_ignore_ascii_case(EQUIPMENT_MODEL_NAME) {
                let model = value.strip_suffix('*').unwrap_or(value);
                filter
                    .clone()
                    .equals_ignore_case(livd::MODEL, model)
                    .find_single_result(column)
            } else {
                None
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        debug!(element = %element.name, "no LIVD match");
        Ok(None)
    }

    fn dependency_preference(&self) -> &'static [&'static str] {
        LIVD_VALUE_NAMES
    }
}
