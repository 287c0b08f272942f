//! Schema elements: one logical field, independent of wire format.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::error::Result;
use crate::value_set::{ValueSet, ValueSetValue};

/// Logical type of an element's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Text,
    TextOrBlank,
    Number,
    Date,
    Datetime,
    Duration,
    Code,
    Table,
    TableOrBlank,
    Blank,
    /// HL7 hierarchic designator.
    Hd,
    /// HL7 entity identifier.
    Ei,
    Id,
    IdClia,
    IdDln,
    IdSsn,
    IdNpi,
    Street,
    StreetOrBlank,
    City,
    State,
    County,
    PostalCode,
    PersonName,
    Telephone,
    Email,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Text => "TEXT",
            ElementType::TextOrBlank => "TEXT_OR_BLANK",
            ElementType::Number => "NUMBER",
            ElementType::Date => "DATE",
            ElementType::Datetime => "DATETIME",
            ElementType::Duration => "DURATION",
            ElementType::Code => "CODE",
            ElementType::Table => "TABLE",
            ElementType::TableOrBlank => "TABLE_OR_BLANK",
            ElementType::Blank => "BLANK",
            ElementType::Hd => "HD",
            ElementType::Ei => "EI",
            ElementType::Id => "ID",
            ElementType::IdClia => "ID_CLIA",
            ElementType::IdDln => "ID_DLN",
            ElementType::IdSsn => "ID_SSN",
            ElementType::IdNpi => "ID_NPI",
            ElementType::Street => "STREET",
            ElementType::StreetOrBlank => "STREET_OR_BLANK",
            ElementType::City => "CITY",
            ElementType::State => "STATE",
            ElementType::County => "COUNTY",
            ElementType::PostalCode => "POSTAL_CODE",
            ElementType::PersonName => "PERSON_NAME",
            ElementType::Telephone => "TELEPHONE",
            ElementType::Email => "EMAIL",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase().replace('-', "_");
        let parsed = match normalized.as_str() {
            "TEXT" => ElementType::Text,
            "TEXT_OR_BLANK" => ElementType::TextOrBlank,
            "NUMBER" => ElementType::Number,
            "DATE" => ElementType::Date,
            "DATETIME" => ElementType::Datetime,
            "DURATION" => ElementType::Duration,
            "CODE" => ElementType::Code,
            "TABLE" => ElementType::Table,
            "TABLE_OR_BLANK" => ElementType::TableOrBlank,
            "BLANK" => ElementType::Blank,
            "HD" => ElementType::Hd,
            "EI" => ElementType::Ei,
            "ID" => ElementType::Id,
            "ID_CLIA" => ElementType::IdClia,
            "ID_DLN" => ElementType::IdDln,
            "ID_SSN" => ElementType::IdSsn,
            "ID_NPI" => ElementType::IdNpi,
            "STREET" => ElementType::Street,
            "STREET_OR_BLANK" => ElementType::StreetOrBlank,
            "CITY" => ElementType::City,
            "STATE" => ElementType::State,
            "COUNTY" => ElementType::County,
            "POSTAL_CODE" => ElementType::PostalCode,
            "PERSON_NAME" => ElementType::PersonName,
            "TELEPHONE" => ElementType::Telephone,
            "EMAIL" => ElementType::Email,
            _ => return Err(format!("Unknown element type: {s}")),
        };
        Ok(parsed)
    }
}

/// How many values an element carries per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    #[default]
    ZeroOrOne,
    One,
}

/// A CSV column an element is read from or written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// One logical field of a schema.
///
/// Every attribute except `name` is optional so that an element can extend
/// a same-named element of a base schema and inherit whatever it leaves
/// unset (see [`Element::inherit_from`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub element_type: Option<ElementType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_values: Option<Vec<ValueSetValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapper: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_fields: Option<Vec<CsvField>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hl7_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pii: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phi: Option<bool>,
    /// Separator used by joining mappers such as `concat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
    /// Evaluate the mapper even when a value was copied from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapper_overrides_value: Option<bool>,
    /// Use the default even when a value was copied from the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_overrides_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Value set resolved by the catalog, with `alt_values` merged in.
    #[serde(skip)]
    pub value_set_ref: Option<Arc<ValueSet>>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element_type: None,
            value_set: None,
            alt_values: None,
            table: None,
            table_column: None,
            mapper: None,
            default: None,
            cardinality: None,
            csv_fields: None,
            hl7_field: None,
            pii: None,
            phi: None,
            delimiter: None,
            mapper_overrides_value: None,
            default_overrides_value: None,
            documentation: None,
            value_set_ref: None,
        }
    }

    pub fn with_type(mut self, element_type: ElementType) -> Self {
        self.element_type = Some(element_type);
        self
    }

    pub fn with_mapper(mut self, mapper: impl Into<String>) -> Self {
        self.mapper = Some(mapper.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_value_set(mut self, value_set: impl Into<String>) -> Self {
        self.value_set = Some(value_set.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self.table_column = Some(column.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.cardinality = Some(Cardinality::One);
        self
    }

    pub fn pii(mut self) -> Self {
        self.pii = Some(true);
        self
    }

    /// Fills every unset attribute from `base`.
    #[must_use]
    pub fn inherit_from(&self, base: &Element) -> Element {
        fn pick<T: Clone>(own: &Option<T>, base: &Option<T>) -> Option<T> {
            own.clone().or_else(|| base.clone())
        }
        Element {
            name: self.name.clone(),
            element_type: self.element_type.or(base.element_type),
            value_set: pick(&self.value_set, &base.value_set),
            alt_values: pick(&self.alt_values, &base.alt_values),
            table: pick(&self.table, &base.table),
            table_column: pick(&self.table_column, &base.table_column),
            mapper: pick(&self.mapper, &base.mapper),
            default: pick(&self.default, &base.default),
            cardinality: self.cardinality.or(base.cardinality),
            csv_fields: pick(&self.csv_fields, &base.csv_fields),
            hl7_field: pick(&self.hl7_field, &base.hl7_field),
            pii: self.pii.or(base.pii),
            phi: self.phi.or(base.phi),
            delimiter: pick(&self.delimiter, &base.delimiter),
            mapper_overrides_value: self.mapper_overrides_value.or(base.mapper_overrides_value),
            default_overrides_value: self
                .default_overrides_value
                .or(base.default_overrides_value),
            documentation: pick(&self.documentation, &base.documentation),
            value_set_ref: pick(&self.value_set_ref, &base.value_set_ref),
        }
    }

    pub fn is_required(&self) -> bool {
        self.cardinality == Some(Cardinality::One)
    }

    pub fn is_pii(&self) -> bool {
        self.pii.unwrap_or(false)
    }

    pub fn is_phi(&self) -> bool {
        self.phi.unwrap_or(false)
    }

    /// Non-blank static default.
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref().filter(|value| !value.trim().is_empty())
    }

    /// Parsed `mapper` call, if the element declares one.
    pub fn mapper_call(&self) -> Result<Option<Call>> {
        self.mapper
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .map(Call::parse)
            .transpose()
    }

    pub fn mapper_overrides_value(&self) -> bool {
        self.mapper_overrides_value.unwrap_or(false)
    }

    pub fn default_overrides_value(&self) -> bool {
        self.default_overrides_value.unwrap_or(false)
    }

    /// Where the element lives on the wire, for operator-facing messages.
    pub fn field_mapping(&self) -> String {
        let csv = self
            .csv_fields
            .as_ref()
            .and_then(|fields| fields.first())
            .map(|field| field.name.as_str());
        match (csv, self.hl7_field.as_deref()) {
            (Some(csv), Some(hl7)) => format!("{} ({csv}, {hl7})", self.name),
            (Some(csv), None) => format!("{} ({csv})", self.name),
            (None, Some(hl7)) => format!("{} ({hl7})", self.name),
            (None, None) => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherit_keeps_local_attributes() {
        let base = Element::new("patient_state")
            .with_type(ElementType::State)
            .with_default("AZ")
            .required();
        let local = Element::new("patient_state").with_default("CA");
        let merged = local.inherit_from(&base);
        assert_eq!(merged.element_type, Some(ElementType::State));
        assert_eq!(merged.default.as_deref(), Some("CA"));
        assert!(merged.is_required());
    }

    #[test]
    fn blank_default_is_not_a_default() {
        let element = Element::new("x").with_default("  ");
        assert_eq!(element.default_value(), None);
    }

    #[test]
    fn element_type_parses_loosely() {
        assert_eq!("id-clia".parse::<ElementType>(), Ok(ElementType::IdClia));
        assert_eq!(ElementType::PostalCode.to_string(), "POSTAL_CODE");
        assert!("GEO".parse::<ElementType>().is_err());
    }

    #[test]
    fn mapper_call_is_parsed_on_demand() {
        let element = Element::new("full_name").with_mapper("concat(first_name, last_name)");
        let call = element.mapper_call().unwrap().unwrap();
        assert_eq!(call.name(), "concat");
        assert_eq!(call.args(), ["first_name", "last_name"]);
        assert!(Element::new("plain").mapper_call().unwrap().is_none());
    }
}
