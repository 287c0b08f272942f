//! Coded vocabularies with code and display lookups.

use serde::{Deserialize, Serialize};

/// Coding system a value set draws its codes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetSystem {
    Hl7,
    SnomedCt,
    Loinc,
    #[default]
    Local,
    Fhir,
    Iso,
    Ucum,
    Nullfl,
}

impl SetSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetSystem::Hl7 => "HL7",
            SetSystem::SnomedCt => "SNOMED_CT",
            SetSystem::Loinc => "LOINC",
            SetSystem::Local => "LOCAL",
            SetSystem::Fhir => "FHIR",
            SetSystem::Iso => "ISO",
            SetSystem::Ucum => "UCUM",
            SetSystem::Nullfl => "NULLFL",
        }
    }
}

/// One entry of a value set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSetValue {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Legacy code this entry supersedes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaces: Option<String>,
}

impl ValueSetValue {
    pub fn new(code: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display: Some(display.into()),
            version: None,
            replaces: None,
        }
    }
}

/// A named, ordered list of coded values.
///
/// All lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueSet {
    pub name: String,
    #[serde(default)]
    pub system: SetSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_url: Option<String>,
    #[serde(default)]
    pub values: Vec<ValueSetValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ValueSet {
    pub fn new(name: impl Into<String>, system: SetSystem, values: Vec<ValueSetValue>) -> Self {
        Self {
            name: name.into(),
            system,
            reference: None,
            reference_url: None,
            values,
            version: None,
        }
    }

    fn find_code(&self, code: &str) -> Option<&ValueSetValue> {
        let code = code.trim();
        self.values
            .iter()
            .find(|value| value.code.eq_ignore_ascii_case(code))
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.find_code(code).is_some()
    }

    pub fn to_display_from_code(&self, code: &str) -> Option<&str> {
        self.find_code(code).and_then(|value| value.display.as_deref())
    }

    pub fn to_code_from_display(&self, display: &str) -> Option<&str> {
        let display = display.trim();
        self.values
            .iter()
            .find(|value| {
                value
                    .display
                    .as_deref()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(display))
            })
            .map(|value| value.code.as_str())
    }

    /// Canonical code for `code`, following `replaces` links for legacy codes.
    pub fn to_normalized_code(&self, code: &str) -> Option<&str> {
        if let Some(value) = self.find_code(code) {
            return Some(value.code.as_str());
        }
        let code = code.trim();
        self.values
            .iter()
            .find(|value| {
                value
                    .replaces
                    .as_deref()
                    .is_some_and(|legacy| legacy.eq_ignore_ascii_case(code))
            })
            .map(|value| value.code.as_str())
    }

    /// Overlays element-specific values: entries with a matching code are
    /// replaced in place, new codes are appended.
    #[must_use]
    pub fn merge_alt_values(&self, alt_values: &[ValueSetValue]) -> ValueSet {
        let mut merged = self.clone();
        for alt in alt_values {
            match merged
                .values
                .iter_mut()
                .find(|value| value.code.eq_ignore_ascii_case(&alt.code))
            {
                Some(existing) => *existing = alt.clone(),
                None => merged.values.push(alt.clone()),
            }
        }
        merged
    }
}
