//! Organizations, their receivers, and delivery configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::error::{ModelError, Result};
use crate::ids::Topic;

/// The four stages at which a receiver selects rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    Jurisdictional,
    Quality,
    Routing,
    ProcessingMode,
}

impl FilterType {
    pub const ALL: [FilterType; 4] = [
        FilterType::Jurisdictional,
        FilterType::Quality,
        FilterType::Routing,
        FilterType::ProcessingMode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterType::Jurisdictional => "jurisdictional",
            FilterType::Quality => "quality",
            FilterType::Routing => "routing",
            FilterType::ProcessingMode => "processing_mode",
        }
    }
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter lists for each [`FilterType`], as textual calls.
///
/// At organization level `topic` restricts the lists to receivers of that
/// topic; `None` applies them to every receiver of the organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    #[serde(default)]
    pub jurisdictional_filter: Vec<String>,
    #[serde(default)]
    pub quality_filter: Vec<String>,
    #[serde(default)]
    pub routing_filter: Vec<String>,
    #[serde(default)]
    pub processing_mode_filter: Vec<String>,
}

impl ReportFilters {
    pub fn get(&self, kind: FilterType) -> &[String] {
        match kind {
            FilterType::Jurisdictional => &self.jurisdictional_filter,
            FilterType::Quality => &self.quality_filter,
            FilterType::Routing => &self.routing_filter,
            FilterType::ProcessingMode => &self.processing_mode_filter,
        }
    }

    pub fn applies_to(&self, topic: &Topic) -> bool {
        self.topic.as_ref().is_none_or(|own| own == topic)
    }
}

/// Onboarding state of a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    #[default]
    Inactive,
    Testing,
    Active,
}

/// Wire encoding a receiver expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Format {
    #[default]
    Csv,
    Hl7,
    Hl7Batch,
    Fhir,
    Redox,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "CSV",
            Format::Hl7 => "HL7",
            Format::Hl7Batch => "HL7_BATCH",
            Format::Fhir => "FHIR",
            Format::Redox => "REDOX",
        }
    }
}

/// How a receiver's reports are serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TranslatorConfig {
    Custom {
        schema_name: String,
        #[serde(default)]
        format: Format,
        #[serde(default)]
        default_values: BTreeMap<String, String>,
    },
    Hl7 {
        schema_name: String,
        #[serde(default)]
        use_batch_headers: bool,
        #[serde(default)]
        receiving_application_name: Option<String>,
        #[serde(default)]
        receiving_facility_name: Option<String>,
        #[serde(default)]
        default_values: BTreeMap<String, String>,
    },
    Fhir {
        schema_name: String,
    },
    Redox {
        schema_name: String,
        destination_id: String,
        destination_name: String,
        #[serde(default)]
        default_values: BTreeMap<String, String>,
    },
}

impl TranslatorConfig {
    pub fn schema_name(&self) -> &str {
        match self {
            TranslatorConfig::Custom { schema_name, .. }
            | TranslatorConfig::Hl7 { schema_name, .. }
            | TranslatorConfig::Fhir { schema_name }
            | TranslatorConfig::Redox { schema_name, .. } => schema_name,
        }
    }

    pub fn format(&self) -> Format {
        match self {
            TranslatorConfig::Custom { format, .. } => *format,
            TranslatorConfig::Hl7 {
                use_batch_headers, ..
            } => {
                if *use_batch_headers {
                    Format::Hl7Batch
                } else {
                    Format::Hl7
                }
            }
            TranslatorConfig::Fhir { .. } => Format::Fhir,
            TranslatorConfig::Redox { .. } => Format::Redox,
        }
    }

    /// Receiver-level element defaults applied during schema mapping.
    pub fn default_values(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            TranslatorConfig::Custom { default_values, .. }
            | TranslatorConfig::Hl7 { default_values, .. }
            | TranslatorConfig::Redox { default_values, .. } => Some(default_values),
            TranslatorConfig::Fhir { .. } => None,
        }
    }
}

/// Where a receiver's reports are delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportConfig {
    Sftp {
        host: String,
        #[serde(default = "default_sftp_port")]
        port: u16,
        file_path: String,
        #[serde(default)]
        credential_name: Option<String>,
    },
    Blob {
        storage_name: String,
        container_name: String,
    },
    As2 {
        receiver_url: String,
        receiver_id: String,
        sender_id: String,
        #[serde(default)]
        sender_email: Option<String>,
    },
    Soap {
        endpoint: String,
        soap_action: String,
    },
    Email {
        addresses: Vec<String>,
        from: String,
    },
    Null,
}

fn default_sftp_port() -> u16 {
    22
}

impl TransportConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            TransportConfig::Sftp { .. } => "SFTP",
            TransportConfig::Blob { .. } => "BLOB",
            TransportConfig::As2 { .. } => "AS2",
            TransportConfig::Soap { .. } => "SOAP",
            TransportConfig::Email { .. } => "EMAIL",
            TransportConfig::Null => "NULL",
        }
    }

    /// Operator-facing destination address.
    pub fn describe(&self) -> String {
        match self {
            TransportConfig::Sftp {
                host,
                port,
                file_path,
                ..
            } => format!("sftp://{host}:{port}/{}", file_path.trim_start_matches('/')),
            TransportConfig::Blob {
                storage_name,
                container_name,
            } => format!("blob:{storage_name}/{container_name}"),
            TransportConfig::As2 { receiver_url, .. } => receiver_url.clone(),
            TransportConfig::Soap { endpoint, .. } => endpoint.clone(),
            TransportConfig::Email { addresses, .. } => addresses.join(", "),
            TransportConfig::Null => "(discarded)".to_string(),
        }
    }
}

/// A downstream recipient of reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    /// Filled in from the owning organization when loaded.
    #[serde(default)]
    pub organization_name: String,
    pub topic: Topic,
    #[serde(default)]
    pub customer_status: CustomerStatus,
    pub translation: TranslatorConfig,
    #[serde(default)]
    pub jurisdictional_filter: Vec<String>,
    #[serde(default)]
    pub quality_filter: Vec<String>,
    #[serde(default)]
    pub routing_filter: Vec<String>,
    #[serde(default)]
    pub processing_mode_filter: Vec<String>,
    /// Keep exactly the rows the quality filter would remove.
    #[serde(default)]
    pub reverse_the_quality_filter: bool,
    #[serde(default)]
    pub deidentify: bool,
    #[serde(default)]
    pub timing: Option<Batch>,
    #[serde(default)]
    pub transport: Option<TransportConfig>,
    #[serde(default)]
    pub description: String,
}

impl Receiver {
    pub fn new(
        organization_name: impl Into<String>,
        name: impl Into<String>,
        topic: Topic,
        translation: TranslatorConfig,
    ) -> Self {
        Self {
            name: name.into(),
            organization_name: organization_name.into(),
            topic,
            customer_status: CustomerStatus::Active,
            translation,
            jurisdictional_filter: Vec::new(),
            quality_filter: Vec::new(),
            routing_filter: Vec::new(),
            processing_mode_filter: Vec::new(),
            reverse_the_quality_filter: false,
            deidentify: false,
            timing: None,
            transport: None,
            description: String::new(),
        }
    }

    /// `organization.receiver`, the receiver's address within a catalog.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.organization_name, self.name)
    }

    pub fn schema_name(&self) -> &str {
        self.translation.schema_name()
    }

    pub fn format(&self) -> Format {
        self.translation.format()
    }

    pub fn filters(&self, kind: FilterType) -> &[String] {
        match kind {
            FilterType::Jurisdictional => &self.jurisdictional_filter,
            FilterType::Quality => &self.quality_filter,
            FilterType::Routing => &self.routing_filter,
            FilterType::ProcessingMode => &self.processing_mode_filter,
        }
    }

    pub fn is_active(&self) -> bool {
        self.customer_status != CustomerStatus::Inactive
    }

    pub fn with_filter(mut self, kind: FilterType, filters: &[&str]) -> Self {
        let list = filters.iter().map(|filter| (*filter).to_string()).collect();
        match kind {
            FilterType::Jurisdictional => self.jurisdictional_filter = list,
            FilterType::Quality => self.quality_filter = list,
            FilterType::Routing => self.routing_filter = list,
            FilterType::ProcessingMode => self.processing_mode_filter = list,
        }
        self
    }

    pub fn with_status(mut self, status: CustomerStatus) -> Self {
        self.customer_status = status;
        self
    }

    pub fn with_deidentify(mut self, deidentify: bool) -> Self {
        self.deidentify = deidentify;
        self
    }

    pub fn with_timing(mut self, timing: Batch) -> Self {
        self.timing = Some(timing);
        self
    }
}

/// Public-health authority level an organization reports for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "jurisdiction", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Jurisdiction {
    Federal,
    State {
        state_code: String,
    },
    County {
        state_code: String,
        county_name: String,
    },
}

impl Jurisdiction {
    pub fn state_code(&self) -> Option<&str> {
        match self {
            Jurisdiction::Federal => None,
            Jurisdiction::State { state_code } | Jurisdiction::County { state_code, .. } => {
                Some(state_code)
            }
        }
    }

    pub fn county_name(&self) -> Option<&str> {
        match self {
            Jurisdiction::County { county_name, .. } => Some(county_name),
            _ => None,
        }
    }
}

/// A reporting authority owning one or more receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub jurisdiction: Jurisdiction,
    /// Filters prepended to every matching receiver's own lists.
    #[serde(default)]
    pub filters: Vec<ReportFilters>,
}

impl Organization {
    pub fn new(name: impl Into<String>, jurisdiction: Jurisdiction) -> Result<Self> {
        let organization = Self {
            name: name.into(),
            description: String::new(),
            jurisdiction,
            filters: Vec::new(),
        };
        organization.validate()?;
        Ok(organization)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| ModelError::InvalidJurisdiction {
            organization: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() || self.name.contains('.') {
            return Err(ModelError::invalid_name("organization name", self.name.clone()));
        }
        if let Some(state) = self.jurisdiction.state_code()
            && (state.len() != 2 || !state.chars().all(|ch| ch.is_ascii_alphabetic()))
        {
            return Err(invalid("state_code must be a two letter postal abbreviation"));
        }
        if let Some(county) = self.jurisdiction.county_name()
            && county.trim().is_empty()
        {
            return Err(invalid("county_name must not be blank"));
        }
        Ok(())
    }

    /// Organization-level filters of `kind` that apply to `topic`.
    pub fn filters_for(&self, kind: FilterType, topic: &Topic) -> Vec<String> {
        self.filters
            .iter()
            .filter(|filters| filters.applies_to(topic))
            .flat_map(|filters| filters.get(kind).iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jurisdiction_is_validated() {
        let bad_state = Organization::new(
            "az-phd",
            Jurisdiction::State {
                state_code: "Arizona".into(),
            },
        );
        assert!(bad_state.is_err());
        let blank_county = Organization::new(
            "pima",
            Jurisdiction::County {
                state_code: "AZ".into(),
                county_name: " ".into(),
            },
        );
        assert!(blank_county.is_err());
        assert!(Organization::new("cdc", Jurisdiction::Federal).is_ok());
    }

    #[test]
    fn organization_from_toml() {
        let organization: Organization = toml::from_str(
            r#"
            name = "pima-az-phd"
            jurisdiction = "COUNTY"
            state_code = "AZ"
            county_name = "Pima"

            [[filters]]
            topic = "covid-19"
            jurisdictional_filter = ["matches(ordering_facility_county, Pima)"]
            "#,
        )
        .unwrap();
        assert_eq!(organization.jurisdiction.county_name(), Some("Pima"));
        let covid = Topic::new("covid-19").unwrap();
        let other = Topic::new("flu").unwrap();
        assert_eq!(
            organization.filters_for(FilterType::Jurisdictional, &covid).len(),
            1
        );
        assert!(organization
            .filters_for(FilterType::Jurisdictional, &other)
            .is_empty());
    }

    #[test]
    fn receiver_config_from_toml() {
        let receiver: Receiver = toml::from_str(
            r#"
            name = "elr"
            topic = "COVID-19"
            customer_status = "active"
            quality_filter = ["allowAll()"]

            [translation]
            type = "HL7"
            schema_name = "covid-19"
            use_batch_headers = true

            [transport]
            type = "SFTP"
            host = "sftp.example.org"
            file_path = "./upload"
            "#,
        )
        .unwrap();
        assert_eq!(receiver.topic.as_str(), "covid-19");
        assert_eq!(receiver.format(), Format::Hl7Batch);
        assert_eq!(receiver.filters(FilterType::Quality), ["allowAll()"]);
        assert_eq!(
            receiver.transport.as_ref().map(TransportConfig::describe).as_deref(),
            Some("sftp://sftp.example.org:22/./upload")
        );
    }
}
