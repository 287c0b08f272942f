//! Reads a catalog from a TOML manifest and CSV lookup tables.
//!
//! # Manifest layout
//!
//! ```toml
//! [[value_sets]]
//! name = "hl70136"
//! system = "HL7"
//! values = [{ code = "Y", display = "Yes" }, { code = "N", display = "No" }]
//!
//! [[schemas]]
//! name = "covid-19"
//! topic = "covid-19"
//!
//! [[schemas.elements]]
//! name = "patient_state"
//! cardinality = "ONE"
//!
//! [[lookup_tables]]
//! name = "LIVD-SARS-CoV-2"
//! path = "tables/livd.csv"   # relative to the manifest
//!
//! [[organizations]]
//! name = "az-phd"
//! jurisdiction = "STATE"
//! state_code = "AZ"
//!
//! [[organizations.receivers]]
//! name = "elr"
//! topic = "covid-19"
//! customer_status = "active"
//! jurisdictional_filter = ["matches(patient_state, AZ)"]
//! translation = { type = "CUSTOM", schema_name = "az/az-covid-19", format = "CSV" }
//! ```

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use elr_model::{
    Element, Jurisdiction, LookupTable, Organization, Receiver, ReportFilters, Schema, Topic,
    ValueSet,
};
use serde::Deserialize;
use tracing::debug;

use crate::builder::CatalogBuilder;
use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};

/// Top-level manifest document.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogManifest {
    #[serde(default)]
    pub value_sets: Vec<ValueSet>,
    #[serde(default)]
    pub schemas: Vec<SchemaEntry>,
    #[serde(default)]
    pub lookup_tables: Vec<LookupTableEntry>,
    #[serde(default)]
    pub organizations: Vec<OrganizationEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SchemaEntry {
    pub name: String,
    pub topic: Topic,
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub based_on: Option<String>,
    #[serde(default)]
    pub tracking_element: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl SchemaEntry {
    fn into_schema(self) -> Result<Schema> {
        let mut schema =
            Schema::new(self.name.clone(), self.topic, self.elements).map_err(|source| {
                CatalogError::Schema {
                    schema: self.name,
                    source,
                }
            })?;
        if let Some(extends) = self.extends {
            schema = schema.with_extends(extends);
        }
        if let Some(based_on) = self.based_on {
            schema = schema.with_based_on(based_on);
        }
        if let Some(tracking_element) = self.tracking_element {
            schema = schema.with_tracking_element(tracking_element);
        }
        if let Some(description) = self.description {
            schema = schema.with_description(description);
        }
        Ok(schema)
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupTableEntry {
    pub name: String,
    /// CSV file, relative to the manifest's directory.
    pub path: PathBuf,
}

/// An organization with its receivers nested beneath it.
#[derive(Debug, Deserialize)]
pub struct OrganizationEntry {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub filters: Vec<ReportFilters>,
    #[serde(default)]
    pub receivers: Vec<Receiver>,
}

impl OrganizationEntry {
    fn split(self) -> (Organization, Vec<Receiver>) {
        let receivers = self
            .receivers
            .into_iter()
            .map(|mut receiver| {
                receiver.organization_name = self.name.clone();
                receiver
            })
            .collect();
        let organization = Organization {
            name: self.name,
            description: self.description,
            jurisdiction: self.jurisdiction,
            filters: self.filters,
        };
        (organization, receivers)
    }
}

/// Parses a manifest document; `path` is only used in error messages.
pub fn parse_manifest(content: &str, path: &Path) -> Result<CatalogManifest> {
    toml::from_str(content).map_err(|source| CatalogError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the manifest at `path` and every lookup table it references.
///
/// The returned builder has not been validated; call
/// [`CatalogBuilder::build`] or use [`load_catalog`].
pub fn load_builder(path: impl AsRef<Path>) -> Result<CatalogBuilder> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest = parse_manifest(&content, path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    builder_from_manifest(manifest, base_dir)
}

/// Loads and validates the catalog described by the manifest at `path`.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog> {
    load_builder(path)?.build()
}

/// Converts a parsed manifest; lookup table paths resolve against `base_dir`.
pub fn builder_from_manifest(manifest: CatalogManifest, base_dir: &Path) -> Result<CatalogBuilder> {
    let schemas = manifest
        .schemas
        .into_iter()
        .map(SchemaEntry::into_schema)
        .collect::<Result<Vec<_>>>()?;

    let mut builder = CatalogBuilder::new()
        .load_value_sets(manifest.value_sets)
        .load_schemas(schemas);

    for entry in manifest.lookup_tables {
        let path = base_dir.join(&entry.path);
        let table = read_lookup_table(&entry.name, &path)?;
        debug!(table = %entry.name, rows = table.row_count(), "lookup table loaded");
        builder = builder.load_lookup_table(table);
    }

    for entry in manifest.organizations {
        let (organization, receivers) = entry.split();
        builder = builder
            .load_organizations([organization])
            .load_receivers(receivers);
    }
    Ok(builder)
}

/// Reads a CSV lookup table; the header row supplies the column names.
pub fn read_lookup_table(name: &str, path: &Path) -> Result<LookupTable> {
    let file = fs::File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    lookup_table_from_reader(name, file, path)
}

/// Reads CSV lookup table content from any reader.
pub fn lookup_table_from_reader<R: Read>(
    name: &str,
    reader: R,
    path: &Path,
) -> Result<LookupTable> {
    let csv_error = |source: csv::Error| CatalogError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    LookupTable::new(name, columns, rows).map_err(|source| CatalogError::LookupTable {
        table: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_pads_short_rows() {
        let csv = "Zipcode,County,State\n85001,Maricopa,AZ\n85002,Maricopa\n";
        let path = Path::new("zip.csv");
        let table = lookup_table_from_reader("zip-code-data", csv.as_bytes(), path).unwrap();
        assert_eq!(table.columns(), ["Zipcode", "County", "State"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table
                .filter()
                .equals_ignore_case("zipcode", "85002")
                .find_single_result("state"),
            Some(String::new())
        );
    }

    #[test]
    fn malformed_manifest_names_the_file() {
        let err = parse_manifest("[[schemas]\nname = 1", Path::new("catalog.toml")).unwrap_err();
        assert!(err.to_string().contains("catalog.toml"));
    }
}
