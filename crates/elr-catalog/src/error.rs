//! Errors raised while loading or validating a catalog.

use std::path::PathBuf;

use elr_filter::FilterError;
use elr_mapper::MapperError;
use elr_model::{FilterType, ModelError};
use thiserror::Error;

/// A configuration problem that prevents a catalog from being built.
///
/// Every variant names the schema, receiver or file at fault.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("duplicate {kind} {name:?}")]
    Duplicate { kind: &'static str, name: String },

    #[error("{referenced_by}: unknown schema {schema:?}")]
    UnknownSchema {
        referenced_by: String,
        schema: String,
    },

    #[error("schema {0}: inheritance cycle")]
    InheritanceCycle(String),

    #[error("schema {schema}, element {element}: unknown value set {value_set:?}")]
    UnknownValueSet {
        schema: String,
        element: String,
        value_set: String,
    },

    #[error("schema {schema}, element {element}: unknown lookup table {table:?}")]
    UnknownLookupTable {
        schema: String,
        element: String,
        table: String,
    },

    #[error("schema {schema}, element {element}: lookup table {table} has no column {column:?}")]
    UnknownTableColumn {
        schema: String,
        element: String,
        table: String,
        column: String,
    },

    #[error("schema {schema}, element {element}: {source}")]
    Mapper {
        schema: String,
        element: String,
        #[source]
        source: MapperError,
    },

    #[error("schema {schema}: {source}")]
    Schema {
        schema: String,
        #[source]
        source: ModelError,
    },

    #[error("receiver {receiver}: unknown organization {organization:?}")]
    UnknownOrganization {
        receiver: String,
        organization: String,
    },

    #[error("receiver {receiver} has topic {topic} but schema {schema} has topic {schema_topic}")]
    TopicMismatch {
        receiver: String,
        topic: String,
        schema: String,
        schema_topic: String,
    },

    #[error("receiver {receiver}, {kind} filter: {source}")]
    Filter {
        receiver: String,
        kind: FilterType,
        #[source]
        source: FilterError,
    },

    #[error("receiver {receiver}: {source}")]
    Receiver {
        receiver: String,
        #[source]
        source: ModelError,
    },

    #[error("organization {organization}: {source}")]
    Organization {
        organization: String,
        #[source]
        source: ModelError,
    },

    #[error("lookup table {table}: {source}")]
    LookupTable {
        table: String,
        #[source]
        source: ModelError,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl CatalogError {
    pub(crate) fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind,
            name: name.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
