//! Error types for building and applying mappings.

use elr_mapper::MapperError;
use elr_model::ModelError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("cannot map schema {from} ({from_topic}) to {to} ({to_topic}): topics differ")]
    TopicMismatch {
        from: String,
        from_topic: String,
        to: String,
        to_topic: String,
    },
    #[error(
        "schema {schema}: element {element} translates between value sets \
         but {value_set:?} is not loaded"
    )]
    UnknownValueSet {
        schema: String,
        element: String,
        value_set: String,
    },
    #[error("schema {schema}: element {element}: {source}")]
    Mapper {
        schema: String,
        element: String,
        #[source]
        source: MapperError,
    },
    #[error("mapping {from} -> {to} is missing required elements: {}", missing.join(", "))]
    MissingElements {
        from: String,
        to: String,
        missing: Vec<String>,
    },
    #[error("mapping expects reports of schema {expected}, got {found}")]
    WrongSource { expected: String, found: String },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

pub type Result<T> = std::result::Result<T, MappingError>;
