use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid {kind}: {value:?}")]
    InvalidName { kind: &'static str, value: String },
    #[error("schema {schema}: duplicate element {element}")]
    DuplicateElement { schema: String, element: String },
    #[error("malformed call expression {0:?}")]
    MalformedCall(String),
    #[error("invalid batch policy: {0}")]
    InvalidBatch(String),
    #[error("organization {organization}: {reason}")]
    InvalidJurisdiction {
        organization: String,
        reason: String,
    },
    #[error("report schema is {expected}, but {found} was supplied")]
    SchemaMismatch { expected: String, found: String },
    #[error("cannot merge an empty list of reports")]
    EmptyMerge,
    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

impl ModelError {
    pub(crate) fn invalid_name(kind: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidName {
            kind,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
