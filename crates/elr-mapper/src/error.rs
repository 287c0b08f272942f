use elr_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    #[error("unknown mapper {0:?}")]
    UnknownMapper(String),
    #[error("mapper {mapper} expects {expected} arguments, got {got}")]
    Arity {
        mapper: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("mapper {mapper} on element {element}: {reason}")]
    InvalidArgument {
        mapper: &'static str,
        element: String,
        reason: String,
    },
    #[error("mapper {mapper} on element {element} needs a lookup table")]
    MissingTable { mapper: &'static str, element: String },
    #[error("mapper {mapper} on element {element}: unknown lookup table {table:?}")]
    UnknownTable {
        mapper: &'static str,
        element: String,
        table: String,
    },
    #[error(transparent)]
    Call(#[from] ModelError),
}

impl MapperError {
    pub(crate) fn arity(mapper: &'static str, expected: &'static str, got: usize) -> Self {
        Self::Arity {
            mapper,
            expected,
            got,
        }
    }

    pub(crate) fn invalid(mapper: &'static str, element: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            mapper,
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;
