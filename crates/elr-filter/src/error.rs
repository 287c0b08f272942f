use elr_model::ModelError;
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown filter {0:?}")]
    UnknownFilter(String),
    #[error("filter {filter} expects {expected} arguments, got {got}")]
    Arity {
        filter: &'static str,
        expected: &'static str,
        got: usize,
    },
    #[error("filter {filter}: {reason}")]
    InvalidArgument { filter: &'static str, reason: String },
    #[error("filter {filter}: invalid regular expression {pattern:?}")]
    Regex {
        filter: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    Call(#[from] ModelError),
    #[error("frame error: {0}")]
    Frame(#[from] PolarsError),
}

impl FilterError {
    pub(crate) fn arity(filter: &'static str, expected: &'static str, got: usize) -> Self {
        Self::Arity {
            filter,
            expected,
            got,
        }
    }

    pub(crate) fn invalid(filter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            filter,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FilterError>;
