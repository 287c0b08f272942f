//! Errors raised while translating reports or scheduling batches.

use chrono::{DateTime, Utc};
use elr_filter::FilterError;
use elr_map::MappingError;
use elr_model::{FilterType, ModelError};
use thiserror::Error;

/// Failure of one receiver's pipeline.
///
/// During fan-out these are caught per receiver and never abort siblings.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("unknown receiver {0:?}")]
    UnknownReceiver(String),

    #[error("receiver {receiver}, {kind} filter: {source}")]
    Filter {
        receiver: String,
        kind: FilterType,
        #[source]
        source: FilterError,
    },

    #[error("receiver {receiver}: {source}")]
    Mapping {
        receiver: String,
        #[source]
        source: MappingError,
    },

    #[error("receiver {receiver}: {source}")]
    Report {
        receiver: String,
        #[source]
        source: ModelError,
    },
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("number_per_day must be within 1..={max}, got {got}")]
    SlotsPerDay { got: u32, max: u32 },

    #[error("minimum duration must be at least one second, got {0}")]
    MinDuration(i64),

    #[error("no batch slot representable {min_duration_secs}s after {now}")]
    OutOfRange {
        now: DateTime<Utc>,
        min_duration_secs: i64,
    },
}

pub type Result<T> = std::result::Result<T, TranslateError>;
