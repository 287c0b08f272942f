//! Receiver batching policy.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

pub const MINUTES_PER_DAY: u32 = 1440;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 100;

/// What happens to the reports pending when a batch slot fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchOperation {
    /// Each pending report is delivered on its own.
    #[default]
    None,
    /// Pending reports are concatenated into one.
    Merge,
}

/// Time-sliced delivery policy: `number_per_day` equally spaced slots
/// starting at `initial_batch` local time in `time_zone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub operation: BatchOperation,
    pub number_per_day: u32,
    #[serde(with = "time_of_day")]
    pub initial_batch: NaiveTime,
    pub time_zone: Tz,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

impl Batch {
    pub fn new(number_per_day: u32, initial_batch: NaiveTime, time_zone: Tz) -> Self {
        Self {
            operation: BatchOperation::None,
            number_per_day,
            initial_batch,
            time_zone,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    pub fn with_operation(mut self, operation: BatchOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MINUTES_PER_DAY).contains(&self.number_per_day) {
            return Err(ModelError::InvalidBatch(format!(
                "number_per_day must be within 1..={MINUTES_PER_DAY}, got {}",
                self.number_per_day
            )));
        }
        if self.max_batch_size == 0 {
            return Err(ModelError::InvalidBatch(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Seconds between consecutive slots.
    pub fn period_seconds(&self) -> u32 {
        86_400 / self.number_per_day.max(1)
    }
}

/// `HH:MM` (or `HH:MM:SS`) serialization for the initial slot.
mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(text.trim(), "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(text.trim(), "%H:%M:%S"))
            .map_err(|_| de::Error::custom(format!("invalid time of day {text:?}, expected HH:MM")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_slot_count() {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert!(Batch::new(0, midnight, Tz::UTC).validate().is_err());
        assert!(Batch::new(1441, midnight, Tz::UTC).validate().is_err());
        assert!(Batch::new(1440, midnight, Tz::UTC).validate().is_ok());
        assert_eq!(Batch::new(4, midnight, Tz::UTC).period_seconds(), 21_600);
    }

    #[test]
    fn deserializes_from_toml() {
        let batch: Batch = toml::from_str(
            r#"
            operation = "merge"
            number_per_day = 4
            initial_batch = "06:30"
            time_zone = "America/Phoenix"
            "#,
        )
        .unwrap();
        assert_eq!(batch.operation, BatchOperation::Merge);
        assert_eq!(batch.initial_batch, NaiveTime::from_hms_opt(6, 30, 0).unwrap());
        assert_eq!(batch.time_zone, chrono_tz::America::Phoenix);
        assert_eq!(batch.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
    }
}
