//! Report translation for ELR routing.
//!
//! The [`Translator`] fans a report out to every interested receiver in a
//! catalog: jurisdictional, quality, routing and processing-mode filters,
//! then schema mapping and optional de-identification. [`next_batch_time`]
//! and [`assemble_batch`] decide when and in what shape the results go out.

pub mod error;
pub mod schedule;
pub mod translator;

pub use error::{Result, ScheduleError, TranslateError};
pub use schedule::{assemble_batch, next_batch_time};
pub use translator::{DefaultValues, ReceiverOutcome, ReceiverTranslation, Translator};
