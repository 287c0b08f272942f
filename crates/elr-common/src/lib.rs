//! Shared utilities for the ELR routing crates.
//!
//! Reports carry their rows as a Polars `DataFrame` of string columns; the
//! helpers here keep that representation consistent across crates. The
//! crate also owns the lenient date parsing and ISO-8601 period arithmetic
//! used by date filters and mappers.

pub mod datetime;
pub mod period;
pub mod polars;

pub use datetime::{format_date, format_datetime, parse_date, parse_datetime};
pub use period::{InvalidPeriod, IsoPeriod};
pub use polars::{column_values, has_column, is_blank, parse_f64, string_frame, take_rows};
