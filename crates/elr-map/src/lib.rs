//! Schema-to-schema mappings.
//!
//! [`build_mapping`] decides once, per pair of schemas, how each target
//! element gets its value; [`apply_mapping`] then rewrites any number of
//! reports with it.

pub mod apply;
pub mod error;
pub mod mapping;

pub use apply::apply_mapping;
pub use error::{MappingError, Result};
pub use mapping::{Mapping, MappingSummary, build_mapping};
