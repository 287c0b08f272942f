//! Value-derivation mappers for report routing.
//!
//! A mapper computes one element's value from the values of other
//! elements in the same row. Elements name their mapper with a call such
//! as `concat(patient_first_name, patient_last_name)`, resolved against a
//! [`MapperRegistry`]. [`order_elements`] decides the evaluation order.

pub mod definition;
pub mod error;
pub mod mappers;
pub mod ordering;
pub mod registry;

pub use definition::{ElementAndValue, Mapper, MapperContext, TableSource, value_of};
pub use error::{MapperError, Result};
pub use ordering::order_elements;
pub use registry::{MapperRegistry, standard_registry};
