//! Data model for schema-driven report routing.
//!
//! Schemas describe logical fields independent of any wire format; reports
//! carry rows of one schema; receivers describe who wants which rows, in
//! which schema, and when.

pub mod batch;
pub mod call;
pub mod element;
pub mod error;
pub mod ids;
pub mod lookup;
pub mod receiver;
pub mod report;
pub mod schema;
pub mod selection;
pub mod value_set;

pub use batch::{Batch, BatchOperation};
pub use call::Call;
pub use element::{Cardinality, CsvField, Element, ElementType};
pub use error::{ModelError, Result};
pub use ids::{ReportId, Topic};
pub use lookup::{LookupFilter, LookupTable};
pub use receiver::{
    CustomerStatus, FilterType, Format, Jurisdiction, Organization, Receiver, ReportFilters,
    TransportConfig, TranslatorConfig,
};
pub use report::{Report, Source};
pub use schema::Schema;
pub use selection::Selection;
pub use value_set::{SetSystem, ValueSet, ValueSetValue};
