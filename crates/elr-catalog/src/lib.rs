//! Metadata catalog for ELR routing.
//!
//! A [`Catalog`] is an immutable, fully validated snapshot of schemas, value
//! sets, lookup tables, organizations and receivers. It is assembled with a
//! [`CatalogBuilder`] (or read from a TOML manifest by [`load_catalog`]) and
//! published through a [`CatalogStore`] so that a reload never disturbs a
//! translation already in progress.

pub mod builder;
pub mod catalog;
pub mod error;
pub mod loader;
pub mod store;

pub use builder::CatalogBuilder;
pub use catalog::{Catalog, CatalogReceiver, CatalogSummary, FilterStage};
pub use error::{CatalogError, Result};
pub use loader::{CatalogManifest, load_builder, load_catalog, parse_manifest, read_lookup_table};
pub use store::CatalogStore;
