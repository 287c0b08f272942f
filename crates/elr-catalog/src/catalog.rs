//! The read-only catalog shared by every translation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use elr_filter::{FilterList, FilterRegistry};
use elr_mapper::{MapperRegistry, TableSource};
use elr_model::{FilterType, LookupTable, Organization, Receiver, Schema, Topic, ValueSet};
use serde::Serialize;

/// A compiled filter list for one stage of a receiver's pipeline.
#[derive(Debug, Clone)]
pub struct FilterStage {
    pub(crate) list: FilterList,
    pub(crate) topic_default: bool,
}

impl FilterStage {
    pub fn list(&self) -> &FilterList {
        &self.list
    }

    /// Whether the list came from the topic defaults rather than the
    /// organization or receiver.
    pub fn is_topic_default(&self) -> bool {
        self.topic_default
    }
}

/// A receiver together with its target schema and compiled filters.
#[derive(Debug, Clone)]
pub struct CatalogReceiver {
    pub(crate) receiver: Arc<Receiver>,
    pub(crate) full_name: String,
    pub(crate) schema: Arc<Schema>,
    pub(crate) stages: BTreeMap<FilterType, FilterStage>,
}

impl CatalogReceiver {
    pub fn receiver(&self) -> &Arc<Receiver> {
        &self.receiver
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Filter list of `kind`; `None` when the stage is skipped.
    pub fn stage(&self, kind: FilterType) -> Option<&FilterStage> {
        self.stages.get(&kind)
    }
}

/// Immutable snapshot of every schema, value set, lookup table,
/// organization and receiver known to the process.
///
/// Built and validated once by [`CatalogBuilder`](crate::CatalogBuilder);
/// shared by reference afterwards. Schema, value set and lookup table names
/// are matched case-insensitively.
#[derive(Clone, Default)]
pub struct Catalog {
    pub(crate) schemas: HashMap<String, Arc<Schema>>,
    pub(crate) value_sets: HashMap<String, Arc<ValueSet>>,
    pub(crate) lookup_tables: HashMap<String, LookupTable>,
    pub(crate) organizations: Vec<Arc<Organization>>,
    pub(crate) receivers: Vec<CatalogReceiver>,
    pub(crate) receiver_index: HashMap<String, usize>,
    pub(crate) filters: FilterRegistry,
    pub(crate) mappers: MapperRegistry,
}

pub(crate) fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Catalog {
    /// A catalog with nothing loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn schema(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.get(&key(name))
    }

    /// Schema names, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.values().map(|schema| schema.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn value_set(&self, name: &str) -> Option<&Arc<ValueSet>> {
        self.value_sets.get(&key(name))
    }

    pub fn organizations(&self) -> &[Arc<Organization>] {
        &self.organizations
    }

    pub fn organization(&self, name: &str) -> Option<&Arc<Organization>> {
        self.organizations
            .iter()
            .find(|organization| organization.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Every receiver, in load order.
    pub fn receivers(&self) -> &[CatalogReceiver] {
        &self.receivers
    }

    /// Receiver addressed by `organization.receiver`.
    pub fn receiver(&self, full_name: &str) -> Option<&CatalogReceiver> {
        self.receiver_index
            .get(&key(full_name))
            .map(|&index| &self.receivers[index])
    }

    /// Receivers subscribed to `topic`, in load order.
    pub fn receivers_for_topic<'a>(
        &'a self,
        topic: &'a Topic,
    ) -> impl Iterator<Item = &'a CatalogReceiver> + 'a {
        self.receivers
            .iter()
            .filter(move |entry| &entry.receiver.topic == topic)
    }

    pub fn filter_registry(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn mapper_registry(&self) -> &MapperRegistry {
        &self.mappers
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            schemas: self.schemas.len(),
            value_sets: self.value_sets.len(),
            lookup_tables: self.lookup_tables.len(),
            organizations: self.organizations.len(),
            receivers: self.receivers.len(),
            active_receivers: self
                .receivers
                .iter()
                .filter(|entry| entry.receiver.is_active())
                .count(),
        }
    }
}

impl TableSource for Catalog {
    fn lookup_table(&self, name: &str) -> Option<&LookupTable> {
        self.lookup_tables.get(&key(name))
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("schemas", &self.schema_names())
            .field("value_sets", &self.value_sets.len())
            .field("lookup_tables", &self.lookup_tables.len())
            .field("organizations", &self.organizations.len())
            .field("receivers", &self.receiver_index.len())
            .finish()
    }
}

/// Counts of what a catalog holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    pub schemas: usize,
    pub value_sets: usize,
    pub lookup_tables: usize,
    pub organizations: usize,
    pub receivers: usize,
    pub active_receivers: usize,
}
