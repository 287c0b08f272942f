//! Assembling and validating a [`Catalog`].

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use elr_filter::{FilterList, FilterRegistry, default_filters};
use elr_mapper::{MapperError, MapperRegistry};
use elr_model::{
    Element, FilterType, LookupTable, ModelError, Organization, Receiver, Schema, ValueSet,
};
use tracing::{debug, info};

use crate::catalog::{Catalog, CatalogReceiver, FilterStage, key};
use crate::error::{CatalogError, Result};

/// Collects catalog records and validates them as a whole in [`build`].
///
/// Nothing is checked while loading; every cross reference (inheritance,
/// value sets, lookup tables, mapper and filter calls, receiver schemas) is
/// resolved by `build`, which either yields a complete catalog or the first
/// configuration error.
///
/// [`build`]: CatalogBuilder::build
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    schemas: Vec<Schema>,
    value_sets: Vec<ValueSet>,
    lookup_tables: Vec<LookupTable>,
    organizations: Vec<Organization>,
    receivers: Vec<Receiver>,
    filters: Option<FilterRegistry>,
    mappers: Option<MapperRegistry>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn load_schemas(mut self, schemas: impl IntoIterator<Item = Schema>) -> Self {
        self.schemas.extend(schemas);
        self
    }

    #[must_use]
    pub fn load_value_sets(mut self, value_sets: impl IntoIterator<Item = ValueSet>) -> Self {
        self.value_sets.extend(value_sets);
        self
    }

    #[must_use]
    pub fn load_lookup_table(mut self, table: LookupTable) -> Self {
        self.lookup_tables.push(table);
        self
    }

    #[must_use]
    pub fn load_organizations(
        mut self,
        organizations: impl IntoIterator<Item = Organization>,
    ) -> Self {
        self.organizations.extend(organizations);
        self
    }

    /// Receivers must name an organization loaded with
    /// [`load_organizations`](Self::load_organizations).
    #[must_use]
    pub fn load_receivers(mut self, receivers: impl IntoIterator<Item = Receiver>) -> Self {
        self.receivers.extend(receivers);
        self
    }

    /// Use `registry` instead of the built-in filters.
    #[must_use]
    pub fn with_filter_registry(mut self, registry: FilterRegistry) -> Self {
        self.filters = Some(registry);
        self
    }

    /// Use `registry` instead of the built-in mappers.
    #[must_use]
    pub fn with_mapper_registry(mut self, registry: MapperRegistry) -> Self {
        self.mappers = Some(registry);
        self
    }

    pub fn build(self) -> Result<Catalog> {
        let filters = self
            .filters
            .unwrap_or_else(|| elr_filter::standard_registry().clone());
        let mappers = self
            .mappers
            .unwrap_or_else(|| elr_mapper::standard_registry().clone());

        let value_sets = index_value_sets(self.value_sets)?;
        let lookup_tables = index_lookup_tables(self.lookup_tables)?;

        let mut schemas = HashMap::new();
        for (schema_key, schema) in resolve_inheritance(self.schemas)? {
            validate_elements(&schema, &value_sets, &lookup_tables, &mappers)?;
            let schema = attach_value_sets(&schema, &value_sets)?;
            debug!(schema = schema.name(), elements = schema.elements().len(), "schema resolved");
            schemas.insert(schema_key, Arc::new(schema));
        }

        let mut organizations: Vec<Arc<Organization>> = Vec::new();
        for organization in self.organizations {
            organization
                .validate()
                .map_err(|source| CatalogError::Organization {
                    organization: organization.name.clone(),
                    source,
                })?;
            if organizations
                .iter()
                .any(|existing| existing.name.eq_ignore_ascii_case(&organization.name))
            {
                return Err(CatalogError::duplicate("organization", organization.name));
            }
            organizations.push(Arc::new(organization));
        }

        let mut receivers = Vec::new();
        let mut receiver_index = HashMap::new();
        for receiver in self.receivers {
            let entry = compile_receiver(receiver, &organizations, &schemas, &filters)?;
            let index_key = key(&entry.full_name);
            if receiver_index.contains_key(&index_key) {
                return Err(CatalogError::duplicate("receiver", entry.full_name));
            }
            receiver_index.insert(index_key, receivers.len());
            receivers.push(entry);
        }

        let catalog = Catalog {
            schemas,
            value_sets,
            lookup_tables,
            organizations,
            receivers,
            receiver_index,
            filters,
            mappers,
        };
        let summary = catalog.summary();
        info!(
            schemas = summary.schemas,
            value_sets = summary.value_sets,
            lookup_tables = summary.lookup_tables,
            organizations = summary.organizations,
            receivers = summary.receivers,
            "catalog built"
        );
        Ok(catalog)
    }
}

fn index_value_sets(value_sets: Vec<ValueSet>) -> Result<HashMap<String, Arc<ValueSet>>> {
    let mut index = HashMap::with_capacity(value_sets.len());
    for value_set in value_sets {
        let value_set_key = key(&value_set.name);
        if index.contains_key(&value_set_key) {
            return Err(CatalogError::duplicate("value set", value_set.name));
        }
        index.insert(value_set_key, Arc::new(value_set));
    }
    Ok(index)
}

fn index_lookup_tables(tables: Vec<LookupTable>) -> Result<HashMap<String, LookupTable>> {
    let mut index = HashMap::with_capacity(tables.len());
    for table in tables {
        let table_key = key(table.name());
        if index.contains_key(&table_key) {
            return Err(CatalogError::duplicate("lookup table", table.name()));
        }
        index.insert(table_key, table);
    }
    Ok(index)
}

/// Resolves `extends` / `based_on` for every schema, parents first.
fn resolve_inheritance(declared: Vec<Schema>) -> Result<Vec<(String, Schema)>> {
    let mut by_key = HashMap::with_capacity(declared.len());
    for schema in declared {
        let schema_key = key(schema.name());
        if by_key.contains_key(&schema_key) {
            return Err(CatalogError::duplicate("schema", schema.name()));
        }
        by_key.insert(schema_key, schema);
    }

    let mut keys: Vec<&String> = by_key.keys().collect();
    keys.sort();
    let mut resolved = HashMap::with_capacity(by_key.len());
    for schema_key in keys {
        resolve_schema(schema_key, &by_key, &mut resolved, &mut Vec::new())?;
    }
    let mut resolved: Vec<(String, Schema)> = resolved.into_iter().collect();
    resolved.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(resolved)
}

fn resolve_schema(
    schema_key: &str,
    declared: &HashMap<String, Schema>,
    resolved: &mut HashMap<String, Schema>,
    visiting: &mut Vec<String>,
) -> Result<()> {
    if resolved.contains_key(schema_key) {
        return Ok(());
    }
    let Some(schema) = declared.get(schema_key) else {
        return Ok(());
    };
    if visiting.iter().any(|pending| pending == schema_key) {
        return Err(CatalogError::InheritanceCycle(schema.name().to_string()));
    }
    visiting.push(schema_key.to_string());
    for parent in [schema.extends(), schema.based_on()].into_iter().flatten() {
        let parent_key = key(parent);
        if !declared.contains_key(&parent_key) {
            return Err(CatalogError::UnknownSchema {
                referenced_by: format!("schema {}", schema.name()),
                schema: parent.to_string(),
            });
        }
        resolve_schema(&parent_key, declared, resolved, visiting)?;
    }
    visiting.pop();

    let extends = schema.extends().and_then(|parent| resolved.get(&key(parent)));
    let based_on = schema.based_on().and_then(|parent| resolved.get(&key(parent)));
    let inherited = schema
        .inherit(extends, based_on)
        .map_err(|source| CatalogError::Schema {
            schema: schema.name().to_string(),
            source,
        })?;
    resolved.insert(schema_key.to_string(), inherited);
    Ok(())
}

fn validate_elements(
    schema: &Schema,
    value_sets: &HashMap<String, Arc<ValueSet>>,
    lookup_tables: &HashMap<String, LookupTable>,
    mappers: &MapperRegistry,
) -> Result<()> {
    for element in schema.elements() {
        if let Some(value_set) = &element.value_set
            && !value_sets.contains_key(&key(value_set))
        {
            return Err(CatalogError::UnknownValueSet {
                schema: schema.name().to_string(),
                element: element.name.clone(),
                value_set: value_set.clone(),
            });
        }

        if let Some(table_name) = &element.table {
            let Some(table) = lookup_tables.get(&key(table_name)) else {
                return Err(CatalogError::UnknownLookupTable {
                    schema: schema.name().to_string(),
                    element: element.name.clone(),
                    table: table_name.clone(),
                });
            };
            if let Some(column) = &element.table_column
                && !table.has_column(column)
            {
                return Err(CatalogError::UnknownTableColumn {
                    schema: schema.name().to_string(),
                    element: element.name.clone(),
                    table: table_name.clone(),
                    column: column.clone(),
                });
            }
        }

        validate_mapper(element, mappers).map_err(|source| CatalogError::Mapper {
            schema: schema.name().to_string(),
            element: element.name.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Mapper name and arity, checked by asking the mapper for its inputs.
fn validate_mapper(element: &Element, mappers: &MapperRegistry) -> elr_mapper::Result<()> {
    let Some(call) = element.mapper_call().map_err(MapperError::from)? else {
        return Ok(());
    };
    let mapper = mappers.resolve(call.name())?;
    mapper.value_names(element, call.args())?;
    Ok(())
}

/// Resolves each element's value set, merging its `alt_values`.
fn attach_value_sets(
    schema: &Schema,
    value_sets: &HashMap<String, Arc<ValueSet>>,
) -> Result<Schema> {
    schema
        .map_elements(|element| {
            let value_set_ref = element
                .value_set
                .as_deref()
                .and_then(|name| value_sets.get(&key(name)))
                .map(|value_set| match &element.alt_values {
                    Some(alt_values) => Arc::new(value_set.merge_alt_values(alt_values)),
                    None => Arc::clone(value_set),
                });
            let mut element = element.clone();
            element.value_set_ref = value_set_ref;
            Ok(element)
        })
        .map_err(|source| CatalogError::Schema {
            schema: schema.name().to_string(),
            source,
        })
}

fn compile_receiver(
    receiver: Receiver,
    organizations: &[Arc<Organization>],
    schemas: &HashMap<String, Arc<Schema>>,
    filters: &FilterRegistry,
) -> Result<CatalogReceiver> {
    let full_name = receiver.full_name();
    if receiver.name.trim().is_empty() || receiver.name.contains('.') {
        return Err(CatalogError::Receiver {
            receiver: full_name,
            source: ModelError::InvalidName {
                kind: "receiver name",
                value: receiver.name.clone(),
            },
        });
    }

    let Some(organization) = organizations
        .iter()
        .find(|organization| organization.name.eq_ignore_ascii_case(&receiver.organization_name))
    else {
        return Err(CatalogError::UnknownOrganization {
            receiver: full_name,
            organization: receiver.organization_name.clone(),
        });
    };

    let Some(schema) = schemas.get(&key(receiver.schema_name())) else {
        return Err(CatalogError::UnknownSchema {
            referenced_by: format!("receiver {full_name}"),
            schema: receiver.schema_name().to_string(),
        });
    };
    if schema.topic() != &receiver.topic {
        return Err(CatalogError::TopicMismatch {
            receiver: full_name,
            topic: receiver.topic.to_string(),
            schema: schema.name().to_string(),
            schema_topic: schema.topic().to_string(),
        });
    }

    if let Some(timing) = &receiver.timing {
        timing.validate().map_err(|source| CatalogError::Receiver {
            receiver: full_name.clone(),
            source,
        })?;
    }

    let mut stages = BTreeMap::new();
    for kind in FilterType::ALL {
        let compile = |calls: &[String]| {
            FilterList::parse(filters, calls).map_err(|source| CatalogError::Filter {
                receiver: full_name.clone(),
                kind,
                source,
            })
        };
        let mut declared = organization.filters_for(kind, &receiver.topic);
        declared.extend(receiver.filters(kind).iter().cloned());
        if !declared.is_empty() {
            let list = compile(&declared)?;
            stages.insert(
                kind,
                FilterStage {
                    list,
                    topic_default: false,
                },
            );
        } else if let Some(defaults) = default_filters(kind, &receiver.topic) {
            let defaults: Vec<String> = defaults.iter().map(|call| (*call).to_string()).collect();
            let list = compile(&defaults)?;
            stages.insert(
                kind,
                FilterStage {
                    list,
                    topic_default: true,
                },
            );
        }
    }

    debug!(receiver = %full_name, stages = stages.len(), "receiver compiled");
    Ok(CatalogReceiver {
        receiver: Arc::new(receiver),
        full_name,
        schema: Arc::clone(schema),
        stages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use elr_model::{Jurisdiction, Topic, TranslatorConfig};

    fn topic() -> Topic {
        Topic::new(Topic::COVID_19).unwrap()
    }

    fn schema(name: &str) -> Schema {
        Schema::new(name, topic(), vec![Element::new("a"), Element::new("b")]).unwrap()
    }

    #[test]
    fn inheritance_cycle_is_rejected() {
        let err = CatalogBuilder::new()
            .load_schemas([schema("x").with_extends("y"), schema("y").with_extends("x")])
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::InheritanceCycle(_)));
    }

    #[test]
    fn receiver_name_must_not_contain_dot() {
        let organization = Organization::new("az-phd", Jurisdiction::Federal).unwrap();
        let receiver = Receiver::new(
            "az-phd",
            "elr.secondary",
            topic(),
            TranslatorConfig::Custom {
                schema_name: "x".to_string(),
                format: elr_model::Format::Csv,
                default_values: Default::default(),
            },
        );
        let err = CatalogBuilder::new()
            .load_schemas([schema("x")])
            .load_organizations([organization])
            .load_receivers([receiver])
            .build()
            .unwrap_err();
        assert!(matches!(err, CatalogError::Receiver { .. }));
    }
}
