//! Resolution of target elements against a source schema.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use elr_mapper::{Mapper, MapperRegistry, order_elements};
use elr_model::{Call, Element, Schema};
use serde::Serialize;
use tracing::debug;

use crate::error::{MappingError, Result};

/// A target element's mapper, resolved once per mapping.
#[derive(Clone)]
pub(crate) struct CompiledMapper {
    pub(crate) call: Call,
    pub(crate) mapper: Arc<dyn Mapper>,
    pub(crate) value_names: Vec<String>,
}

/// How one schema's reports are rewritten into another's.
///
/// `use_directly`, `use_value_set`, `use_mapper` and `use_default` are
/// disjoint and keyed by target element. A mapping with a non-empty
/// `missing` set can be inspected but not applied.
#[derive(Clone)]
pub struct Mapping {
    pub(crate) from_schema: Arc<Schema>,
    pub(crate) to_schema: Arc<Schema>,
    /// Target element -> source element copied as is.
    pub use_directly: BTreeMap<String, String>,
    /// Target element -> source element whose code is translated between
    /// value sets.
    pub use_value_set: BTreeMap<String, String>,
    /// Target element -> mapper call text.
    pub use_mapper: BTreeMap<String, String>,
    /// Target element -> constant value.
    pub use_default: BTreeMap<String, String>,
    /// Required target elements nothing resolves.
    pub missing: BTreeSet<String>,
    /// Fallback for blank values, for every element with a default.
    pub(crate) fallbacks: HashMap<String, String>,
    pub(crate) mappers: HashMap<String, CompiledMapper>,
    /// Mapper-bearing target elements in evaluation order.
    pub(crate) mapper_order: Vec<String>,
}

impl Mapping {
    pub fn from_schema(&self) -> &Arc<Schema> {
        &self.from_schema
    }

    pub fn to_schema(&self) -> &Arc<Schema> {
        &self.to_schema
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn mapper_order(&self) -> &[String] {
        &self.mapper_order
    }

    /// This mapping with `defaults` taking precedence over the target
    /// elements' own defaults.
    ///
    /// Elements copied or computed by a mapper keep their strategy and only
    /// take the new value as a fallback for blanks. Names that are not
    /// target elements are ignored.
    #[must_use]
    pub fn with_defaults(mut self, defaults: &BTreeMap<String, String>) -> Self {
        for (name, value) in defaults {
            if !self.to_schema.contains_element(name) {
                continue;
            }
            self.fallbacks.insert(name.clone(), value.clone());
            let resolved = self.use_directly.contains_key(name)
                || self.use_value_set.contains_key(name)
                || self.use_mapper.contains_key(name);
            if !resolved {
                self.use_default.insert(name.clone(), value.clone());
                self.missing.remove(name);
            }
        }
        self
    }

    /// Serializable view for reports and snapshots.
    pub fn summary(&self) -> MappingSummary {
        MappingSummary {
            from: self.from_schema.name().to_string(),
            to: self.to_schema.name().to_string(),
            use_directly: self.use_directly.clone(),
            use_value_set: self.use_value_set.clone(),
            use_mapper: self.use_mapper.clone(),
            use_default: self.use_default.clone(),
            missing: self.missing.iter().cloned().collect(),
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("from", &self.from_schema.name())
            .field("to", &self.to_schema.name())
            .field("use_directly", &self.use_directly)
            .field("use_value_set", &self.use_value_set)
            .field("use_mapper", &self.use_mapper)
            .field("use_default", &self.use_default)
            .field("missing", &self.missing)
            .finish()
    }
}

/// Flat description of a [`Mapping`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    pub from: String,
    pub to: String,
    pub use_directly: BTreeMap<String, String>,
    pub use_value_set: BTreeMap<String, String>,
    pub use_mapper: BTreeMap<String, String>,
    pub use_default: BTreeMap<String, String>,
    pub missing: Vec<String>,
}

fn compile_mapper(
    schema: &Schema,
    element: &Element,
    registry: &MapperRegistry,
) -> Result<Option<CompiledMapper>> {
    let wrap = |source| MappingError::Mapper {
        schema: schema.name().to_string(),
        element: element.name.clone(),
        source,
    };
    let Some(call) = element.mapper_call()? else {
        return Ok(None);
    };
    let mapper = registry.resolve(call.name()).map_err(wrap)?;
    let value_names = mapper.value_names(element, call.args()).map_err(wrap)?;
    Ok(Some(CompiledMapper {
        call,
        mapper,
        value_names,
    }))
}

/// Whether copying `from` into `to` crosses value sets.
fn needs_translation(schema: &Schema, to: &Element, from: &Element) -> Result<bool> {
    let (Some(to_set), Some(from_set)) = (to.value_set.as_deref(), from.value_set.as_deref()) else {
        return Ok(false);
    };
    if to_set.eq_ignore_ascii_case(from_set) {
        return Ok(false);
    }
    for (element, name, loaded) in [
        (to, to_set, to.value_set_ref.is_some()),
        (from, from_set, from.value_set_ref.is_some()),
    ] {
        if !loaded {
            return Err(MappingError::UnknownValueSet {
                schema: schema.name().to_string(),
                element: element.name.clone(),
                value_set: name.to_string(),
            });
        }
    }
    Ok(true)
}

/// Resolves every element of `to` against `from`.
///
/// In priority order an element is copied from the same-named source
/// element (translating codes when the two name different value sets),
/// computed by its mapper, or set to a default. `defaults` overrides the
/// elements' own static defaults, as in [`Mapping::with_defaults`].
/// Required elements resolved by none of these are recorded in
/// [`Mapping::missing`].
pub fn build_mapping(
    to: &Arc<Schema>,
    from: &Arc<Schema>,
    defaults: &BTreeMap<String, String>,
    registry: &MapperRegistry,
) -> Result<Mapping> {
    if to.topic() != from.topic() {
        return Err(MappingError::TopicMismatch {
            from: from.name().to_string(),
            from_topic: from.topic().to_string(),
            to: to.name().to_string(),
            to_topic: to.topic().to_string(),
        });
    }

    let mut mapping = Mapping {
        from_schema: Arc::clone(from),
        to_schema: Arc::clone(to),
        use_directly: BTreeMap::new(),
        use_value_set: BTreeMap::new(),
        use_mapper: BTreeMap::new(),
        use_default: BTreeMap::new(),
        missing: BTreeSet::new(),
        fallbacks: HashMap::new(),
        mappers: HashMap::new(),
        mapper_order: Vec::new(),
    };

    for element in to.elements() {
        let name = &element.name;
        let default = element.default_value();
        if let Some(default) = default {
            mapping.fallbacks.insert(name.clone(), default.to_string());
        }
        let compiled = compile_mapper(to, element, registry)?;

        if let Some(source) = from.find_element(name) {
            if needs_translation(to, element, source)? {
                mapping.use_value_set.insert(name.clone(), source.name.clone());
            } else {
                mapping.use_directly.insert(name.clone(), source.name.clone());
            }
        } else if let Some(compiled) = &compiled {
            mapping.use_mapper.insert(name.clone(), compiled.call.to_string());
        } else if let Some(default) = default {
            mapping.use_default.insert(name.clone(), default.to_string());
        } else if element.is_required() {
            mapping.missing.insert(name.clone());
        }

        if let Some(compiled) = compiled {
            mapping.mappers.insert(name.clone(), compiled);
        }
    }

    if !mapping.mappers.is_empty() {
        mapping.mapper_order = order_elements(to, registry)
            .map_err(|source| MappingError::Mapper {
                schema: to.name().to_string(),
                element: String::new(),
                source,
            })?
            .into_iter()
            .filter(|name| mapping.mappers.contains_key(name))
            .collect();
    }

    let mapping = mapping.with_defaults(defaults);
    debug!(
        from = from.name(),
        to = to.name(),
        direct = mapping.use_directly.len(),
        value_set = mapping.use_value_set.len(),
        mapper = mapping.use_mapper.len(),
        default = mapping.use_default.len(),
        missing = mapping.missing.len(),
        "built mapping"
    );
    Ok(mapping)
}
