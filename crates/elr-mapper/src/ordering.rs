//! Evaluation order for mapper-bearing elements.

use std::collections::HashSet;
use std::sync::Arc;

use elr_model::Schema;
use tracing::debug;

use crate::definition::Mapper;
use crate::error::Result;
use crate::registry::MapperRegistry;

struct Pending<'s> {
    name: &'s str,
    dependencies: Vec<String>,
    mapper: Arc<dyn Mapper>,
}

/// Orders every element of `schema` so that each mapper runs after the
/// elements it reads.
///
/// Elements without a mapper come first, in schema order. Mapper-bearing
/// elements follow as their dependencies become ready. Whatever is left
/// once no further progress is possible (cycles, or lookups with several
/// fallback sources) is placed by the mappers' declared preference order
/// and finally in schema order, so the result always covers the schema.
pub fn order_elements(schema: &Schema, registry: &MapperRegistry) -> Result<Vec<String>> {
    let mut ordered: Vec<String> = Vec::with_capacity(schema.elements().len());
    let mut ready: HashSet<&str> = HashSet::new();
    let mut pending: Vec<Pending<'_>> = Vec::new();

    for element in schema.elements() {
        let Some(call) = element.mapper_call()? else {
            ready.insert(&element.name);
            ordered.push(element.name.clone());
            continue;
        };
        let mapper = registry.resolve(call.name())?;
        let dependencies = mapper
            .value_names(element, call.args())?
            .into_iter()
            .filter(|name| *name != element.name && schema.contains_element(name))
            .collect();
        pending.push(Pending {
            name: &element.name,
            dependencies,
            mapper,
        });
    }

    loop {
        let before = pending.len();
        pending.retain(|candidate| {
            let resolved = candidate
                .dependencies
                .iter()
                .all(|name| ready.contains(name.as_str()));
            if resolved {
                ready.insert(candidate.name);
                ordered.push(candidate.name.to_string());
            }
            !resolved
        });
        if pending.is_empty() || pending.len() == before {
            break;
        }
    }

    if !pending.is_empty() {
        debug!(
            schema = schema.name(),
            unresolved = pending.len(),
            "mapper dependencies not orderable, using preference order"
        );
        let preferences: Vec<&'static str> = pending
            .iter()
            .flat_map(|candidate| candidate.mapper.dependency_preference().iter().copied())
            .collect();
        for preferred in preferences {
            if let Some(position) = pending
                .iter()
                .position(|candidate| candidate.name == preferred)
            {
                ordered.push(pending.remove(position).name.to_string());
            }
        }
        ordered.extend(pending.iter().map(|candidate| candidate.name.to_string()));
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use elr_model::{Element, Topic};

    use super::*;
    use crate::registry::standard_registry;

    fn schema(elements: Vec<Element>) -> Schema {
        Schema::new("ordering", Topic::new(Topic::TEST).unwrap(), elements).unwrap()
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|candidate| candidate == name).unwrap()
    }

    #[test]
    fn dependencies_come_first() {
        let schema = schema(vec![
            Element::new("full_name").with_mapper("concat(first_name, last_name)"),
            Element::new("initial").with_mapper("middleInitial(full_name)"),
            Element::new("first_name"),
            Element::new("last_name"),
        ]);
        let order = order_elements(&schema, standard_registry()).unwrap();
        assert_eq!(order, ["first_name", "last_name", "full_name", "initial"]);
    }

    #[test]
    fn cycles_fall_back_to_preference_then_schema_order() {
        let schema = schema(vec![
            Element::new("a").with_mapper("use(b)"),
            Element::new("b").with_mapper("use(a)"),
            Element::new("device_id").with_mapper("use(equipment_model_name)"),
            Element::new("equipment_model_name").with_mapper("livdLookup()"),
            Element::new("test_performed_code"),
        ]);
        let order = order_elements(&schema, standard_registry()).unwrap();
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], "test_performed_code");
        assert!(position(&order, "equipment_model_name") < position(&order, "device_id"));
        assert!(position(&order, "a") < position(&order, "b"));
    }

    #[test]
    fn literal_arguments_are_not_dependencies() {
        let schema = schema(vec![
            Element::new("flag").with_mapper("ifPresent(patient_email, Y)"),
            Element::new("Y").with_mapper("use(flag)"),
            Element::new("patient_email"),
        ]);
        let order = order_elements(&schema, standard_registry()).unwrap();
        assert_eq!(order, ["patient_email", "flag", "Y"]);
    }

    #[test]
    fn unknown_mapper_is_an_error() {
        let schema = schema(vec![Element::new("x").with_mapper("guess(y)")]);
        assert!(order_elements(&schema, standard_registry()).is_err());
    }
}
