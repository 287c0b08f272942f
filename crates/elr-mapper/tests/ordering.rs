use elr_mapper::{MapperRegistry, order_elements, standard_registry};
use elr_model::{Element, Schema, Topic};
use proptest::prelude::*;

#[test]
fn registry_names_snapshot() {
    insta::assert_snapshot!(standard_registry().names().join("\n"), @r"
    coalesce
    concat
    countryMapper
    hash
    ifNPI
    ifNotPresent
    ifPresent
    ifThenElse
    livdLookup
    lookup
    middleInitial
    none
    obx8
    offsetDateTime
    patientAge
    split
    splitByComma
    stripNonNumeric
    stripNumeric
    stripPhoneFormatting
    timestamp
    trimBlanks
    use
    zipCodeToCounty
    zipCodeToState
    ");
}

#[test]
fn empty_registry_rejects_every_mapper() {
    let schema = Schema::new(
        "s",
        Topic::new(Topic::TEST).unwrap(),
        vec![Element::new("a").with_mapper("use(b)"), Element::new("b")],
    )
    .unwrap();
    assert!(order_elements(&schema, &MapperRegistry::new()).is_err());
}

/// Schemas of `size` elements where each element either has no mapper or
/// uses an arbitrary set of other elements, cycles included.
fn arbitrary_schema() -> impl Strategy<Value = Schema> {
    (1usize..12).prop_flat_map(|size| {
        let dependencies = proptest::option::of(proptest::collection::vec(0..size, 1..4));
        proptest::collection::vec(dependencies, size)
            .prop_map(move |specs| {
                let elements = specs
                    .into_iter()
                    .enumerate()
                    .map(|(index, deps)| {
                        let element = Element::new(format!("e{index}"));
                        match deps {
                            Some(deps) => {
                                let names: Vec<String> =
                                    deps.iter().map(|dep| format!("e{dep}")).collect();
                                element.with_mapper(format!("coalesce({})", names.join(", ")))
                            }
                            None => element,
                        }
                    })
                    .collect();
                Schema::new("generated", Topic::new(Topic::TEST).unwrap(), elements).unwrap()
            })
    })
}

proptest! {
    #[test]
    fn order_is_a_permutation_respecting_acyclic_dependencies(schema in arbitrary_schema()) {
        let order = order_elements(&schema, standard_registry()).unwrap();
        let mut sorted = order.clone();
        sorted.sort();
        let mut expected: Vec<String> = schema.element_names().map(str::to_string).collect();
        expected.sort();
        prop_assert_eq!(sorted, expected);

        // Elements without mappers always lead.
        let plain = schema.elements().iter().filter(|element| element.mapper.is_none()).count();
        for name in &order[..plain] {
            prop_assert!(schema.find_element(name).unwrap().mapper.is_none());
        }
    }
}
