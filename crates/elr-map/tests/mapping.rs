use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use elr_map::{Mapping, MappingError, apply_mapping, build_mapping};
use elr_mapper::{MapperContext, standard_registry};
use elr_model::{Element, Report, Schema, SetSystem, Topic, ValueSet, ValueSetValue};

fn covid() -> Topic {
    Topic::new(Topic::COVID_19).unwrap()
}

fn with_value_set(element: Element, set: &Arc<ValueSet>) -> Element {
    let mut element = element.with_value_set(set.name.clone());
    element.value_set_ref = Some(Arc::clone(set));
    element
}

fn sender_schema() -> Arc<Schema> {
    let sex = Arc::new(ValueSet::new(
        "sender/sex",
        SetSystem::Local,
        vec![ValueSetValue::new("1", "Female"), ValueSetValue::new("2", "Male")],
    ));
    Arc::new(
        Schema::new(
            "sender",
            covid(),
            vec![
                Element::new("message_id"),
                Element::new("patient_first_name"),
                Element::new("patient_last_name"),
                with_value_set(Element::new("patient_gender"), &sex),
                Element::new("ordering_facility_state"),
            ],
        )
        .unwrap(),
    )
}

fn receiver_schema() -> Arc<Schema> {
    let sex = Arc::new(ValueSet::new(
        "hl7/sex",
        SetSystem::Hl7,
        vec![ValueSetValue::new("F", "Female"), ValueSetValue::new("M", "Male")],
    ));
    let mut full_name = Element::new("patient_name")
        .with_mapper("concat(patient_first_name, patient_last_name)");
    full_name.delimiter = Some(" ".into());
    Arc::new(
        Schema::new(
            "receiver",
            covid(),
            vec![
                Element::new("message_id").required(),
                full_name,
                with_value_set(Element::new("patient_gender"), &sex),
                Element::new("ordering_facility_state").with_default("AZ"),
                Element::new("sending_application").with_default("ELR").required(),
                Element::new("comment"),
            ],
        )
        .unwrap(),
    )
}

fn build(
    to: &Arc<Schema>,
    from: &Arc<Schema>,
    defaults: &BTreeMap<String, String>,
) -> elr_map::Result<Mapping> {
    build_mapping(to, from, defaults, standard_registry())
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| (*cell).to_string()).collect()
}

#[test]
fn mapping_to_itself_copies_everything() {
    let schema = sender_schema();
    let mapping = build(&schema, &schema, &BTreeMap::new()).unwrap();
    assert!(mapping.is_complete());
    assert_eq!(mapping.use_directly.len(), schema.elements().len());
    for (to, from) in &mapping.use_directly {
        assert_eq!(to, from);
    }
    assert!(mapping.use_value_set.is_empty());
    assert!(mapping.use_mapper.is_empty());
    assert!(mapping.use_default.is_empty());
}

#[test]
fn resolution_strategies() {
    let mapping = build(&receiver_schema(), &sender_schema(), &BTreeMap::new()).unwrap();
    insta::assert_json_snapshot!(mapping.summary(), @r#"
    {
      "from": "sender",
      "to": "receiver",
      "use_directly": {
        "message_id": "message_id",
        "ordering_facility_state": "ordering_facility_state"
      },
      "use_value_set": {
        "patient_gender": "patient_gender"
      },
      "use_mapper": {
        "patient_name": "concat(patient_first_name, patient_last_name)"
      },
      "use_default": {
        "sending_application": "ELR"
      },
      "missing": []
    }
    "#);
}

#[test]
fn required_element_without_source_is_missing() {
    let target = Arc::new(
        Schema::new(
            "strict",
            covid(),
            vec![Element::new("message_id"), Element::new("specimen_id").required()],
        )
        .unwrap(),
    );
    let mapping = build(&target, &sender_schema(), &BTreeMap::new()).unwrap();
    assert_eq!(mapping.missing.iter().collect::<Vec<_>>(), ["specimen_id"]);

    let rows = [row(&["m1", "Ada", "L", "1", "AZ"])];
    let report = Report::new(sender_schema(), &rows, Vec::new()).unwrap();
    let err = apply_mapping(&report, &mapping, &MapperContext::default()).unwrap_err();
    assert!(matches!(
        err,
        MappingError::MissingElements { missing, .. } if missing == ["specimen_id"]
    ));

    let defaults = BTreeMap::from([("specimen_id".to_string(), "unknown".to_string())]);
    let mapping = build(&target, &sender_schema(), &defaults).unwrap();
    assert!(mapping.is_complete());
}

#[test]
fn topics_must_match() {
    let flu = Topic::new("flu").unwrap();
    let other = Arc::new(Schema::new("flu", flu, vec![Element::new("message_id")]).unwrap());
    assert!(matches!(
        build(&other, &sender_schema(), &BTreeMap::new()),
        Err(MappingError::TopicMismatch { .. })
    ));
}

#[test]
fn applies_copies_translations_mappers_and_defaults() {
    let sender = sender_schema();
    let report = Report::new(
        Arc::clone(&sender),
        &[
            row(&["m1", "Ada", "Lovelace", "1", "CA"]),
            row(&["m2", "Alan", "", "2", ""]),
            row(&["m3", "", "", "9", "NY"]),
        ],
        Vec::new(),
    )
    .unwrap();
    let mapping = build(&receiver_schema(), &sender, &BTreeMap::new()).unwrap();
    let ctx = MapperContext::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    let mapped = apply_mapping(&report, &mapping, &ctx).unwrap();

    assert_eq!(mapped.schema().name(), "receiver");
    assert_eq!(mapped.item_count(), 3);
    assert_ne!(mapped.id(), report.id());
    let column = |name: &str| mapped.column(name).unwrap().unwrap();
    assert_eq!(column("message_id"), ["m1", "m2", "m3"]);
    assert_eq!(column("patient_name"), ["Ada Lovelace", "Alan", ""]);
    assert_eq!(column("patient_gender"), ["F", "M", ""]);
    assert_eq!(column("ordering_facility_state"), ["CA", "AZ", "NY"]);
    assert_eq!(column("sending_application"), ["ELR", "ELR", "ELR"]);
    assert_eq!(column("comment"), ["", "", ""]);
    assert_eq!(report.item_count(), 3);
}

#[test]
fn caller_defaults_override_element_defaults() {
    let sender = sender_schema();
    let defaults = BTreeMap::from([("sending_application".to_string(), "CDC PRIME".to_string())]);
    let mapping = build(&receiver_schema(), &sender, &defaults).unwrap();
    let report = Report::new(sender, &[row(&["m1", "A", "B", "1", "AZ"])], Vec::new()).unwrap();
    let mapped = apply_mapping(&report, &mapping, &MapperContext::default()).unwrap();
    assert_eq!(mapped.get_string(0, "sending_application").unwrap().as_deref(), Some("CDC PRIME"));
}

#[test]
fn defaults_layer_over_a_shared_mapping() {
    let sender = sender_schema();
    let target = Arc::new(
        Schema::new(
            "strict",
            covid(),
            vec![
                Element::new("message_id"),
                Element::new("specimen_id").required(),
                Element::new("sending_application").with_default("ELR"),
            ],
        )
        .unwrap(),
    );
    let defaults = BTreeMap::from([
        ("message_id".to_string(), "none".to_string()),
        ("specimen_id".to_string(), "unknown".to_string()),
        ("not_an_element".to_string(), "ignored".to_string()),
    ]);

    let shared = build(&target, &sender, &BTreeMap::new()).unwrap();
    assert!(!shared.is_complete());
    let layered = shared.clone().with_defaults(&defaults);
    let built = build(&target, &sender, &defaults).unwrap();
    assert_eq!(layered.summary(), built.summary());
    assert!(layered.is_complete());
    assert_eq!(layered.use_directly.get("message_id").map(String::as_str), Some("message_id"));
    assert!(!layered.use_default.contains_key("not_an_element"));
    assert_eq!(shared.missing.len(), 1);

    let report = Report::new(sender, &[row(&["", "Ada", "L", "1", "AZ"])], Vec::new()).unwrap();
    let mapped = apply_mapping(&report, &layered, &MapperContext::default()).unwrap();
    assert_eq!(mapped.get_string(0, "message_id").unwrap().as_deref(), Some("none"));
    assert_eq!(mapped.get_string(0, "specimen_id").unwrap().as_deref(), Some("unknown"));
    assert_eq!(mapped.get_string(0, "sending_application").unwrap().as_deref(), Some("ELR"));
}
