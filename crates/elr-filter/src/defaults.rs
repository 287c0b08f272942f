//! Filters applied when a receiver declares none of a given kind.

use elr_model::{FilterType, Topic};

const MONKEYPOX: &str = "monkeypox";

const ALLOW_ALL: &[&str] = &["allowAll()"];
const ALLOW_NONE: &[&str] = &["allowNone()"];
const NON_PRODUCTION: &[&str] = &["doesNotMatch(processing_mode_code, T, D)"];

const COVID_QUALITY: &[&str] = &[
    concat!(
        "hasValidDataFor(message_id, equipment_model_name, specimen_type, test_result, ",
        "patient_last_name, patient_first_name, patient_dob)"
    ),
    "hasAtLeastOneOf(patient_street, patient_zip_code, patient_phone_number, patient_email)",
    "hasAtLeastOneOf(order_test_date, specimen_collection_date_time, test_result_date)",
    "isValidCLIA(testing_lab_clia, reporting_facility_clia)",
];

const TEST_QUALITY: &[&str] = &["matches(a, no)"];
const TEST_ROUTING: &[&str] = &["matches(b, false)"];

/// Default filter calls of `kind` for `topic`, if the topic has any.
pub fn default_filters(kind: FilterType, topic: &Topic) -> Option<&'static [&'static str]> {
    let filters = match (topic.as_str(), kind) {
        (Topic::COVID_19, FilterType::Jurisdictional) => ALLOW_NONE,
        (Topic::COVID_19, FilterType::Quality) => COVID_QUALITY,
        (Topic::COVID_19, FilterType::Routing) => ALLOW_ALL,
        (Topic::COVID_19, FilterType::ProcessingMode) => NON_PRODUCTION,
        (MONKEYPOX, FilterType::Jurisdictional) => ALLOW_NONE,
        (MONKEYPOX, FilterType::Quality | FilterType::Routing) => ALLOW_ALL,
        (MONKEYPOX, FilterType::ProcessingMode) => NON_PRODUCTION,
        (Topic::TEST, FilterType::Quality) => TEST_QUALITY,
        (Topic::TEST, FilterType::Routing) => TEST_ROUTING,
        (Topic::TEST, FilterType::ProcessingMode) => ALLOW_ALL,
        _ => return None,
    };
    Some(filters)
}
