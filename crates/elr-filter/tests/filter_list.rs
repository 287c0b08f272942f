use chrono::{TimeZone, Utc};
use elr_common::string_frame;
use elr_filter::{FilterContext, FilterError, FilterList, standard_registry};
use polars::prelude::DataFrame;
use proptest::prelude::*;

fn ctx() -> FilterContext {
    FilterContext::at(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
}

fn lab_results() -> DataFrame {
    let columns = ["patient_state", "processing_mode_code", "testing_lab_clia", "patient_zip_code"];
    let rows = [
        ["AZ", "P", "05D2222542", "85701"],
        ["CA", "T", "05D2222542", "90001"],
        ["AZ", "P", "bad", ""],
        ["NY", "P", "10D0999999", "10001"],
        ["AZ", "D", "10D0999999", "85001"],
    ];
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|value| value.to_string()).collect())
        .collect();
    string_frame(&columns, &rows).unwrap()
}

fn list(calls: &[&str]) -> FilterList {
    FilterList::parse(standard_registry(), calls).unwrap()
}

#[test]
fn list_is_intersection_of_members() {
    let table = lab_results();
    let outcome = list(&[
        "matches(patient_state, AZ)",
        "doesNotMatch(processing_mode_code, T, D)",
        "isValidCLIA(testing_lab_clia)",
    ])
    .apply(&table, &ctx())
    .unwrap();
    assert_eq!(outcome.selection.indices().collect::<Vec<_>>(), [0]);

    let rendered: Vec<String> = outcome
        .eliminations
        .iter()
        .map(|step| format!("{}: {} -> {}", step.filter, step.before, step.after))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @r"
    matches(patient_state, AZ): 5 -> 3
    doesNotMatch(processing_mode_code, T, D): 3 -> 2
    isValidCLIA(testing_lab_clia): 2 -> 1
    ");
}

#[test]
fn empty_list_selects_everything() {
    let outcome = FilterList::default().apply(&lab_results(), &ctx()).unwrap();
    assert_eq!(outcome.selection.count(), 5);
    assert!(outcome.eliminations.is_empty());
}

#[test]
fn empty_intermediate_result_short_circuits() {
    // The second call names a column that is absent and would otherwise fail open.
    let outcome = list(&["allowNone()", "doesNotMatch(missing, x)"])
        .apply(&lab_results(), &ctx())
        .unwrap();
    assert!(outcome.selection.is_empty());
    assert_eq!(outcome.eliminations.len(), 1);
}

#[test]
fn valid_data_for_absent_column_selects_nothing() {
    let outcome = list(&["hasValidDataFor(patient_state, patient_county)"])
        .apply(&lab_results(), &ctx())
        .unwrap();
    assert!(outcome.selection.is_empty());
}

#[test]
fn unknown_and_malformed_calls_are_rejected() {
    let registry = standard_registry();
    assert!(matches!(
        FilterList::parse(registry, &["isAwesome(a)"]),
        Err(FilterError::UnknownFilter(_))
    ));
    assert!(matches!(
        FilterList::parse(registry, &["matches(patient_state"]),
        Err(FilterError::Call(_))
    ));
    assert!(matches!(
        FilterList::parse(registry, &["allowAll(x)"]),
        Err(FilterError::Arity { filter: "allowAll", .. })
    ));
    assert!(matches!(
        FilterList::parse(registry, &["inDateInterval(d, now, weekly)"]),
        Err(FilterError::InvalidArgument { filter: "inDateInterval", .. })
    ));
}

const CANDIDATES: &[&str] = &[
    "matches(patient_state, AZ|CA)",
    "doesNotMatch(processing_mode_code, T)",
    "isValidCLIA(testing_lab_clia)",
    "hasAtLeastOneOf(patient_zip_code)",
    "hasValidDataFor(patient_state)",
    "allowAll()",
];

proptest! {
    #[test]
    fn and_is_order_independent(
        picks in proptest::sample::subsequence(CANDIDATES, 0..=CANDIDATES.len()),
        seed in any::<u64>(),
    ) {
        let table = lab_results();
        let forward = list(&picks).apply(&table, &ctx()).unwrap().selection;

        let mut shuffled = picks.clone();
        let len = shuffled.len();
        if len > 1 {
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();
        }
        let reordered = list(&shuffled).apply(&table, &ctx()).unwrap().selection;
        prop_assert_eq!(&forward, &reordered);

        let mut expected = elr_model::Selection::all(table.height());
        for call in &picks {
            let single = list(&[*call]).apply(&table, &ctx()).unwrap().selection;
            expected = expected.and(&single);
        }
        prop_assert_eq!(forward, expected);
    }
}
