use std::sync::Arc;

use elr_cli::io::{read_report, read_report_file, write_report};
use elr_model::{Element, Schema, Source, Topic};

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::new(
            "upload",
            Topic::new(Topic::COVID_19).unwrap(),
            vec![
                Element::new("message_id"),
                Element::new("patient_state"),
                Element::new("patient_zip_code"),
            ],
        )
        .unwrap(),
    )
}

fn client() -> Source {
    Source::Client {
        name: "simple_report".to_string(),
    }
}

#[test]
fn header_matching_ignores_case_and_order() {
    let input = "Patient_State,MESSAGE_ID,lab_notes\nAZ, 1 ,ignored\nCA,2,\n";
    let report = read_report(input.as_bytes(), &schema(), client()).unwrap();

    assert_eq!(report.item_count(), 2);
    assert_eq!(report.column("message_id").unwrap().unwrap(), ["1", "2"]);
    assert_eq!(report.column("patient_state").unwrap().unwrap(), ["AZ", "CA"]);
    assert_eq!(report.column("patient_zip_code").unwrap().unwrap(), ["", ""]);
}

#[test]
fn short_records_read_as_blank() {
    let input = "message_id,patient_state,patient_zip_code\n1,AZ\n";
    let report = read_report(input.as_bytes(), &schema(), client()).unwrap();
    assert_eq!(report.column("patient_zip_code").unwrap().unwrap(), [""]);
}

#[test]
fn header_only_input_is_rejected() {
    let input = "message_id,patient_state\n";
    let error = read_report(input.as_bytes(), &schema(), client()).unwrap_err();
    assert!(error.to_string().contains("no rows"));
}

#[test]
fn written_reports_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    let input = "message_id,patient_state,patient_zip_code\n1,AZ,85001\n2,\"New, State\",\n";
    let report = read_report(input.as_bytes(), &schema(), client()).unwrap();

    let file = std::fs::File::create(&path).unwrap();
    write_report(file, &report).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("message_id,patient_state,patient_zip_code\n"));

    let reread = read_report_file(&path, &schema()).unwrap();
    assert_eq!(
        reread.column("patient_state").unwrap().unwrap(),
        ["AZ", "New, State"]
    );
    assert_eq!(reread.column("patient_zip_code").unwrap().unwrap(), ["85001", ""]);
}

#[test]
fn missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");
    let error = read_report_file(&path, &schema()).unwrap_err();
    assert!(format!("{error:#}").contains("absent.csv"));
}
