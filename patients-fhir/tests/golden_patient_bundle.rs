use std::fs;

use chrono::NaiveDate;
use patients_core::{AgeRange, PatientRow, RosterView};
use patients_fhir::normalize_bundle_str_at;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn fixture_path(name: &str) -> String {
    format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR"))
}

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn load_rows() -> Vec<PatientRow> {
    let bundle = fs::read_to_string(fixture_path("hapi_patient_bundle.json"))
        .expect("Could not read sample bundle");
    normalize_bundle_str_at(&bundle, reference_date()).expect("Could not normalize bundle")
}

#[test]
fn patient_bundle_matches_golden() {
    let actual = serde_json::to_value(load_rows()).expect("Could not serialize rows");

    let expected = fs::read_to_string(fixture_path("hapi_patient_rows.json"))
        .expect("Could not read golden rows");
    let expected: Value = serde_json::from_str(&expected).expect("Golden rows are not valid JSON");

    assert_eq!(actual, expected);
}

#[test]
fn golden_rows_filter_by_age() {
    let mut view = RosterView::default();
    view.load(load_rows());

    let ids: Vec<_> = view.visible_rows().filter_map(|row| row.id.clone()).collect();
    assert_eq!(ids, vec!["592912", "592914"]);

    view.apply_range(AgeRange::new(0, 20).unwrap());
    let ids: Vec<_> = view.visible_rows().filter_map(|row| row.id.clone()).collect();
    assert_eq!(ids, vec!["592914"]);
}
