use chrono::NaiveDate;
use patients_fhir::{age_of, normalize_at, RawPatientResource};
use proptest::prelude::*;

fn arb_resource() -> impl Strategy<Value = RawPatientResource> {
    (
        proptest::option::of("[a-z0-9]{1,8}"),
        proptest::option::of(prop::collection::vec("[A-Z][a-z]{0,6}", 0..3)),
        proptest::option::of(prop_oneof![
            Just("male".to_string()),
            Just("female".to_string()),
            Just(String::new()),
        ]),
        proptest::option::of(prop_oneof![
            (1900i32..2024, 1u32..=12, 1u32..=28)
                .prop_map(|(y, m, d)| format!("{y:04}-{m:02}-{d:02}")),
            (1900i32..2024).prop_map(|y| y.to_string()),
            Just("garbage".to_string()),
        ]),
        proptest::option::of("[A-Z][a-z]{2,8}"),
    )
        .prop_map(|(id, given, gender, birth_date, city)| RawPatientResource {
            id,
            given,
            gender,
            birth_date,
            city,
            phone: None,
        })
}

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

proptest! {
    #[test]
    fn one_row_per_resource_in_order(resources in prop::collection::vec(arb_resource(), 0..30)) {
        let rows = normalize_at(&resources, reference_date());
        prop_assert_eq!(rows.len(), resources.len());
        for (row, resource) in rows.iter().zip(&resources) {
            prop_assert_eq!(&row.id, &resource.id);
        }
    }

    #[test]
    fn missing_birth_date_means_missing_age(resources in prop::collection::vec(arb_resource(), 0..30)) {
        let rows = normalize_at(&resources, reference_date());
        for (row, resource) in rows.iter().zip(&resources) {
            if resource.birth_date.is_none() {
                prop_assert_eq!(row.age, None);
                prop_assert_eq!(&row.birthdate, &None);
            }
            prop_assert_eq!(row.age.is_some(), row.birthdate.is_some());
            prop_assert_eq!(row.age, age_of(resource.birth_date.as_deref(), reference_date()));
        }
    }

    #[test]
    fn normalization_is_idempotent(resources in prop::collection::vec(arb_resource(), 0..30)) {
        prop_assert_eq!(
            normalize_at(&resources, reference_date()),
            normalize_at(&resources, reference_date())
        );
    }
}
