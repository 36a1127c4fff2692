//! FHIR Patient bundle to `PatientRow` converter.

use chrono::{Datelike, NaiveDate, Utc};
use patients_core::{PatientRow, RosterError};
use serde_json::Value;

/// Normalize a bundle from a JSON string, using today's date for ages.
pub fn normalize_bundle_str(bundle_json: &str) -> Result<Vec<PatientRow>, RosterError> {
    normalize_bundle_str_at(bundle_json, today())
}

/// Normalize a bundle from a JSON string with an explicit reference date.
pub fn normalize_bundle_str_at(
    bundle_json: &str,
    today: NaiveDate,
) -> Result<Vec<PatientRow>, RosterError> {
    let value: Value =
        serde_json::from_str(bundle_json).map_err(|err| RosterError::Parse(err.to_string()))?;
    normalize_bundle_value_at(&value, today)
}

/// Normalize a bundle from a `serde_json::Value`, using today's date for ages.
pub fn normalize_bundle_value(bundle: &Value) -> Result<Vec<PatientRow>, RosterError> {
    normalize_bundle_value_at(bundle, today())
}

pub fn normalize_bundle_value_at(
    bundle: &Value,
    today: NaiveDate,
) -> Result<Vec<PatientRow>, RosterError> {
    let resources = bundle_resources(bundle)?;
    Ok(normalize_at(&resources, today))
}

/// Extract one `RawPatientResource` per bundle entry, in bundle order.
///
/// A missing `entry` key means the search matched nothing. Entries without a
/// `resource` object still produce an (empty) resource so that row count always
/// equals entry count.
pub fn bundle_resources(bundle: &Value) -> Result<Vec<RawPatientResource>, RosterError> {
    if !bundle.is_object() {
        return Err(RosterError::NoData);
    }

    if let Some(bundle_type) = bundle.get("resourceType").and_then(Value::as_str) {
        if bundle_type != "Bundle" {
            return Err(RosterError::Parse(format!(
                "Expected resourceType Bundle, received {bundle_type}"
            )));
        }
    }

    let entries = match bundle.get("entry") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(_) => {
            return Err(RosterError::Parse(
                "Bundle entry must be an array".to_string(),
            ));
        }
    };

    Ok(entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry.get("resource") {
            Some(resource) if resource.is_object() => RawPatientResource::from_value(resource),
            _ => {
                log::warn!("Bundle entry {index} has no resource");
                RawPatientResource::default()
            }
        })
        .collect())
}

/// The subset of a FHIR Patient that the roster consumes.
///
/// Fields of an unexpected JSON type are read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPatientResource {
    pub id: Option<String>,
    /// `given` parts of the first `name` entry; `None` if there is no first
    /// entry or it carries no `given` array.
    pub given: Option<Vec<String>>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    /// `city` of the first `address` entry.
    pub city: Option<String>,
    /// `value` of the first `telecom` entry.
    pub phone: Option<String>,
}

impl RawPatientResource {
    pub fn from_value(resource: &Value) -> Self {
        if let Some(resource_type) = resource.get("resourceType").and_then(Value::as_str) {
            if resource_type != "Patient" {
                log::debug!("Normalizing non-Patient resource {resource_type}");
            }
        }

        Self {
            id: string_field(resource, "id"),
            given: first_entry(resource, "name")
                .and_then(|name| name.get("given"))
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                }),
            gender: string_field(resource, "gender"),
            birth_date: string_field(resource, "birthDate"),
            city: first_entry(resource, "address")
                .and_then(|address| string_field(address, "city")),
            phone: first_entry(resource, "telecom")
                .and_then(|telecom| string_field(telecom, "value")),
        }
    }
}

/// Normalize resources into rows, one per resource, using today's date for ages.
pub fn normalize(resources: &[RawPatientResource]) -> Vec<PatientRow> {
    normalize_at(resources, today())
}

pub fn normalize_at(resources: &[RawPatientResource], today: NaiveDate) -> Vec<PatientRow> {
    let rows: Vec<PatientRow> = resources
        .iter()
        .map(|resource| normalize_resource(resource, today))
        .collect();
    log::debug!("Normalized {} patient rows", rows.len());
    rows
}

pub fn normalize_resource(resource: &RawPatientResource, today: NaiveDate) -> PatientRow {
    if resource.id.as_deref().map_or(true, str::is_empty) {
        log::warn!("Patient resource without id");
    }

    let birth_date = resource.birth_date.as_deref();
    let birthdate = present_birth_date(birth_date).and_then(|value| {
        let parsed = parse_birth_date(value);
        if parsed.is_none() {
            log::warn!(
                "Unreadable birthDate {value:?} on patient {}",
                resource.id.as_deref().unwrap_or("<no id>")
            );
        }
        parsed.map(format_birthdate)
    });

    PatientRow {
        id: resource.id.clone(),
        name: resource
            .given
            .as_ref()
            .filter(|parts| !parts.is_empty())
            .map(|parts| parts.join(" ")),
        gender: resource.gender.clone().filter(|gender| !gender.is_empty()),
        birthdate,
        age: age_of(birth_date, today),
        address: resource.city.clone(),
        phone_no: resource.phone.clone(),
    }
}

/// Age as the difference of calendar years between `today` and the birth date.
///
/// Month and day are ignored, so the result overstates the exact age by one
/// until the birthday has passed in the reference year. Absent, empty or
/// unreadable dates give `None`.
pub fn age_of(birth_date: Option<&str>, today: NaiveDate) -> Option<i32> {
    parse_birth_date(present_birth_date(birth_date)?).map(|date| year_difference(date, today))
}

fn present_birth_date(birth_date: Option<&str>) -> Option<&str> {
    birth_date.filter(|value| !value.trim().is_empty())
}

/// Parse a FHIR `date` (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) or the date part of a
/// `dateTime`. Missing month and day default to `01`.
pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    match value.len() {
        4 if value.bytes().all(|b| b.is_ascii_digit()) => value
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        7 => NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").ok(),
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        len if len > 10 && value.as_bytes()[10] == b'T' => {
            NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

pub fn format_birthdate(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn year_difference(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    today.year() - birth_date.year()
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn first_entry<'a>(resource: &'a Value, key: &str) -> Option<&'a Value> {
    resource.get(key)?.as_array()?.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_ignores_month_and_day() {
        let today = date(2024, 1, 1);
        assert_eq!(age_of(Some("1990-12-31"), today), Some(34));
        assert_eq!(age_of(Some("1990-01-01"), today), Some(34));
    }

    #[test]
    fn age_is_absent_without_birth_date() {
        let today = date(2024, 6, 1);
        assert_eq!(age_of(None, today), None);
        assert_eq!(age_of(Some(""), today), None);
        assert_eq!(age_of(Some("not-a-date"), today), None);
    }

    #[test]
    fn reduced_precision_dates_parse() {
        assert_eq!(parse_birth_date("1987"), Some(date(1987, 1, 1)));
        assert_eq!(parse_birth_date("1987-04"), Some(date(1987, 4, 1)));
        assert_eq!(
            parse_birth_date("1987-04-12T08:30:00Z"),
            Some(date(1987, 4, 12))
        );
        assert_eq!(parse_birth_date("1987-13-01"), None);
        assert_eq!(parse_birth_date("87"), None);
    }

    #[test]
    fn wrong_field_types_are_read_as_absent() {
        let resource = serde_json::json!({
            "id": 42,
            "name": [{ "given": "Ana" }],
            "gender": ["female"],
            "address": { "city": "Hue" },
            "telecom": [{ "value": 5551234 }]
        });

        assert_eq!(
            RawPatientResource::from_value(&resource),
            RawPatientResource::default()
        );
    }
}
