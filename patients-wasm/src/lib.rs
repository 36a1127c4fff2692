//! Bridge WASM <-> JavaScript cho lớp hiển thị danh sách bệnh nhân.

use patients_core::{filter_by_age, AgeRange, PatientRow, RosterConfig, RosterError, RosterView};
use serde::Deserialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct JsRosterConfig {
    #[serde(default)]
    placeholder: Option<String>,
    #[serde(default)]
    empty_label: Option<String>,
    #[serde(default)]
    initial_age_range: Option<[i32; 2]>,
}

impl TryFrom<JsRosterConfig> for RosterConfig {
    type Error = RosterError;

    fn try_from(cfg: JsRosterConfig) -> Result<Self, Self::Error> {
        let mut base = RosterConfig::default();
        if let Some(placeholder) = cfg.placeholder {
            base.placeholder = placeholder;
        }
        if let Some(label) = cfg.empty_label {
            base.empty_label = label;
        }
        if let Some(range) = cfg.initial_age_range {
            base.initial_age_range = AgeRange::try_from(range)?;
        }
        Ok(base)
    }
}

/// Chuẩn hóa bundle FHIR thành mảng dòng bệnh nhân.
#[wasm_bindgen]
pub fn normalize_bundle(input_bundle: JsValue) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let rows = read_rows_from_bundle(input_bundle)?;
    to_value(&rows).map_err(|err| JsValue::from_str(&format!("Không serialize được dòng: {err}")))
}

/// Lọc mảng dòng đã chuẩn hóa theo khoảng tuổi `[min, max]`.
///
/// Luôn truyền mảng gốc do `normalize_bundle` trả về.
#[wasm_bindgen]
pub fn filter_rows(rows: JsValue, min: i32, max: i32) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let rows: Vec<PatientRow> = from_value(rows)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được mảng dòng: {err}")))?;
    let range = AgeRange::new(min, max).map_err(format_roster_error)?;

    to_value(&filter_by_age(&rows, range))
        .map_err(|err| JsValue::from_str(&format!("Không serialize được dòng: {err}")))
}

/// Chuẩn hóa bundle và trả về ảnh chụp bảng với khoảng tuổi cấu hình.
#[wasm_bindgen]
pub fn roster_snapshot(input_bundle: JsValue, config: Option<JsValue>) -> Result<JsValue, JsValue> {
    install_panic_hook();

    let cfg = match config {
        Some(js_cfg) => {
            let cfg: JsRosterConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}")))?;
            RosterConfig::try_from(cfg).map_err(format_roster_error)?
        }
        None => RosterConfig::default(),
    };

    let rows = read_rows_from_bundle(input_bundle)?;
    let mut view = RosterView::new(&cfg);
    view.load(rows);

    to_value(&view.snapshot())
        .map_err(|err| JsValue::from_str(&format!("Không serialize được snapshot: {err}")))
}

fn read_rows_from_bundle(input_bundle: JsValue) -> Result<Vec<PatientRow>, JsValue> {
    if input_bundle.is_null() || input_bundle.is_undefined() {
        return Err(format_roster_error(RosterError::NoData));
    }

    let bundle_value = from_value::<serde_json::Value>(input_bundle)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được JSON bundle: {err}")))?;

    patients_fhir::normalize_bundle_value(&bundle_value).map_err(format_roster_error)
}

fn install_panic_hook() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn format_roster_error(err: RosterError) -> JsValue {
    JsValue::from_str(&format!("Roster error: {err}"))
}
