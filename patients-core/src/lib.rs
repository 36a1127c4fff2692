//! Mô hình dữ liệu lõi cho danh sách bệnh nhân và bộ lọc theo khoảng tuổi.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

mod view;

pub use view::{RosterSnapshot, RosterStatus, RosterView};

/// Miền giá trị của thanh trượt tuổi (bao gồm hai đầu).
pub const AGE_DOMAIN: (i32, i32) = (0, 100);

/// Các vạch chia cố định trên thanh trượt tuổi.
pub const AGE_SLIDER_MARKS: [i32; 6] = [0, 20, 40, 60, 80, 100];

pub const DEFAULT_PLACEHOLDER: &str = "N/A";
pub const DEFAULT_EMPTY_LABEL: &str = "No Record Found";

/// Cấu hình hiển thị và khoảng tuổi ban đầu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RosterConfig {
    /// Chuỗi thay thế cho ô không có giá trị.
    pub placeholder: String,
    /// Nhãn hiển thị khi không có bản ghi nào.
    pub empty_label: String,
    /// Khoảng tuổi áp dụng trước khi người dùng thao tác.
    pub initial_age_range: AgeRange,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            empty_label: DEFAULT_EMPTY_LABEL.to_string(),
            initial_age_range: AgeRange::default(),
        }
    }
}

/// Một dòng bệnh nhân đã chuẩn hóa, sẵn sàng hiển thị.
///
/// `id`, `name` và `age` bị bỏ khỏi JSON khi vắng mặt; các trường còn lại
/// được ghi thành `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub gender: Option<String>,
    /// Ngày sinh dạng `yyyy-MM-dd`.
    pub birthdate: Option<String>,
    /// Tuổi tính theo hiệu số năm dương lịch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    pub address: Option<String>,
    pub phone_no: Option<String>,
}

impl PatientRow {
    /// Giá trị thô của một cột, `None` nếu trường vắng mặt.
    pub fn cell(&self, column: Column) -> Option<&str> {
        let value = match column {
            Column::Id => &self.id,
            Column::Name => &self.name,
            Column::Gender => &self.gender,
            Column::BirthDate => &self.birthdate,
            Column::Address => &self.address,
            Column::Phone => &self.phone_no,
        };
        value.as_deref()
    }

    /// Giá trị hiển thị của một cột; trường vắng mặt hoặc chuỗi rỗng dùng `placeholder`.
    pub fn display_cell<'a>(&'a self, column: Column, placeholder: &'a str) -> &'a str {
        self.cell(column)
            .filter(|value| !value.is_empty())
            .unwrap_or(placeholder)
    }

    /// Toàn bộ ô hiển thị theo thứ tự [`Column::ALL`].
    pub fn display_cells<'a>(&'a self, placeholder: &'a str) -> [&'a str; 6] {
        Column::ALL.map(|column| self.display_cell(column, placeholder))
    }
}

/// Các cột cố định của bảng bệnh nhân.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Name,
    Gender,
    #[serde(rename = "birthdate")]
    BirthDate,
    Address,
    #[serde(rename = "phone_no")]
    Phone,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Id,
        Column::Name,
        Column::Gender,
        Column::BirthDate,
        Column::Address,
        Column::Phone,
    ];

    /// Tên trường tương ứng trong [`PatientRow`].
    pub fn field(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Name => "name",
            Column::Gender => "gender",
            Column::BirthDate => "birthdate",
            Column::Address => "address",
            Column::Phone => "phone_no",
        }
    }

    /// Tiêu đề cột.
    pub fn label(self) -> &'static str {
        match self {
            Column::Id => "Id",
            Column::Name => "Name",
            Column::Gender => "Gender",
            Column::BirthDate => "BirthDate",
            Column::Address => "Address",
            Column::Phone => "Phone",
        }
    }
}

/// Khoảng tuổi `[min, max]`, bao gồm hai đầu, luôn nằm trong [`AGE_DOMAIN`].
///
/// Chỉ tạo được qua [`AgeRange::new`] hoặc `TryFrom<[i32; 2]>`, nên mọi giá trị
/// tồn tại đều hợp lệ.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "[i32; 2]", into = "[i32; 2]")]
pub struct AgeRange {
    min: i32,
    max: i32,
}

impl AgeRange {
    pub const FULL: AgeRange = AgeRange {
        min: AGE_DOMAIN.0,
        max: AGE_DOMAIN.1,
    };

    /// Kiểm tra và tạo khoảng tuổi; trả về `InvalidRange` nếu ngoài miền hoặc `min > max`.
    pub fn new(min: i32, max: i32) -> Result<Self, RosterError> {
        if min < AGE_DOMAIN.0 || max > AGE_DOMAIN.1 || min > max {
            return Err(RosterError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    /// Tuổi vắng mặt không bao giờ khớp, kể cả với khoảng đầy đủ.
    pub fn contains(&self, age: Option<i32>) -> bool {
        age.is_some_and(|age| self.min <= age && age <= self.max)
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<[i32; 2]> for AgeRange {
    type Error = RosterError;

    fn try_from([min, max]: [i32; 2]) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<AgeRange> for [i32; 2] {
    fn from(range: AgeRange) -> Self {
        [range.min, range.max]
    }
}

/// Lọc các dòng theo khoảng tuổi, giữ nguyên thứ tự.
///
/// Luôn truyền tập dòng gốc (canonical), không truyền kết quả của lần lọc trước.
pub fn filter_by_age(rows: &[PatientRow], range: AgeRange) -> Vec<&PatientRow> {
    matching_indices(rows, range)
        .filter_map(|index| rows.get(index))
        .collect()
}

/// Chỉ số (theo thứ tự tăng dần) của các dòng nằm trong khoảng tuổi.
pub fn matching_indices(
    rows: &[PatientRow],
    range: AgeRange,
) -> impl Iterator<Item = usize> + '_ {
    rows.iter()
        .enumerate()
        .filter(move |(_, row)| range.contains(row.age))
        .map(|(index, _)| index)
}

/// Tập dòng gốc bất biến, gắn với số phiên bản của lần nạp dữ liệu.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRows {
    version: u64,
    rows: Arc<[PatientRow]>,
}

impl CanonicalRows {
    pub fn new(version: u64, rows: Vec<PatientRow>) -> Self {
        Self {
            version,
            rows: rows.into(),
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rows(&self) -> &[PatientRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Áp dụng [`filter_by_age`] trên tập gốc.
    pub fn filter(&self, range: AgeRange) -> Vec<&PatientRow> {
        filter_by_age(&self.rows, range)
    }

    pub fn matching_indices(&self, range: AgeRange) -> Vec<usize> {
        matching_indices(&self.rows, range).collect()
    }
}

/// Lỗi chung khi nạp hoặc lọc danh sách bệnh nhân.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("Không có dữ liệu bệnh nhân")]
    NoData,
    #[error("Không đọc được dữ liệu: {0}")]
    Parse(String),
    #[error("Khoảng tuổi không hợp lệ: [{min}, {max}]")]
    InvalidRange { min: i32, max: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_render_placeholder() {
        let row = PatientRow {
            id: Some("7".to_string()),
            gender: Some(String::new()),
            ..PatientRow::default()
        };

        assert_eq!(
            row.display_cells(DEFAULT_PLACEHOLDER),
            ["7", "N/A", "N/A", "N/A", "N/A", "N/A"]
        );
    }

    #[test]
    fn column_fields_match_row_keys() {
        let row = PatientRow {
            id: Some("1".to_string()),
            name: Some("Ana".to_string()),
            gender: Some("female".to_string()),
            birthdate: Some("1990-06-01".to_string()),
            age: Some(34),
            address: Some("Hanoi".to_string()),
            phone_no: Some("555".to_string()),
        };
        let value = serde_json::to_value(&row).unwrap();

        for column in Column::ALL {
            assert_eq!(value[column.field()].as_str(), row.cell(column));
        }
    }

    #[test]
    fn full_range_still_rejects_missing_age() {
        assert!(!AgeRange::FULL.contains(None));
        assert!(AgeRange::FULL.contains(Some(0)));
        assert!(AgeRange::FULL.contains(Some(100)));
        assert!(!AgeRange::FULL.contains(Some(-1)));
    }
}
