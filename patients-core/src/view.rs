//! Trạng thái bảng: tập dòng gốc, khoảng tuổi hiện tại và tập dòng đang hiển thị.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AgeRange, CanonicalRows, PatientRow, RosterConfig, RosterError, AGE_DOMAIN, AGE_SLIDER_MARKS,
};

/// Trạng thái hiển thị của bảng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RosterStatus {
    /// Chưa có dữ liệu; yêu cầu lọc được giữ lại tới khi nạp xong.
    Loading,
    /// Có dữ liệu nhưng không dòng nào khớp (hoặc bundle rỗng).
    NoRecords,
    Ready { visible: usize, total: usize },
}

/// Ảnh chụp trạng thái để chuyển cho lớp hiển thị.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RosterSnapshot {
    pub generated_at: DateTime<Utc>,
    pub version: Option<u64>,
    pub age_range: AgeRange,
    /// Miền của thanh trượt, `[min, max]`.
    pub domain: [i32; 2],
    /// Vạch chia của thanh trượt.
    pub marks: [i32; 6],
    pub status: RosterStatus,
    pub rows: Vec<PatientRow>,
}

/// Pipeline tính lại tập hiển thị mỗi khi dữ liệu hoặc khoảng tuổi thay đổi.
///
/// Tập hiển thị được lưu dưới dạng chỉ số vào tập gốc và luôn được dựng lại
/// từ tập gốc, không bao giờ từ kết quả lọc trước đó.
#[derive(Debug, Clone)]
pub struct RosterView {
    canonical: Option<CanonicalRows>,
    range: AgeRange,
    visible: Vec<usize>,
    loads: u64,
}

impl RosterView {
    pub fn new(config: &RosterConfig) -> Self {
        Self {
            canonical: None,
            range: config.initial_age_range,
            visible: Vec::new(),
            loads: 0,
        }
    }

    /// Nạp tập dòng gốc mới và trả về số phiên bản của nó.
    pub fn load(&mut self, rows: Vec<PatientRow>) -> u64 {
        self.loads += 1;
        self.canonical = Some(CanonicalRows::new(self.loads, rows));
        self.recompute();
        self.loads
    }

    /// Đổi khoảng tuổi. Khoảng không hợp lệ bị từ chối và khoảng cũ được giữ nguyên.
    pub fn set_age_range(&mut self, min: i32, max: i32) -> Result<(), RosterError> {
        let range = AgeRange::new(min, max).inspect_err(|err| {
            log::warn!("{err}; giữ khoảng [{}, {}]", self.range.min(), self.range.max());
        })?;
        self.apply_range(range);
        Ok(())
    }

    pub fn apply_range(&mut self, range: AgeRange) {
        self.range = range;
        self.recompute();
    }

    pub fn age_range(&self) -> AgeRange {
        self.range
    }

    pub fn canonical(&self) -> Option<&CanonicalRows> {
        self.canonical.as_ref()
    }

    pub fn version(&self) -> Option<u64> {
        self.canonical.as_ref().map(CanonicalRows::version)
    }

    /// Các dòng đang hiển thị, theo thứ tự của tập gốc.
    pub fn visible_rows(&self) -> impl Iterator<Item = &PatientRow> + '_ {
        let rows = self.canonical.as_ref().map(CanonicalRows::rows).unwrap_or(&[]);
        self.visible.iter().filter_map(move |&index| rows.get(index))
    }

    pub fn status(&self) -> RosterStatus {
        match &self.canonical {
            None => RosterStatus::Loading,
            Some(_) if self.visible.is_empty() => RosterStatus::NoRecords,
            Some(canonical) => RosterStatus::Ready {
                visible: self.visible.len(),
                total: canonical.len(),
            },
        }
    }

    pub fn snapshot(&self) -> RosterSnapshot {
        RosterSnapshot {
            generated_at: Utc::now(),
            version: self.version(),
            age_range: self.range,
            domain: [AGE_DOMAIN.0, AGE_DOMAIN.1],
            marks: AGE_SLIDER_MARKS,
            status: self.status(),
            rows: self.visible_rows().cloned().collect(),
        }
    }

    fn recompute(&mut self) {
        let Some(canonical) = &self.canonical else {
            log::debug!(
                "Chưa có dữ liệu, hoãn lọc khoảng [{}, {}]",
                self.range.min(),
                self.range.max()
            );
            self.visible.clear();
            return;
        };

        let range = self.range;
        self.visible = canonical.matching_indices(range);

        log::debug!(
            "v{}: khoảng [{}, {}] hiển thị {}/{} dòng",
            canonical.version(),
            range.min(),
            range.max(),
            self.visible.len(),
            canonical.len()
        );
    }
}

impl Default for RosterView {
    fn default() -> Self {
        Self::new(&RosterConfig::default())
    }
}
