//! Cấu hình dashboard, dùng chung cho CLI và mọi lối vào JavaScript.

use serde::{Deserialize, Serialize};

/// Cấu hình kết nối tới dịch vụ dữ liệu bệnh nhân.
///
/// Khoá dạng camelCase (`serviceUrl`, `censusAsOf`, ...) như object JS truyền
/// vào; các trường thiếu khi deserialize lấy giá trị mặc định.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Gốc URL của dịch vụ, ví dụ `http://127.0.0.1:8000`.
    pub service_url: String,
    /// Đường dẫn tra cứu một bệnh nhân; stay id được nối thêm làm segment cuối.
    pub patient_path: String,
    /// Đường dẫn danh sách bệnh nhân đang nằm khoa.
    pub census_path: String,
    /// Mốc thời gian của danh sách (dữ liệu MIMIC dịch chuyển thời gian).
    pub census_as_of: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            service_url: "http://127.0.0.1:8000".to_string(),
            patient_path: "api/v1/patient".to_string(),
            census_path: "api/v1/current-patients".to_string(),
            census_as_of: "2131-01-11 04:20:05".to_string(),
        }
    }
}
