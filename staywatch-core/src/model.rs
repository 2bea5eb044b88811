//! Hồ sơ bệnh nhân ICU và các chỉ số nguy cơ dẫn xuất.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::risk::{
    band_for, color_for, gradient_stops, normalize, percent_to_scale, risk_band, Color,
    GradientSpec, RiskBand, RiskCategory, RiskError, RiskInput, RiskLevel, RiskSample,
};

/// Một lượt nằm ICU, bất biến sau khi tải về.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    #[serde(deserialize_with = "identifier")]
    pub stay_id: String,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub subject_id: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "whole_number")]
    pub age: u32,
    #[serde(default, deserialize_with = "text")]
    pub gender: String,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub hadm_id: Option<String>,
    #[serde(default)]
    pub first_care_unit: Option<String>,
    #[serde(deserialize_with = "instant")]
    pub intime: DateTime<Utc>,
    #[serde(deserialize_with = "instant")]
    pub outtime: DateTime<Utc>,
    #[serde(rename = "los_hour_int")]
    pub los_hours: f64,
    pub will_be_readmitted: bool,
    /// Tỷ lệ tử vong theo phần trăm (0–100) như dịch vụ trả về.
    #[serde(default)]
    pub mortality_rate: Option<f64>,
}

impl PatientRecord {
    pub fn length_of_stay(&self) -> Duration {
        Duration::milliseconds((self.los_hours * 3_600_000.0).round() as i64)
    }

    pub fn readmission_risk(&self) -> RiskInput {
        RiskInput::Flag(self.will_be_readmitted)
    }

    /// Tỷ lệ tử vong quy về thang 0–10.
    pub fn mortality_risk(&self) -> Result<Option<RiskInput>, RiskError> {
        self.mortality_rate
            .map(|percent| percent_to_scale(percent).map(|level| RiskInput::Scale(level.value())))
            .transpose()
    }

    pub fn readmission_color(&self) -> Color {
        readmission_color(self.will_be_readmitted)
    }

    pub fn mortality_color(&self) -> Result<Option<Color>, RiskError> {
        self.mortality_risk()?
            .map(|input| normalize(input).map(color_for))
            .transpose()
    }
}

fn readmission_color(flag: bool) -> Color {
    // Cờ được quy về thang 0–10 trước, không tô màu trực tiếp.
    color_for(RiskLevel::from(flag))
}

/// Một dòng trong danh sách bệnh nhân đang nằm khoa.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientSummary {
    #[serde(deserialize_with = "identifier")]
    pub stay_id: String,
    #[serde(deserialize_with = "identifier")]
    pub subject_id: String,
    #[serde(default, deserialize_with = "optional_identifier")]
    pub hadm_id: Option<String>,
    #[serde(default)]
    pub first_care_unit: Option<String>,
    pub will_be_readmitted: bool,
}

impl PatientSummary {
    pub fn readmission_color(&self) -> Color {
        readmission_color(self.will_be_readmitted)
    }
}

/// Một dòng trong bảng xu hướng.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub date: String,
    pub value: RiskInput,
}

/// Chuỗi giá trị nguy cơ theo ngày, mới nhất đứng đầu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskTrend {
    pub category: RiskCategory,
    pub points: Vec<TrendPoint>,
}

impl RiskTrend {
    pub fn samples(&self) -> Vec<RiskSample> {
        self.points
            .iter()
            .map(|point| RiskSample {
                label: self.category,
                value: point.value,
            })
            .collect()
    }

    /// Màu nền cho từng dòng theo đúng thứ tự `points`.
    pub fn row_colors(&self) -> Result<Vec<Color>, RiskError> {
        self.points
            .iter()
            .map(|point| normalize(point.value).map(color_for))
            .collect()
    }

    pub fn gradient(&self) -> Result<GradientSpec, RiskError> {
        gradient_stops(&self.samples())
    }

    /// Dải badge cho từng dòng, tính trên giá trị như dịch vụ trả về:
    /// tử vong theo phần trăm, cờ tái nhập viện ở hai đầu dải.
    pub fn row_bands(&self) -> Vec<RiskBand> {
        self.points
            .iter()
            .map(|point| match (self.category, point.value) {
                (RiskCategory::Mortality, RiskInput::Scale(scale)) => risk_band(scale * 10.0),
                (_, value) => band_for(value),
            })
            .collect()
    }
}

// Cột số đi qua pandas có thể về dạng float (`30057454.0`, `53.0`).
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Integer(i64),
    Float(f64),
}

impl RawNumber {
    fn whole(self) -> Option<i64> {
        match self {
            RawNumber::Integer(number) => Some(number),
            RawNumber::Float(number)
                if number.is_finite()
                    && number.fract() == 0.0
                    && number.abs() < i64::MAX as f64 =>
            {
                Some(number as i64)
            }
            RawNumber::Float(_) => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIdentifier {
    Text(String),
    Number(RawNumber),
}

impl RawIdentifier {
    fn into_string<E: serde::de::Error>(self) -> Result<String, E> {
        match self {
            RawIdentifier::Text(text) => Ok(text),
            RawIdentifier::Number(number) => number
                .whole()
                .map(|whole| whole.to_string())
                .ok_or_else(|| E::custom("identifier is not a whole number")),
        }
    }
}

fn identifier<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawIdentifier::deserialize(deserializer)?.into_string()
}

fn optional_identifier<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawIdentifier>::deserialize(deserializer)?
        .map(RawIdentifier::into_string)
        .transpose()
}

fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    RawNumber::deserialize(deserializer)?
        .whole()
        .and_then(|whole| u32::try_from(whole).ok())
        .ok_or_else(|| serde::de::Error::custom("expected a non-negative whole number"))
}

// `null` cho tên hoặc giới tính được hiển thị như chuỗi rỗng.
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// RFC 3339, hoặc dạng không múi giờ (coi là UTC) như dữ liệu MIMIC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(raw, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}

fn instant<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid instant: {raw}")))
}
