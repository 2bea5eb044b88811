//! Ánh xạ mức nguy cơ sang màu trên dải xanh lá → đỏ.
//!
//! Mọi giá trị nguy cơ (cờ boolean hoặc thang 0–10) đều phải đi qua
//! [`normalize`] trước khi tô màu, để "đỏ" mang cùng một ý nghĩa ở mọi nơi.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Giá trị tối đa của thang nguy cơ nội bộ.
pub const RISK_SCALE_MAX: f64 = 10.0;
/// Hue của đầu "nguy cơ thấp" (xanh lá).
pub const LOW_RISK_HUE: f64 = 120.0;
/// Hue của đầu "nguy cơ cao" (đỏ).
pub const HIGH_RISK_HUE: f64 = 0.0;

/// Tín hiệu nguy cơ thô: cờ boolean hoặc số trên thang 0–10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RiskInput {
    Flag(bool),
    Scale(f64),
}

impl From<bool> for RiskInput {
    fn from(flag: bool) -> Self {
        RiskInput::Flag(flag)
    }
}

impl From<f64> for RiskInput {
    fn from(value: f64) -> Self {
        RiskInput::Scale(value)
    }
}

/// Loại nguy cơ được hiển thị.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    Readmission,
    Mortality,
}

impl RiskCategory {
    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::Readmission => "Readmission Likelihood",
            RiskCategory::Mortality => "Mortality Rate",
        }
    }
}

/// Lỗi lập trình: giá trị nằm ngoài thang đã quy ước.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RiskError {
    #[error("Risk value {0} is outside the allowed range")]
    OutOfRange(f64),
}

/// Giá trị nguy cơ đã chuẩn hóa, luôn nằm trong `[0, 10]`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, PartialOrd)]
#[serde(transparent)]
pub struct RiskLevel(f64);

impl RiskLevel {
    pub const MIN: RiskLevel = RiskLevel(0.0);
    pub const MAX: RiskLevel = RiskLevel(RISK_SCALE_MAX);

    pub fn new(value: f64) -> Result<Self, RiskError> {
        if (0.0..=RISK_SCALE_MAX).contains(&value) {
            Ok(RiskLevel(value))
        } else {
            Err(RiskError::OutOfRange(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<bool> for RiskLevel {
    fn from(flag: bool) -> Self {
        if flag {
            RiskLevel::MAX
        } else {
            RiskLevel::MIN
        }
    }
}

/// Đưa mọi tín hiệu nguy cơ về thang 0–10: `true → 10`, `false → 0`,
/// số được giữ nguyên nếu nằm trong thang.
pub fn normalize(input: impl Into<RiskInput>) -> Result<RiskLevel, RiskError> {
    match input.into() {
        RiskInput::Flag(flag) => Ok(RiskLevel::from(flag)),
        RiskInput::Scale(value) => RiskLevel::new(value),
    }
}

/// Màu HSL; `saturation` và `lightness` tính theo phần trăm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Color {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Color {
    pub const LOW_RISK: Color = Color::hsl(LOW_RISK_HUE, 100.0, 50.0);
    pub const HIGH_RISK: Color = Color::hsl(HIGH_RISK_HUE, 100.0, 50.0);

    pub const fn hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    pub fn to_rgb(self) -> (u8, u8, u8) {
        let s = self.saturation / 100.0;
        let l = self.lightness / 100.0;
        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let sector = self.hue.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
        let (r, g, b) = match sector as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    pub fn to_hex(self) -> String {
        let (r, g, b) = self.to_rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            round2(self.hue),
            round2(self.saturation),
            round2(self.lightness)
        )
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Nội suy tuyến tính hue từ 120° (xanh) đến 0° (đỏ) theo `value / 10`.
pub fn color_for(level: RiskLevel) -> Color {
    let fraction = level.value() / RISK_SCALE_MAX;
    let hue = LOW_RISK_HUE + (HIGH_RISK_HUE - LOW_RISK_HUE) * fraction;
    Color::hsl(hue, 100.0, 50.0)
}

/// Dải rời rạc dùng cho badge; thô hơn [`color_for`] và không thay thế nó.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn css_class(self) -> &'static str {
        match self {
            RiskBand::Low => "risk-low",
            RiskBand::Medium => "risk-medium",
            RiskBand::High => "risk-high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::Low => "Low",
            RiskBand::Medium => "Medium",
            RiskBand::High => "High",
        }
    }
}

/// Phân loại ba dải trên giá trị thô: `≤ 6` thấp, `(6, 11]` trung bình, `> 11` cao.
pub fn risk_band(value: f64) -> RiskBand {
    if value > 11.0 {
        RiskBand::High
    } else if value > 6.0 {
        RiskBand::Medium
    } else {
        RiskBand::Low
    }
}

/// Dải cho một đầu vào chưa chuẩn hoá: cờ nằm ở hai đầu, số đi qua `risk_band`.
pub fn band_for(input: RiskInput) -> RiskBand {
    match input {
        RiskInput::Flag(true) => RiskBand::High,
        RiskInput::Flag(false) => RiskBand::Low,
        RiskInput::Scale(value) => risk_band(value),
    }
}

/// Đổi tỷ lệ phần trăm (0–100) sang thang nội bộ 0–10.
pub fn percent_to_scale(percent: f64) -> Result<RiskLevel, RiskError> {
    if !(0.0..=100.0).contains(&percent) {
        return Err(RiskError::OutOfRange(percent));
    }
    RiskLevel::new(percent / 10.0)
}

/// Đổi ngược thang nội bộ sang phần trăm để hiển thị.
pub fn scale_to_percent(level: RiskLevel) -> f64 {
    level.value() * 10.0
}

/// Một mẫu nguy cơ trong chuỗi xu hướng.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RiskSample {
    pub label: RiskCategory,
    pub value: RiskInput,
}

/// Một điểm dừng của gradient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradientStop {
    /// Vị trí theo phần trăm trong `[0, 100]`.
    pub offset: f64,
    pub color: Color,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GradientSpec {
    pub stops: Vec<GradientStop>,
}

impl GradientSpec {
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Chuỗi `linear-gradient(...)` cho CSS. Gradient rỗng không vẽ gì;
    /// một điểm dừng được kéo dài thành màu đặc.
    pub fn to_css(&self, direction: &str) -> Option<String> {
        let stops = match self.stops.as_slice() {
            [] => return None,
            [only] => format!("{} 0%, {} 100%", only.color, only.color),
            many => many
                .iter()
                .map(|stop| format!("{} {}%", stop.color, round2(stop.offset)))
                .collect::<Vec<_>>()
                .join(", "),
        };
        Some(format!("linear-gradient({direction}, {stops})"))
    }
}

/// Một điểm dừng cho mỗi mẫu, offset chia đều theo vị trí (không theo giá trị).
pub fn gradient_stops(samples: &[RiskSample]) -> Result<GradientSpec, RiskError> {
    let last = samples.len().saturating_sub(1);
    let stops = samples
        .iter()
        .enumerate()
        .map(|(index, sample)| {
            let offset = if last == 0 {
                0.0
            } else {
                index as f64 * 100.0 / last as f64
            };
            Ok(GradientStop {
                offset,
                color: color_for(normalize(sample.value)?),
            })
        })
        .collect::<Result<Vec<_>, RiskError>>()?;
    Ok(GradientSpec { stops })
}

/// Chú giải cố định "Low Risk → High Risk".
pub fn legend() -> GradientSpec {
    GradientSpec {
        stops: vec![
            GradientStop {
                offset: 0.0,
                color: Color::LOW_RISK,
            },
            GradientStop {
                offset: 100.0,
                color: Color::HIGH_RISK,
            },
        ],
    }
}
