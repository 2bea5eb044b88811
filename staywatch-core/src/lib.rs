//! Logic lõi của dashboard ICU: tra cứu bệnh nhân và thang màu nguy cơ.

mod census;
mod config;
mod lookup;
mod model;
mod store;
mod theme;

pub mod risk;

pub use census::{CensusController, CensusState};
pub use config::DashboardConfig;
pub use lookup::{LookupController, LookupState, PatientSource};
pub use model::{parse_instant, PatientRecord, PatientSummary, RiskTrend, TrendPoint};
pub use risk::{
    band_for, color_for, gradient_stops, normalize, risk_band, Color, GradientSpec, GradientStop,
    RiskBand, RiskCategory, RiskError, RiskInput, RiskLevel, RiskSample,
};
pub use store::{CallToken, LoadState, LoadStatus, LookupErrorKind, StateView};
pub use theme::{ThemeMode, ThemeStore};
