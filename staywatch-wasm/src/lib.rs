//! Bridge WASM <-> JavaScript trung lập framework.

use serde_wasm_bindgen::{from_value, to_value};
use staywatch_core::risk::{color_for, gradient_stops, normalize, risk_band, RiskInput, RiskSample};
use wasm_bindgen::prelude::*;

/// Màu `hsl(...)` cho một giá trị nguy cơ (boolean hoặc số 0–10).
#[wasm_bindgen(js_name = riskColor)]
pub fn risk_color(value: JsValue) -> Result<String, JsValue> {
    let input: RiskInput = from_value(value)
        .map_err(|err| JsValue::from_str(&format!("Giá trị nguy cơ không hợp lệ: {err}")))?;
    let level = normalize(input).map_err(|err| JsValue::from_str(&err.to_string()))?;
    Ok(color_for(level).to_string())
}

/// Gradient `{stops: [{offset, color}]}` từ danh sách `{label, value}`.
#[wasm_bindgen(js_name = riskGradient)]
pub fn risk_gradient(samples: JsValue) -> Result<JsValue, JsValue> {
    let samples: Vec<RiskSample> = from_value(samples)
        .map_err(|err| JsValue::from_str(&format!("Không đọc được danh sách mẫu: {err}")))?;
    let gradient = gradient_stops(&samples).map_err(|err| JsValue::from_str(&err.to_string()))?;
    to_value(&gradient).map_err(|err| JsValue::from_str(&format!("Không serialize gradient: {err}")))
}

/// Lớp CSS của dải badge (`risk-low`, `risk-medium`, `risk-high`).
#[wasm_bindgen(js_name = riskBand)]
pub fn risk_band_class(value: f64) -> String {
    risk_band(value).css_class().to_string()
}

#[cfg(target_arch = "wasm32")]
mod dashboard {
    use std::sync::Arc;

    use serde_wasm_bindgen::to_value;
    use staywatch_client::HttpPatientService;
    use staywatch_core::{CensusController, LookupController, PatientSource};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    use serde_wasm_bindgen::from_value;
    use staywatch_core::DashboardConfig;
    use web_sys::console;

    /// Object JS khoá camelCase, trường thiếu lấy mặc định (giống `mount_dashboard`).
    fn read_config(config: Option<JsValue>) -> Result<DashboardConfig, JsValue> {
        match config {
            Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Không đọc được config: {err}"))),
            _ => Ok(DashboardConfig::default()),
        }
    }

    /// Một phiên dashboard: kho tra cứu và kho danh sách dùng chung cho mọi bề mặt JS.
    #[wasm_bindgen]
    pub struct Dashboard {
        lookup: LookupController,
        census: CensusController,
    }

    #[wasm_bindgen]
    impl Dashboard {
        #[wasm_bindgen(constructor)]
        pub fn new(config: Option<JsValue>) -> Result<Dashboard, JsValue> {
            console_error_panic_hook::set_once();

            let service = HttpPatientService::new(read_config(config)?)
                .map_err(|err| JsValue::from_str(&err.to_string()))?;
            let source: Arc<dyn PatientSource> = Arc::new(service);
            Ok(Dashboard {
                lookup: LookupController::new(Arc::clone(&source)),
                census: CensusController::new(source),
            })
        }

        /// `state()` đã là `loading` khi hàm trả về.
        pub fn search(&self, stay_id: &str) {
            spawn_local(self.lookup.search(stay_id));
        }

        pub fn reset(&self) {
            self.lookup.reset();
        }

        pub fn state(&self) -> Result<JsValue, JsValue> {
            to_value(&self.lookup.state().view())
                .map_err(|err| JsValue::from_str(&format!("Không serialize trạng thái: {err}")))
        }

        /// Gọi `callback(state)` mỗi khi trạng thái tra cứu thay đổi.
        pub fn subscribe(&self, callback: js_sys::Function) {
            let mut rx = self.lookup.subscribe();
            spawn_local(async move {
                while rx.changed().await.is_ok() {
                    let view = to_value(&rx.borrow_and_update().view());
                    match view {
                        Ok(value) => {
                            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                                console::error_1(&err);
                            }
                        }
                        Err(err) => console::error_1(&JsValue::from_str(&err.to_string())),
                    }
                }
            });
        }

        #[wasm_bindgen(js_name = refreshCensus)]
        pub fn refresh_census(&self) {
            spawn_local(self.census.refresh());
        }

        #[wasm_bindgen(js_name = censusState)]
        pub fn census_state(&self) -> Result<JsValue, JsValue> {
            to_value(&self.census.state().view())
                .map_err(|err| JsValue::from_str(&format!("Không serialize danh sách: {err}")))
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use dashboard::Dashboard;
