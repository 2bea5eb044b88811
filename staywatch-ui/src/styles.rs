#![cfg(target_arch = "wasm32")]

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Node};

const STYLE_TAG_SELECTOR: &str = "style[data-staywatch-ui]";

/// CSS mặc định cùng các design token dễ ghi đè.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --staywatch-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --staywatch-bg: #ffffff;
  --staywatch-surface: #dbeafe;
  --staywatch-border: rgba(148, 163, 184, 0.38);
  --staywatch-text: #1f2933;
  --staywatch-muted: #52606d;
  --staywatch-radius: 8px;
  --staywatch-error-bg: rgba(180, 35, 24, 0.1);
  --staywatch-error-text: #b42318;
}

[data-theme="dark"] {
  --staywatch-bg: #111827;
  --staywatch-surface: #172554;
  --staywatch-border: rgba(71, 84, 103, 0.6);
  --staywatch-text: #f9fafb;
  --staywatch-muted: #9ca3af;
}

.dashboard-root {
  font-family: var(--staywatch-font-family);
  background: var(--staywatch-bg);
  color: var(--staywatch-text);
  min-height: 100vh;
}

.dashboard-bar {
  display: flex;
  align-items: center;
  gap: 16px;
  padding: 12px 24px;
  background: var(--staywatch-surface);
  box-shadow: 0 2px 6px rgba(15, 23, 42, 0.12);
}

.dashboard-bar h1 {
  font-size: 1.15rem;
  margin: 0;
  flex: 1;
}

.search-box {
  display: flex;
  gap: 8px;
  width: 30%;
}

.search-box input {
  flex: 1;
  font-size: 0.8rem;
  padding: 6px 10px;
  border: 1px solid var(--staywatch-border);
  border-radius: 4px;
}

.search-box button,
.theme-toggle {
  border: none;
  border-radius: 4px;
  padding: 6px 14px;
  cursor: pointer;
  background: var(--staywatch-text);
  color: var(--staywatch-bg);
}

.dashboard-main {
  display: grid;
  grid-template-columns: minmax(420px, 1.4fr) minmax(360px, 1fr);
  gap: 24px;
  padding: 24px;
}

.patient-panel,
.census {
  display: flex;
  flex-direction: column;
  gap: 16px;
}

.panel-progress,
.panel-empty {
  color: var(--staywatch-muted);
}

.panel-error {
  background: var(--staywatch-error-bg);
  color: var(--staywatch-error-text);
  border-radius: var(--staywatch-radius);
  padding: 12px 16px;
  font-weight: 600;
}

.patient-facts {
  display: grid;
  grid-template-columns: max-content 1fr;
  gap: 4px 16px;
  margin: 0;
}

.patient-facts dt {
  color: var(--staywatch-muted);
}

.risk-badges {
  display: grid;
  grid-template-columns: 1fr 1fr;
  gap: 16px;
}

.risk-badge {
  border: 1px solid var(--staywatch-border);
  border-radius: var(--staywatch-radius);
  padding: 16px;
}

.risk-badge-value {
  display: flex;
  align-items: center;
  justify-content: center;
  height: 120px;
  border-radius: var(--staywatch-radius);
  color: #ffffff;
  font-size: 24px;
  font-weight: 700;
}

.trend-tables {
  display: flex;
  gap: 16px;
}

.trend-table {
  flex: 1;
  background: var(--staywatch-surface);
  padding-left: 20px;
}

.trend-body {
  display: flex;
  gap: 8px;
}

.trend-strip {
  width: 10px;
  border-radius: 4px;
}

.trend-table table {
  border-collapse: collapse;
  width: 100%;
}

.trend-table tr {
  border-bottom: 8px solid var(--staywatch-surface);
  font-size: 1.5rem;
  font-weight: 700;
}

.trend-table tr.trend-latest {
  font-size: 3rem;
  height: 4rem;
}

.trend-date {
  font-size: 0.75rem;
  padding: 8px 56px 0;
}

.trend-table tr.risk-high .trend-value::after {
  content: " ▲";
}

.gradient-legend {
  margin: 0;
  width: 300px;
}

.gradient-legend-bar {
  height: 20px;
}

.gradient-legend figcaption {
  display: flex;
  justify-content: space-between;
  font-size: 12px;
  margin-top: 5px;
}

.census-table {
  width: 100%;
  font-size: 0.875rem;
  text-align: left;
  border-collapse: collapse;
}

.census-table th {
  text-transform: uppercase;
  font-size: 0.75rem;
  background: var(--staywatch-surface);
  padding: 12px 24px;
}

.census-table td {
  padding: 16px 24px;
  border-bottom: 1px solid var(--staywatch-border);
}

.census-row {
  cursor: pointer;
}

.census-row:hover {
  background: rgba(148, 163, 184, 0.15);
}

.readmission-dot {
  display: inline-block;
  width: 16px;
  height: 16px;
  border-radius: 999px;
}

@media (max-width: 960px) {
  .dashboard-main {
    grid-template-columns: 1fr;
  }

  .search-box {
    width: 100%;
  }

  .trend-tables {
    flex-direction: column;
  }
}
"#;

pub fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.query_selector(STYLE_TAG_SELECTOR)?.is_some() {
        return Ok(());
    }

    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("Document không có thẻ <head>"))?;

    let style_el = document.create_element("style")?;
    style_el.set_attribute("data-staywatch-ui", "v1")?;
    style_el.set_text_content(Some(DEFAULT_STYLES));
    head.append_child(&style_el.clone().dyn_into::<Node>()?)?;

    Ok(())
}
