//! Thành phần giao diện dashboard ICU cho môi trường WebAssembly.

#[cfg(target_arch = "wasm32")]
mod styles;
mod watch_bridge;

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::sync::Arc;

    use crate::{styles, watch_bridge};
    use chrono::{DateTime, Utc};
    use serde_wasm_bindgen::from_value;
    use staywatch_client::HttpPatientService;
    use staywatch_core::risk::{legend, scale_to_percent, RiskLevel};
    use staywatch_core::{
        normalize, CensusController, CensusState, Color, DashboardConfig, LoadState,
        LookupController, LookupState, PatientRecord, PatientSource, PatientSummary, RiskCategory,
        RiskInput, RiskTrend, ThemeMode, ThemeStore, TrendPoint,
    };
    use tokio::sync::{oneshot, watch};
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{console, Document, Element, HtmlInputElement, Window};
    use yew::events::{InputEvent, SubmitEvent};
    use yew::prelude::*;
    use yew::TargetCast;

    /// Các kho dùng chung cho mọi bề mặt hiển thị trong một phiên.
    #[derive(Clone)]
    pub struct DashboardContext {
        lookup: LookupController,
        census: CensusController,
        theme: ThemeStore,
    }

    impl PartialEq for DashboardContext {
        fn eq(&self, other: &Self) -> bool {
            self.lookup.ptr_eq(&other.lookup)
                && self.census.ptr_eq(&other.census)
                && self.theme.ptr_eq(&other.theme)
        }
    }

    /// Theo dõi một kênh `watch` và render lại khi giá trị đổi.
    ///
    /// Task nghe dừng khi component unmount.
    #[hook]
    fn use_watch<T: Clone + 'static>(rx: watch::Receiver<T>) -> T {
        let value = use_state(|| rx.borrow().clone());
        {
            let value = value.clone();
            use_effect_with((), move |_| {
                let (stop, stopped) = oneshot::channel::<()>();
                spawn_local(watch_bridge::forward_changes(rx, stopped, move |next| value.set(next)));
                move || drop(stop)
            });
        }
        (*value).clone()
    }

    #[derive(Properties, PartialEq)]
    pub struct DashboardProps {
        pub context: DashboardContext,
    }

    #[function_component(DashboardView)]
    fn dashboard_view(props: &DashboardProps) -> Html {
        use_effect_with((), |_| {
            if let Some(document) = web_sys::window().and_then(|window| window.document()) {
                if let Err(err) = styles::ensure_styles(&document) {
                    console::error_1(&err);
                }
            }
            || ()
        });

        let theme = use_watch(props.context.theme.subscribe());
        use_effect_with(theme, |mode| {
            apply_theme(*mode);
            || ()
        });

        html! {
            <ContextProvider<DashboardContext> context={props.context.clone()}>
                <div class="dashboard-root" data-theme={theme.data_attribute()}>
                    <header class="dashboard-bar">
                        <h1>{"ICU Stay Dashboard"}</h1>
                        <SearchBox />
                        <ThemeToggle />
                    </header>
                    <main class="dashboard-main">
                        <PatientPanel />
                        <CensusTable />
                    </main>
                </div>
            </ContextProvider<DashboardContext>>
        }
    }

    fn apply_theme(mode: ThemeMode) {
        let Some(root) = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.document_element())
        else {
            return;
        };
        let result = match mode.data_attribute() {
            Some(value) => root.set_attribute("data-theme", value),
            None => root.remove_attribute("data-theme"),
        };
        if let Err(err) = result {
            console::error_1(&err);
        }
    }

    #[function_component(SearchBox)]
    fn search_box() -> Html {
        let Some(context) = use_context::<DashboardContext>() else {
            return Html::default();
        };
        let query = use_state(String::new);

        let on_input = {
            let query = query.clone();
            Callback::from(move |event: InputEvent| {
                let input: HtmlInputElement = event.target_unchecked_into();
                query.set(input.value());
            })
        };

        let on_submit = {
            let query = query.clone();
            let lookup = context.lookup.clone();
            Callback::from(move |event: SubmitEvent| {
                event.prevent_default();
                spawn_local(lookup.search(&query));
            })
        };

        html! {
            <form class="search-box" role="search" onsubmit={on_submit}>
                <input
                    type="search"
                    placeholder="Search patient with stay id"
                    value={(*query).clone()}
                    oninput={on_input}
                    aria-label="Stay id"
                />
                <button type="submit">{"Search"}</button>
            </form>
        }
    }

    #[function_component(ThemeToggle)]
    fn theme_toggle() -> Html {
        let Some(context) = use_context::<DashboardContext>() else {
            return Html::default();
        };
        let mode = use_watch(context.theme.subscribe());
        let onclick = {
            let theme = context.theme.clone();
            Callback::from(move |_| {
                theme.toggle();
            })
        };
        let label = match mode {
            ThemeMode::Light => "Dark mode",
            ThemeMode::Dark => "Light mode",
        };

        html! {
            <button type="button" class="theme-toggle" {onclick}>{ label }</button>
        }
    }

    #[function_component(PatientPanel)]
    fn patient_panel() -> Html {
        let Some(context) = use_context::<DashboardContext>() else {
            return Html::default();
        };
        let state: LookupState = use_watch(context.lookup.subscribe());

        let body = match &state {
            LoadState::Idle => html! {
                <p class="panel-empty">{"Search for a stay id to view the patient."}</p>
            },
            LoadState::Loading => html! {
                <div class="panel-progress" role="progressbar" aria-busy="true">
                    {"Loading patient information..."}
                </div>
            },
            LoadState::Failed(kind) if kind.is_banner() => html! {
                <div class="panel-error" role="alert">{ kind.to_string() }</div>
            },
            LoadState::Failed(_) => html! {
                <p class="panel-empty">{"Search for a stay id to view the patient."}</p>
            },
            LoadState::Success(record) => render_record(record),
        };

        html! {
            <section class="patient-panel" aria-live="polite">
                { body }
                <GradientLegend />
            </section>
        }
    }

    fn render_record(record: &Arc<PatientRecord>) -> Html {
        let readmission_text = if record.will_be_readmitted {
            "Readmitted"
        } else {
            "Not Readmitted"
        };
        let mortality = match record.mortality_risk() {
            Ok(Some(input)) => normalize(input).ok(),
            Ok(None) => None,
            Err(err) => {
                console::error_1(&JsValue::from_str(&err.to_string()));
                None
            }
        };

        let trends = [
            RiskTrend {
                category: RiskCategory::Readmission,
                points: vec![TrendPoint {
                    date: format_timestamp(record.outtime),
                    value: record.readmission_risk(),
                }],
            },
            RiskTrend {
                category: RiskCategory::Mortality,
                points: mortality
                    .map(|level| TrendPoint {
                        date: format_timestamp(record.outtime),
                        value: RiskInput::Scale(level.value()),
                    })
                    .into_iter()
                    .collect(),
            },
        ];

        html! {
            <>
                <header class="patient-header">
                    <h2>{ format!("Stay id: {}", record.stay_id) }</h2>
                    <p>{ format!("{} · {} · {} years", record.name, record.gender, record.age) }</p>
                </header>
                <dl class="patient-facts">
                    <dt>{"Subject id"}</dt><dd>{ record.subject_id.clone().unwrap_or_else(|| "--".to_string()) }</dd>
                    <dt>{"Admission id"}</dt><dd>{ record.hadm_id.clone().unwrap_or_else(|| "--".to_string()) }</dd>
                    <dt>{"First care unit"}</dt><dd>{ record.first_care_unit.clone().unwrap_or_else(|| "--".to_string()) }</dd>
                    <dt>{"In"}</dt><dd>{ format_timestamp(record.intime) }</dd>
                    <dt>{"Out"}</dt><dd>{ format_timestamp(record.outtime) }</dd>
                    <dt>{"Length of stay"}</dt><dd>{ format_length_of_stay(record) }</dd>
                </dl>
                <div class="risk-badges">
                    <RiskBadge
                        title={RiskCategory::Readmission.label()}
                        color={record.readmission_color()}
                        text={readmission_text}
                    />
                    {
                        match mortality {
                            Some(level) => html! {
                                <RiskBadge
                                    title={RiskCategory::Mortality.label()}
                                    color={staywatch_core::color_for(level)}
                                    text={format_percent(level)}
                                />
                            },
                            None => html! {
                                <RiskBadge
                                    title={RiskCategory::Mortality.label()}
                                    color={Color::hsl(0.0, 0.0, 60.0)}
                                    text={"--"}
                                />
                            },
                        }
                    }
                </div>
                <div class="trend-tables">
                    { for trends.into_iter().map(|trend| html! { <RiskTrendTable {trend} /> }) }
                </div>
            </>
        }
    }

    #[derive(Properties, PartialEq)]
    struct RiskBadgeProps {
        title: AttrValue,
        color: Color,
        text: AttrValue,
    }

    #[function_component(RiskBadge)]
    fn risk_badge(props: &RiskBadgeProps) -> Html {
        html! {
            <div class="risk-badge">
                <h3>{ props.title.clone() }</h3>
                <div class="risk-badge-value" style={format!("background-color: {};", props.color)}>
                    { props.text.clone() }
                </div>
            </div>
        }
    }

    #[derive(Properties, PartialEq)]
    struct RiskTrendTableProps {
        trend: RiskTrend,
    }

    #[function_component(RiskTrendTable)]
    fn risk_trend_table(props: &RiskTrendTableProps) -> Html {
        let trend = &props.trend;
        let bands = trend.row_bands();
        let colors = match trend.row_colors() {
            Ok(colors) => colors,
            Err(err) => {
                return html! { <div class="panel-error" role="alert">{ err.to_string() }</div> };
            }
        };
        let strip = trend
            .gradient()
            .ok()
            .and_then(|gradient| gradient.to_css("to bottom"));

        html! {
            <section class="trend-table">
                <h3>{ trend.category.label() }</h3>
                <div class="trend-body">
                    {
                        strip.map(|css| html! {
                            <div class="trend-strip" style={format!("background: {css};")} />
                        }).unwrap_or_default()
                    }
                    <table>
                        <tbody>
                            {
                                for trend.points.iter().zip(colors).zip(bands).enumerate().map(|(index, ((point, color), band))| {
                                    html! {
                                        <tr
                                            class={classes!(band.css_class(), (index == 0).then_some("trend-latest"))}
                                            style={format!("background-color: {color};")}
                                        >
                                            <td class="trend-value">{ format_trend_value(trend.category, point.value) }</td>
                                            <td class="trend-date">{ point.date.clone() }</td>
                                        </tr>
                                    }
                                })
                            }
                        </tbody>
                    </table>
                </div>
            </section>
        }
    }

    #[function_component(GradientLegend)]
    fn gradient_legend() -> Html {
        let css = legend().to_css("to right").unwrap_or_default();
        html! {
            <figure class="gradient-legend">
                <div class="gradient-legend-bar" style={format!("background: {css};")} />
                <figcaption>
                    <span>{"Low Risk"}</span>
                    <span>{"High Risk"}</span>
                </figcaption>
            </figure>
        }
    }

    #[function_component(CensusTable)]
    fn census_table() -> Html {
        let Some(context) = use_context::<DashboardContext>() else {
            return Html::default();
        };
        let state: CensusState = use_watch(context.census.subscribe());
        {
            let census = context.census.clone();
            use_effect_with((), move |_| {
                spawn_local(census.refresh());
                || ()
            });
        }

        let rows = match &state {
            LoadState::Idle | LoadState::Loading => html! {
                <tr><td colspan="5" class="panel-progress">{"Loading current patients..."}</td></tr>
            },
            LoadState::Failed(kind) => html! {
                <tr><td colspan="5" class="panel-error">{ kind.to_string() }</td></tr>
            },
            LoadState::Success(patients) if patients.is_empty() => html! {
                <tr><td colspan="5" class="panel-empty">{"No patients currently admitted."}</td></tr>
            },
            LoadState::Success(patients) => html! {
                { for patients.iter().map(|patient| render_census_row(patient, &context.lookup)) }
            },
        };

        html! {
            <section class="census">
                <h2>{"Current patients"}</h2>
                <table class="census-table">
                    <thead>
                        <tr>
                            <th>{"Stay id"}</th>
                            <th>{"Subject id"}</th>
                            <th>{"First Care Unit"}</th>
                            <th>{"Admission id"}</th>
                            <th>{"Readmission Status"}</th>
                        </tr>
                    </thead>
                    <tbody>{ rows }</tbody>
                </table>
            </section>
        }
    }

    fn render_census_row(patient: &PatientSummary, lookup: &LookupController) -> Html {
        let onclick = {
            let lookup = lookup.clone();
            let stay_id = patient.stay_id.clone();
            Callback::from(move |_| spawn_local(lookup.search(&stay_id)))
        };
        html! {
            <tr class="census-row" {onclick}>
                <td>{ patient.stay_id.clone() }</td>
                <td>{ patient.subject_id.clone() }</td>
                <td>{ patient.first_care_unit.clone().unwrap_or_default() }</td>
                <td>{ patient.hadm_id.clone().unwrap_or_default() }</td>
                <td>
                    <span
                        class="readmission-dot"
                        style={format!("background-color: {};", patient.readmission_color())}
                    />
                </td>
            </tr>
        }
    }

    fn format_trend_value(category: RiskCategory, value: RiskInput) -> String {
        match (category, value) {
            (_, RiskInput::Flag(flag)) => flag.to_string(),
            (RiskCategory::Mortality, RiskInput::Scale(scale)) => format!("{:.1}%", scale * 10.0),
            (_, RiskInput::Scale(scale)) => format!("{scale:.1}"),
        }
    }

    fn format_percent(level: RiskLevel) -> String {
        format!("{:.1}%", scale_to_percent(level))
    }

    fn format_timestamp(timestamp: DateTime<Utc>) -> String {
        timestamp.format("%Y-%m-%d %H:%M").to_string()
    }

    fn format_length_of_stay(record: &PatientRecord) -> String {
        let stay = record.length_of_stay();
        let days = stay.num_days();
        let hours = stay.num_hours() - days * 24;
        if days > 0 {
            format!("{days} d {hours} h")
        } else {
            format!("{} h", stay.num_hours())
        }
    }

    #[wasm_bindgen]
    pub fn mount_dashboard(selector: &str, config: JsValue) -> Result<(), JsValue> {
        let window: Window =
            web_sys::window().ok_or_else(|| JsValue::from_str("Không có window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("Không truy cập được document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Selector lỗi: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("Không tìm thấy element theo selector"))?;

        let config: DashboardConfig = if config.is_undefined() || config.is_null() {
            DashboardConfig::default()
        } else {
            from_value(config)?
        };
        let service = HttpPatientService::new(config)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        let source: Arc<dyn PatientSource> = Arc::new(service);
        let context = DashboardContext {
            lookup: LookupController::new(Arc::clone(&source)),
            census: CensusController::new(source),
            theme: ThemeStore::default(),
        };

        yew::Renderer::<DashboardView>::with_root_and_props(target, DashboardProps { context })
            .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_dashboard;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_dashboard(_: &str, _: wasm_bindgen::JsValue) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "staywatch-ui chỉ hỗ trợ biên dịch target wasm32",
    ))
}
