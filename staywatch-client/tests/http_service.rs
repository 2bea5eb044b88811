use std::fs;
use std::sync::Arc;

use serde_json::{json, Value};
use staywatch_client::HttpPatientService;
use staywatch_core::{
    Color, CensusController, DashboardConfig, LoadState, LookupController, LookupErrorKind,
    PatientSource,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> Value {
    let raw = fs::read_to_string(format!("{}/tests/data/{name}", env!("CARGO_MANIFEST_DIR")))
        .expect("fixture should be readable");
    serde_json::from_str(&raw).expect("fixture should be JSON")
}

fn service_for(server: &MockServer) -> HttpPatientService {
    HttpPatientService::new(DashboardConfig {
        service_url: server.uri(),
        ..DashboardConfig::default()
    })
    .expect("mock server uri is a valid base")
}

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_resolves_to_success_with_high_risk_badge() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/api/v1/patient/123",
        ResponseTemplate::new(200).set_body_json(fixture("patient_123.json")),
    )
    .await;

    let controller = LookupController::new(Arc::new(service_for(&server)));
    controller.search("123").await;

    let state = controller.state();
    let patient = state.data().expect("lookup should succeed");
    assert!(patient.will_be_readmitted);
    assert_eq!(patient.name, "Jane Doe");
    assert_eq!(patient.readmission_color(), Color::HIGH_RISK);
    assert_eq!(patient.readmission_color().to_hex(), "#ff0000");
    assert_eq!(patient.length_of_stay().num_minutes(), 48 * 60 + 30);
}

#[tokio::test]
async fn minimal_contract_body_resolves_to_success() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/api/v1/patient/123",
        ResponseTemplate::new(200).set_body_json(json!({
            "stay_id": "123",
            "will_be_readmitted": true,
            "los_hour_int": 48.5,
            "intime": "2024-06-01T00:00:00Z",
            "outtime": "2024-06-03T00:00:00Z",
            "age": 55,
            "gender": "F",
            "name": "Jane Doe"
        })),
    )
    .await;

    let controller = LookupController::new(Arc::new(service_for(&server)));
    controller.search("123").await;

    let state = controller.state();
    let patient = state.data().expect("minimal body should be accepted");
    assert!(patient.will_be_readmitted);
    assert_eq!(patient.subject_id, None);
    assert_eq!(patient.hadm_id, None);
    assert_eq!(patient.first_care_unit, None);
    assert_eq!(patient.mortality_color(), Ok(None));
    assert_eq!(patient.readmission_color(), Color::HIGH_RISK);
}

#[tokio::test]
async fn float_typed_columns_resolve_to_success() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/api/v1/patient/30057454",
        ResponseTemplate::new(200).set_body_json(json!({
            "subject_id": 10023117,
            "hadm_id": 21133938,
            "stay_id": 30057454.0,
            "first_care_unit": "Medical Intensive Care Unit (MICU)",
            "los_hour_int": 6.605625,
            "gender": null,
            "age": 53.0,
            "name": null,
            "will_be_readmitted": false,
            "intime": "2175-03-21 03:20:53",
            "outtime": "2175-03-27 17:52:59"
        })),
    )
    .await;

    let controller = LookupController::new(Arc::new(service_for(&server)));
    controller.search(" 30057454 ").await;

    let state = controller.state();
    let patient = state.data().expect("float columns should be accepted");
    assert_eq!(patient.stay_id, "30057454");
    assert_eq!(patient.age, 53);
    assert_eq!(patient.subject_id.as_deref(), Some("10023117"));
    assert_eq!(patient.readmission_color(), Color::LOW_RISK);
}

#[tokio::test]
async fn http_404_becomes_not_found() {
    let server = MockServer::start().await;
    mount(&server, "/api/v1/patient/nope", ResponseTemplate::new(404)).await;

    let controller = LookupController::new(Arc::new(service_for(&server)));
    controller.search("nope").await;

    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::NotFound)
    );
}

#[tokio::test]
async fn http_5xx_becomes_server_error() {
    let server = MockServer::start().await;
    mount(&server, "/api/v1/patient/500", ResponseTemplate::new(503)).await;

    let service = service_for(&server);
    assert_eq!(
        service.fetch_patient("500").await,
        Err(LookupErrorKind::ServerError)
    );
}

#[tokio::test]
async fn malformed_bodies_become_parse_errors() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/api/v1/patient/1",
        ResponseTemplate::new(200).set_body_string("<html>oops</html>"),
    )
    .await;
    let mut without_id = fixture("patient_123.json");
    without_id.as_object_mut().unwrap().remove("stay_id");
    mount(
        &server,
        "/api/v1/patient/2",
        ResponseTemplate::new(200).set_body_json(without_id),
    )
    .await;

    let service = service_for(&server);
    assert_eq!(
        service.fetch_patient("1").await,
        Err(LookupErrorKind::ParseError)
    );
    assert_eq!(
        service.fetch_patient("2").await,
        Err(LookupErrorKind::ParseError)
    );
}

#[tokio::test]
async fn unreachable_service_becomes_network_error() {
    // A port released right after binding refuses connections.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("ephemeral port")
        .port();
    let service = HttpPatientService::new(DashboardConfig {
        service_url: format!("http://127.0.0.1:{port}"),
        ..DashboardConfig::default()
    })
    .unwrap();

    let controller = LookupController::new(Arc::new(service));
    controller.search("123").await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::NetworkError)
    );
}

#[tokio::test]
async fn empty_search_sends_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let controller = LookupController::new(Arc::new(service_for(&server)));
    controller.search("  ").await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::EmptyQuery)
    );
}

#[tokio::test]
async fn census_lists_current_patients() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/api/v1/current-patients/2131-01-11%2004:20:05",
        ResponseTemplate::new(200).set_body_json(fixture("current_patients.json")),
    )
    .await;

    let census = CensusController::new(Arc::new(service_for(&server)));
    census.refresh().await;

    let state = census.state();
    let rows = state.data().expect("census should load");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].stay_id, "30001");
    assert_eq!(rows[0].readmission_color(), Color::HIGH_RISK);
    assert_eq!(rows[2].hadm_id, None);
}
