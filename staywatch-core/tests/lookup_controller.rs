use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use staywatch_core::{
    CensusController, Color, LoadState, LookupController, LookupErrorKind, PatientRecord,
    PatientSource, PatientSummary,
};
use tokio::sync::oneshot;

type PatientReply = Result<PatientRecord, LookupErrorKind>;
type CensusReply = Result<Vec<PatientSummary>, LookupErrorKind>;

/// Nguồn giả: mỗi stay id chờ một cổng do test mở, để ép thứ tự phản hồi.
#[derive(Default)]
struct GatedSource {
    patients: Mutex<HashMap<String, oneshot::Receiver<PatientReply>>>,
    census: Mutex<Vec<oneshot::Receiver<CensusReply>>>,
    requested: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl GatedSource {
    fn gate(&self, stay_id: &str) -> oneshot::Sender<PatientReply> {
        let (tx, rx) = oneshot::channel();
        self.patients
            .lock()
            .unwrap()
            .insert(stay_id.to_string(), rx);
        tx
    }

    fn census_gate(&self) -> oneshot::Sender<CensusReply> {
        let (tx, rx) = oneshot::channel();
        self.census.lock().unwrap().push(rx);
        tx
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatientSource for GatedSource {
    async fn fetch_patient(&self, stay_id: &str) -> Result<PatientRecord, LookupErrorKind> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(stay_id.to_string());
        let gate = self.patients.lock().unwrap().remove(stay_id);
        match gate {
            Some(rx) => rx.await.unwrap_or(Err(LookupErrorKind::NetworkError)),
            None => Err(LookupErrorKind::NotFound),
        }
    }

    async fn current_patients(&self) -> Result<Vec<PatientSummary>, LookupErrorKind> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.census.lock().unwrap().remove(0);
        gate.await.unwrap_or(Err(LookupErrorKind::NetworkError))
    }
}

fn record(stay_id: &str, readmitted: bool) -> PatientRecord {
    PatientRecord {
        stay_id: stay_id.to_string(),
        subject_id: Some("10001".to_string()),
        name: "Jane Doe".to_string(),
        age: 55,
        gender: "F".to_string(),
        hadm_id: None,
        first_care_unit: Some("MICU".to_string()),
        intime: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        outtime: Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap(),
        los_hours: 48.0,
        will_be_readmitted: readmitted,
        mortality_rate: None,
    }
}

fn summary(stay_id: &str) -> PatientSummary {
    PatientSummary {
        stay_id: stay_id.to_string(),
        subject_id: "1".to_string(),
        hadm_id: None,
        first_care_unit: None,
        will_be_readmitted: false,
    }
}

fn setup() -> (Arc<GatedSource>, LookupController) {
    let source = Arc::new(GatedSource::default());
    let controller = LookupController::new(source.clone());
    (source, controller)
}

#[test]
fn starts_idle() {
    let (_, controller) = setup();
    assert_eq!(controller.state(), LoadState::Idle);
    assert_eq!(controller.latest_token(), 0);
}

#[tokio::test]
async fn loading_is_visible_before_resolution() {
    let (source, controller) = setup();
    let gate = source.gate("123");

    let pending = controller.search("123");
    assert_eq!(controller.state(), LoadState::Loading);

    gate.send(Ok(record("123", true))).unwrap();
    pending.await;

    let state = controller.state();
    let patient = state.data().expect("lookup should succeed");
    assert!(patient.will_be_readmitted);
    assert_eq!(patient.readmission_color(), Color::HIGH_RISK);
}

#[tokio::test]
async fn empty_queries_never_reach_the_service() {
    let (source, controller) = setup();

    controller.search("").await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::EmptyQuery)
    );

    controller.search("   ").await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::EmptyQuery)
    );
    assert_eq!(source.calls(), 0);
}

#[tokio::test]
async fn identifier_is_trimmed_before_request() {
    let (source, controller) = setup();
    let gate = source.gate("42");
    let pending = controller.search("  42 \n");
    gate.send(Ok(record("42", false))).unwrap();
    pending.await;

    assert_eq!(*source.requested.lock().unwrap(), vec!["42".to_string()]);
    assert_eq!(controller.state().data().unwrap().stay_id, "42");
}

#[tokio::test]
async fn failures_are_absorbed_into_state() {
    let (source, controller) = setup();
    let gate = source.gate("nope");
    let pending = controller.search("nope");
    gate.send(Err(LookupErrorKind::ServerError)).unwrap();
    pending.await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::ServerError)
    );

    // Không có cổng: nguồn giả trả về NotFound.
    controller.search("missing").await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::NotFound)
    );
}

#[tokio::test]
async fn later_search_wins_over_slow_earlier_one() {
    let (source, controller) = setup();
    let gate_a = source.gate("a");
    let gate_b = source.gate("b");

    let first = tokio::spawn(controller.search("a"));
    let second = tokio::spawn(controller.search("b"));

    gate_b.send(Ok(record("b", false))).unwrap();
    second.await.unwrap();
    assert_eq!(controller.state().data().unwrap().stay_id, "b");

    gate_a.send(Ok(record("a", true))).unwrap();
    first.await.unwrap();
    assert_eq!(controller.state().data().unwrap().stay_id, "b");
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn stale_failure_does_not_clobber_loading() {
    let (source, controller) = setup();
    let gate_a = source.gate("a");
    let gate_b = source.gate("b");

    let first = controller.search("a");
    let second = controller.search("b");

    gate_a.send(Err(LookupErrorKind::NetworkError)).unwrap();
    first.await;
    assert_eq!(controller.state(), LoadState::Loading);

    gate_b.send(Err(LookupErrorKind::NotFound)).unwrap();
    second.await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::NotFound)
    );
}

#[tokio::test]
async fn empty_query_supersedes_in_flight_search() {
    let (source, controller) = setup();
    let gate = source.gate("a");
    let pending = controller.search("a");
    controller.search(" ").await;

    gate.send(Ok(record("a", true))).unwrap();
    pending.await;
    assert_eq!(
        controller.state(),
        LoadState::Failed(LookupErrorKind::EmptyQuery)
    );
}

#[tokio::test]
async fn reset_discards_pending_response() {
    let (source, controller) = setup();
    let gate = source.gate("a");
    let pending = controller.search("a");
    controller.reset();

    gate.send(Ok(record("a", true))).unwrap();
    pending.await;
    assert_eq!(controller.state(), LoadState::Idle);
}

#[tokio::test]
async fn subscribers_observe_every_published_state() {
    let (source, controller) = setup();
    let mut rx = controller.subscribe();
    let other_surface = controller.clone();
    assert!(other_surface.ptr_eq(&controller));

    let gate = source.gate("7");
    let pending = other_surface.search("7");
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_loading());

    gate.send(Ok(record("7", false))).unwrap();
    pending.await;
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().data().unwrap().stay_id, "7");
}

#[tokio::test]
async fn new_search_replaces_previous_record() {
    let (source, controller) = setup();
    let gate = source.gate("1");
    let pending = controller.search("1");
    gate.send(Ok(record("1", true))).unwrap();
    pending.await;

    let gate = source.gate("2");
    let pending = controller.search("2");
    assert_eq!(controller.state(), LoadState::Loading);
    gate.send(Ok(record("2", false))).unwrap();
    pending.await;
    assert_eq!(controller.state().data().unwrap().stay_id, "2");
}

#[tokio::test]
async fn census_refresh_applies_last_call_wins() {
    let source = Arc::new(GatedSource::default());
    let census = CensusController::new(source.clone());
    let slow = source.census_gate();
    let fast = source.census_gate();

    let first = tokio::spawn(census.refresh());
    assert!(census.state().is_loading());
    // Chờ lần gọi đầu nhận cổng "slow" trước khi phát lần gọi thứ hai.
    while source.calls() < 1 {
        tokio::task::yield_now().await;
    }

    let second = census.refresh();
    fast.send(Ok(vec![summary("1"), summary("2")])).unwrap();
    second.await;
    assert_eq!(census.state().data().unwrap().len(), 2);

    slow.send(Ok(vec![summary("9")])).unwrap();
    first.await.unwrap();
    assert_eq!(census.state().data().unwrap().len(), 2);
    assert_eq!(census.latest_token(), 2);
}
