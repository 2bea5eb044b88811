//! Danh sách bệnh nhân đang nằm khoa (trang tổng quan).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::lookup::PatientSource;
use crate::model::PatientSummary;
use crate::store::{CallToken, LoadState, Sequencer};

pub type CensusState = LoadState<Arc<Vec<PatientSummary>>>;

/// Cùng vòng đời và quy tắc "lần gọi cuối thắng" như [`crate::LookupController`].
#[derive(Clone)]
pub struct CensusController {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn PatientSource>,
    seq: Sequencer<Arc<Vec<PatientSummary>>>,
}

impl CensusController {
    pub fn new(source: Arc<dyn PatientSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                seq: Sequencer::new(),
            }),
        }
    }

    /// Chuyển sang `Loading` ngay, future trả về tải lại danh sách.
    pub fn refresh(&self) -> impl Future<Output = ()> {
        let token = self.inner.seq.issue(LoadState::Loading);
        debug!(token, "census refresh issued");

        let inner = Arc::clone(&self.inner);
        async move {
            let next = match inner.source.current_patients().await {
                Ok(patients) => LoadState::Success(Arc::new(patients)),
                Err(kind) => LoadState::Failed(kind),
            };
            let count = next.data().map(|patients| patients.len());
            let failure = next.error();

            if !inner.seq.settle(token, next) {
                debug!(token, "stale census response dropped");
                return;
            }
            match (count, failure) {
                (Some(count), _) => info!(token, count, "census loaded"),
                (_, Some(kind)) => warn!(token, ?kind, "census refresh failed"),
                _ => {}
            }
        }
    }

    pub fn state(&self) -> CensusState {
        self.inner.seq.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<CensusState> {
        self.inner.seq.subscribe()
    }

    pub fn latest_token(&self) -> CallToken {
        self.inner.seq.latest()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
