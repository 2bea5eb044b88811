//! Tra cứu bệnh nhân theo stay id, dùng chung cho mọi ô tìm kiếm.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::model::{PatientRecord, PatientSummary};
use crate::store::{CallToken, LoadState, LookupErrorKind, Sequencer};

/// Trạng thái tra cứu một bệnh nhân.
pub type LookupState = LoadState<Arc<PatientRecord>>;

/// Dịch vụ dữ liệu bệnh nhân ở xa.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PatientSource: Send + Sync {
    /// Một yêu cầu duy nhất cho `stay_id` đã được trim.
    async fn fetch_patient(&self, stay_id: &str) -> Result<PatientRecord, LookupErrorKind>;

    /// Danh sách bệnh nhân đang nằm khoa.
    async fn current_patients(&self) -> Result<Vec<PatientSummary>, LookupErrorKind>;
}

/// Nguồn sự thật duy nhất cho "bệnh nhân đang được tra cứu".
///
/// Clone rẻ; mọi bản clone chia sẻ cùng một kho trạng thái.
#[derive(Clone)]
pub struct LookupController {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn PatientSource>,
    seq: Sequencer<Arc<PatientRecord>>,
}

impl LookupController {
    pub fn new(source: Arc<dyn PatientSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                seq: Sequencer::new(),
            }),
        }
    }

    /// Bắt đầu tra cứu.
    ///
    /// Phần đồng bộ chạy ngay khi gọi: trạng thái đã là `Loading` (hoặc
    /// `Failed(EmptyQuery)`) trước khi hàm trả về. Future trả về thực hiện
    /// đúng một yêu cầu ra ngoài; kết quả bị bỏ nếu đã có lần gọi mới hơn.
    pub fn search(&self, identifier: &str) -> impl Future<Output = ()> {
        let stay_id = identifier.trim().to_string();
        let pending = if stay_id.is_empty() {
            let token = self
                .inner
                .seq
                .issue(LoadState::Failed(LookupErrorKind::EmptyQuery));
            debug!(token, "empty patient query ignored");
            None
        } else {
            let token = self.inner.seq.issue(LoadState::Loading);
            debug!(token, stay_id = %stay_id, "patient lookup issued");
            Some((token, stay_id))
        };

        let inner = Arc::clone(&self.inner);
        async move {
            if let Some((token, stay_id)) = pending {
                let outcome = inner.source.fetch_patient(&stay_id).await;
                inner.settle(token, &stay_id, outcome);
            }
        }
    }

    pub fn state(&self) -> LookupState {
        self.inner.seq.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.inner.seq.subscribe()
    }

    pub fn latest_token(&self) -> CallToken {
        self.inner.seq.latest()
    }

    /// Quay về `Idle`; các phản hồi còn treo sẽ bị bỏ.
    pub fn reset(&self) {
        self.inner.seq.issue(LoadState::Idle);
    }

    /// Hai handle có cùng kho trạng thái hay không.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Inner {
    fn settle(
        &self,
        token: CallToken,
        stay_id: &str,
        outcome: Result<PatientRecord, LookupErrorKind>,
    ) {
        let next = match outcome {
            Ok(record) => LoadState::Success(Arc::new(record)),
            Err(kind) => LoadState::Failed(kind),
        };
        let failure = next.error();

        if !self.seq.settle(token, next) {
            debug!(token, stay_id, "stale patient response dropped");
            return;
        }

        match failure {
            None => info!(token, stay_id, "patient lookup succeeded"),
            Some(kind) => warn!(token, stay_id, ?kind, "patient lookup failed"),
        }
    }
}

impl std::fmt::Debug for LookupController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupController")
            .field("latest_token", &self.latest_token())
            .field("status", &self.inner.seq.current().status())
            .finish()
    }
}
