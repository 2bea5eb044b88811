//! Kho trạng thái dùng chung giữa nhiều bề mặt hiển thị.
//!
//! Mỗi lần gọi nhận một token tăng dần; chỉ kết quả mang token mới nhất
//! được phép công bố ("lần gọi cuối thắng").

use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

/// Vòng đời của một thao tác tải dữ liệu từ xa.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Success(T),
    Failed(LookupErrorKind),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    pub fn status(&self) -> LoadStatus {
        match self {
            LoadState::Idle => LoadStatus::Idle,
            LoadState::Loading => LoadStatus::Loading,
            LoadState::Success(_) => LoadStatus::Success,
            LoadState::Failed(_) => LoadStatus::Failed,
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<LookupErrorKind> {
        match self {
            LoadState::Failed(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    /// Dạng phẳng `{status, data, error, message}` cho JS/JSON.
    pub fn view(&self) -> StateView<'_, T> {
        let error = self.error();
        StateView {
            status: self.status(),
            data: self.data(),
            error,
            message: error.filter(|kind| kind.is_banner()).map(|kind| kind.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Success,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct StateView<'a, T> {
    pub status: LoadStatus,
    pub data: Option<&'a T>,
    pub error: Option<LookupErrorKind>,
    pub message: Option<String>,
}

/// Phân loại lỗi tra cứu. `Display` là thông điệp cho người dùng.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    #[error("Enter a stay id to search")]
    EmptyQuery,
    #[error("Could not reach the patient service")]
    NetworkError,
    #[error("Patient not found")]
    NotFound,
    #[error("Could not reach the patient service")]
    ServerError,
    #[error("Patient data could not be read")]
    ParseError,
}

impl LookupErrorKind {
    /// Truy vấn rỗng chỉ để trống giao diện, không hiện banner lỗi.
    pub fn is_banner(self) -> bool {
        !matches!(self, LookupErrorKind::EmptyQuery)
    }
}

/// Token phát hành theo thứ tự gọi.
pub type CallToken = u64;

pub(crate) struct Sequencer<T> {
    issued: Mutex<CallToken>,
    state: watch::Sender<LoadState<T>>,
}

impl<T> Sequencer<T> {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        Self {
            issued: Mutex::new(0),
            state,
        }
    }

    /// Phát hành token mới và công bố trạng thái khởi đầu trong cùng một khóa.
    pub(crate) fn issue(&self, initial: LoadState<T>) -> CallToken {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        *issued += 1;
        self.state.send_replace(initial);
        *issued
    }

    /// Công bố kết quả nếu `token` vẫn là lần gọi mới nhất.
    pub(crate) fn settle(&self, token: CallToken, next: LoadState<T>) -> bool {
        let issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        if *issued != token {
            return false;
        }
        self.state.send_replace(next);
        true
    }

    pub(crate) fn latest(&self) -> CallToken {
        *self.issued.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.subscribe()
    }

    pub(crate) fn current(&self) -> LoadState<T>
    where
        T: Clone,
    {
        self.state.borrow().clone()
    }
}
