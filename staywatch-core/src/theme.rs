//! Kho trạng thái giao diện sáng/tối.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    /// Giá trị cho thuộc tính `data-theme`; chế độ sáng không đặt thuộc tính.
    pub fn data_attribute(self) -> Option<&'static str> {
        match self {
            ThemeMode::Light => None,
            ThemeMode::Dark => Some("dark"),
        }
    }
}

#[derive(Clone)]
pub struct ThemeStore {
    state: Arc<watch::Sender<ThemeMode>>,
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(ThemeMode::default())
    }
}

impl ThemeStore {
    pub fn new(mode: ThemeMode) -> Self {
        let (state, _) = watch::channel(mode);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        *self.state.borrow()
    }

    pub fn set(&self, mode: ThemeMode) {
        self.state.send_if_modified(|current| {
            let changed = *current != mode;
            *current = mode;
            changed
        });
    }

    pub fn toggle(&self) -> ThemeMode {
        self.state.send_modify(|current| *current = current.toggled());
        self.mode()
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.state.subscribe()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}
