//! Optional lifecycle callback slots
//!
//! The four slots mirror the transport's event vocabulary: open, close,
//! error, message. Absent slots are skipped; present slots run isolated
//! so a panicking callback cannot corrupt supervisor state or abort the
//! event reaction that invoked it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use crate::traits::{Payload, ResockError};

/// Invoked when the connection reaches the open state
pub type OnOpen = Arc<dyn Fn() + Send + Sync>;
/// Invoked when the connection closes, with the close reason
pub type OnClose = Arc<dyn Fn(&CloseEvent) + Send + Sync>;
/// Invoked when the transport reports an error
pub type OnError = Arc<dyn Fn(&ResockError) + Send + Sync>;
/// Invoked for every inbound message, decoded or raw
pub type OnMessage = Arc<dyn Fn(Payload) + Send + Sync>;

/// Why a connection closed
#[derive(Debug, Clone)]
pub struct CloseEvent {
    /// Close code, when the remote supplied one
    pub code: Option<u16>,
    /// Close reason or failure description
    pub reason: String,
}

impl CloseEvent {
    /// A clean, locally initiated close
    pub(crate) fn normal(reason: &str) -> Self {
        Self {
            code: Some(1000),
            reason: reason.to_string(),
        }
    }

    /// A close without a close frame (failure, refused connect, dropped stream)
    pub(crate) fn abnormal(reason: String) -> Self {
        Self { code: None, reason }
    }
}

/// The configured callback slots
#[derive(Clone, Default)]
pub(crate) struct Callbacks {
    pub(crate) on_open: Option<OnOpen>,
    pub(crate) on_close: Option<OnClose>,
    pub(crate) on_error: Option<OnError>,
    pub(crate) on_message: Option<OnMessage>,
}

impl Callbacks {
    pub(crate) fn open(&self) {
        if let Some(callback) = &self.on_open {
            guarded("on_open", || callback());
        }
    }

    pub(crate) fn close(&self, event: &CloseEvent) {
        if let Some(callback) = &self.on_close {
            guarded("on_close", || callback(event));
        }
    }

    pub(crate) fn error(&self, err: &ResockError) {
        if let Some(callback) = &self.on_error {
            guarded("on_error", || callback(err));
        }
    }

    pub(crate) fn message(&self, payload: Payload) {
        if let Some(callback) = &self.on_message {
            guarded("on_message", || callback(payload));
        }
    }
}

/// Run a callback, containing any panic it raises
fn guarded<F: FnOnce()>(name: &str, callback: F) {
    if catch_unwind(AssertUnwindSafe(callback)).is_err() {
        error!("{} callback panicked; supervisor state unaffected", name);
    }
}
