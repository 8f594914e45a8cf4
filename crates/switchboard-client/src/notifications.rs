//! Toast queue fed by reducer notices and advisory events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use switchboard_core::{NoticeLevel, SessionId};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toast {
    pub level: NoticeLevel,
    pub message: String,
    pub session_id: Option<SessionId>,
    pub created_at: DateTime<Utc>,
}

const MAX_PENDING_TOASTS: usize = 32;

#[derive(Debug, Default)]
pub struct ToastQueue {
    pending: VecDeque<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, toast: Toast) {
        match toast.level {
            NoticeLevel::Info => info!(target: "switchboard.controller", message = %toast.message, "toast"),
            NoticeLevel::Warn => warn!(target: "switchboard.controller", message = %toast.message, "toast"),
            NoticeLevel::Error => error!(target: "switchboard.controller", message = %toast.message, "toast"),
        }
        if self.pending.len() == MAX_PENDING_TOASTS {
            self.pending.pop_front();
        }
        self.pending.push_back(toast);
    }

    pub fn drain(&mut self) -> Vec<Toast> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
