use thiserror::Error;

use crate::{ConfirmRequestId, NotificationKind};

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Failed to read feedback configuration: {0}")]
    Config(#[from] serde_env::Error),
    #[error("Timeout for {kind} toasts is {millis}ms, the maximum is {max}ms")]
    TimeoutTooLong {
        kind: NotificationKind,
        millis: u64,
        max: u64,
    },
    #[error("Feedback stores are already installed on this thread")]
    AlreadyInstalled,
    #[error("Feedback stores are not installed on this thread")]
    NotInstalled,
    #[error("Confirmation {pending} is still waiting for a decision")]
    ConfirmBusy { pending: ConfirmRequestId },
}

impl FeedbackError {
    pub fn timeout_too_long(kind: NotificationKind, millis: u64, max: u64) -> Self {
        Self::TimeoutTooLong { kind, millis, max }
    }

    pub fn confirm_busy(pending: ConfirmRequestId) -> Self {
        Self::ConfirmBusy { pending }
    }
}
