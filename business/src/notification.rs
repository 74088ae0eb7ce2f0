//! Toast notification data model.
//!
//! A [`Notification`] is immutable once pushed: the store only ever adds or
//! removes whole entries.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a notification.
///
/// Ids come from a process-wide counter and are never reused, so a stale
/// expiry can never hit a newer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

impl NotificationId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

/// Kind of a notification, which also picks its default lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub const ALL: [Self; 4] = [Self::Success, Self::Error, Self::Warning, Self::Info];
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A toast shown by every notification surface until it expires or is dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    kind: NotificationKind,
    message: String,
    created_at: DateTime<Utc>,
    /// `None` means the toast stays until dismissed.
    timeout: Option<Duration>,
}

impl Notification {
    pub(crate) fn new(
        kind: NotificationKind,
        message: String,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            id: NotificationId::next(),
            kind,
            message,
            created_at: Utc::now(),
            timeout,
        }
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Auto-dismiss delay; `None` for sticky toasts.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the toast stays until explicitly dismissed.
    pub fn is_sticky(&self) -> bool {
        self.timeout.is_none()
    }
}
