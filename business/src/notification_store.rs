//! Toast queue shared by every notification surface.
//!
//! Producers anywhere in the console (forms, delete flows, bulk import error
//! reporting) push toasts; surfaces subscribe and render
//! [`NotificationStore::snapshot`] after every change.
//!
//! ## Lifecycle
//!
//! - `push` appends at the end and schedules the kind's auto-dismiss timer
//!   before notifying, so a listener may dismiss the new toast right away.
//! - `dismiss` removes the toast and cancels its timer. Unknown ids are
//!   ignored and do not notify.
//! - An expiring timer removes only its own toast; ids are never reused.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use gateway_console_states::{Observable, Subscription, TimerHandle, Timers};
use log::{debug, error, warn};

use crate::{FeedbackConfig, Notification, NotificationId, NotificationKind};

struct StoreInner {
    queue: Observable<Vec<Notification>>,
    timers: Rc<dyn Timers>,
    expiry: RefCell<HashMap<NotificationId, TimerHandle>>,
    config: FeedbackConfig,
}

impl StoreInner {
    fn remove(&self, id: NotificationId) -> bool {
        let current = self.queue.snapshot();
        let Some(pos) = current.iter().position(|n| n.id() == id) else {
            return false;
        };

        let mut next = current.as_ref().clone();
        next.remove(pos);
        self.queue.set_and_notify(next);
        true
    }

    fn expire(&self, id: NotificationId) {
        // The handle already fired; dropping it is enough.
        self.expiry.borrow_mut().remove(&id);
        if self.remove(id) {
            debug!("Toast {id} expired");
        }
    }
}

/// Process-wide queue of active toasts.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct NotificationStore {
    inner: Rc<StoreInner>,
}

impl fmt::Debug for NotificationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationStore")
            .field("queue", &self.inner.queue)
            .field("timers", &self.inner.expiry.borrow().len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl NotificationStore {
    pub fn new(config: FeedbackConfig, timers: Rc<dyn Timers>) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                queue: Observable::new(Vec::new()),
                timers,
                expiry: RefCell::new(HashMap::new()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &FeedbackConfig {
        &self.inner.config
    }

    /// Appends a toast using the configured timeout for `kind`.
    pub fn push(&self, kind: NotificationKind, message: impl Into<String>) -> NotificationId {
        let timeout = self.inner.config.timeout_for(kind);
        self.push_with_timeout(kind, message, timeout)
    }

    /// Appends a toast with an explicit timeout; `None` keeps it until dismissed.
    pub fn push_with_timeout(
        &self,
        kind: NotificationKind,
        message: impl Into<String>,
        timeout: Option<Duration>,
    ) -> NotificationId {
        let notification = Notification::new(kind, message.into(), timeout);
        let id = notification.id();

        match kind {
            NotificationKind::Error => error!("Toast {id}: {}", notification.message()),
            NotificationKind::Warning => warn!("Toast {id}: {}", notification.message()),
            NotificationKind::Success | NotificationKind::Info => {
                debug!("Toast {id} ({kind}): {}", notification.message());
            }
        }

        if let Some(after) = timeout {
            let weak: Weak<StoreInner> = Rc::downgrade(&self.inner);
            let handle = self.inner.timers.schedule(
                after,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(id);
                    }
                }),
            );
            self.inner.expiry.borrow_mut().insert(id, handle);
        }

        let mut next = self.inner.queue.snapshot().as_ref().clone();
        next.push(notification);
        self.inner.queue.set_and_notify(next);
        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Success, message)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Error, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Warning, message)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.push(NotificationKind::Info, message)
    }

    /// Removes the toast if it is still shown. Idempotent.
    pub fn dismiss(&self, id: NotificationId) {
        let handle = self.inner.expiry.borrow_mut().remove(&id);
        if let Some(handle) = handle {
            handle.cancel();
        }
        if self.inner.remove(id) {
            debug!("Toast {id} dismissed");
        }
    }

    /// Removes every toast and cancels all pending timers.
    pub fn clear(&self) {
        let handles: Vec<TimerHandle> = self
            .inner
            .expiry
            .borrow_mut()
            .drain()
            .map(|(_, handle)| handle)
            .collect();
        for handle in &handles {
            handle.cancel();
        }

        if !self.inner.queue.snapshot().is_empty() {
            debug!("Clearing all toasts");
            self.inner.queue.set_and_notify(Vec::new());
        }
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        self.inner.queue.subscribe(listener)
    }

    /// See [`Observable::changes`].
    pub fn changes(&self) -> (Subscription, flume::Receiver<u64>) {
        self.inner.queue.changes()
    }

    /// Active toasts in insertion order.
    pub fn snapshot(&self) -> Rc<Vec<Notification>> {
        self.inner.queue.snapshot()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.snapshot().iter().find(|n| n.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Toasts with a live auto-dismiss timer.
    pub fn scheduled_len(&self) -> usize {
        self.inner.expiry.borrow().len()
    }
}
