//! Confirmation broker: one modal question at a time, awaited like a call.
//!
//! ```ignore
//! let confirmed = broker
//!     .ask(ConfirmOptions::new("Delete user alice?").danger())
//!     .await;
//! if confirmed {
//!     delete_user("alice").await?;
//! }
//! ```
//!
//! The broker is either idle or has exactly one pending request, which the
//! confirmation surface renders from [`ConfirmBroker::snapshot`]. Requests
//! made while another is pending wait in FIFO order and are shown one after
//! the other. Callers only ever hold a [`Confirmation`] future; the
//! completion side stays inside the broker so nobody can answer their own
//! question.
//!
//! A request always ends in `true` or `false`:
//! - `resolve(outcome)` answers the pending request.
//! - `abandon()` (or dropping the [`ConfirmHost`]) declines everything.
//! - Dropping a `Confirmation` withdraws its request.
//! - Dropping the broker declines every outstanding request.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, ready};

use gateway_console_states::{Observable, Subscription};
use log::debug;
use tokio::sync::oneshot;

use crate::{ConfirmOptions, ConfirmRequest, ConfirmRequestId, FeedbackError};

struct Waiter {
    request: ConfirmRequest,
    reply: oneshot::Sender<bool>,
}

#[derive(Default)]
struct Queue {
    active: Option<Waiter>,
    waiting: VecDeque<Waiter>,
}

impl Queue {
    /// Moves the next live waiter into the active slot.
    fn promote(&mut self) -> Option<ConfirmRequest> {
        while let Some(next) = self.waiting.pop_front() {
            if next.reply.is_closed() {
                debug!("Skipping withdrawn confirmation {}", next.request.id());
                continue;
            }
            let request = next.request.clone();
            self.active = Some(next);
            return Some(request);
        }
        None
    }

    fn active_id(&self) -> Option<ConfirmRequestId> {
        self.active.as_ref().map(|waiter| waiter.request.id())
    }
}

struct BrokerInner {
    current: Observable<Option<ConfirmRequest>>,
    queue: RefCell<Queue>,
}

impl BrokerInner {
    /// Answers the active request and publishes whatever comes next.
    fn settle_active(&self, outcome: bool) -> bool {
        let next = {
            let mut queue = self.queue.borrow_mut();
            let Some(active) = queue.active.take() else {
                return false;
            };
            debug!(
                "Confirmation {} resolved: {}",
                active.request.id(),
                if outcome { "accepted" } else { "declined" }
            );
            // The caller may have stopped waiting; the answer is simply lost then.
            let _ = active.reply.send(outcome);
            queue.promote()
        };
        self.current.set_and_notify(next);
        true
    }

    fn withdraw(&self, id: ConfirmRequestId) {
        if self.queue.borrow().active_id() == Some(id) {
            debug!("Confirmation {id} withdrawn while shown");
            self.settle_active(false);
            return;
        }
        let mut queue = self.queue.borrow_mut();
        let before = queue.waiting.len();
        queue.waiting.retain(|waiter| waiter.request.id() != id);
        if queue.waiting.len() < before {
            debug!("Confirmation {id} withdrawn while queued");
        }
    }

    fn abandon(&self) {
        let (active, waiting) = {
            let mut queue = self.queue.borrow_mut();
            let waiting: Vec<Waiter> = queue.waiting.drain(..).collect();
            (queue.active.take(), waiting)
        };
        let Some(active) = active else {
            return;
        };

        debug!(
            "Confirmation surface gone, declining {} request(s)",
            1 + waiting.len()
        );
        for waiter in std::iter::once(active).chain(waiting) {
            let _ = waiter.reply.send(false);
        }
        self.current.set_and_notify(None);
    }
}

/// Process-wide confirmation broker.
///
/// Cloning yields another handle to the same broker.
#[derive(Clone)]
pub struct ConfirmBroker {
    inner: Rc<BrokerInner>,
}

impl Default for ConfirmBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfirmBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmBroker")
            .field("current", &self.inner.current)
            .field("queued", &self.queued_len())
            .finish()
    }
}

impl ConfirmBroker {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(BrokerInner {
                current: Observable::new(None),
                queue: RefCell::new(Queue::default()),
            }),
        }
    }

    /// Asks the operator and returns a future of their decision.
    ///
    /// The request is registered before this returns: if the broker was
    /// idle the surface already shows it, otherwise it waits its turn.
    pub fn ask(&self, options: ConfirmOptions) -> Confirmation {
        let request = ConfirmRequest::new(options);
        let id = request.id();
        let (reply, receiver) = oneshot::channel();

        let shown = {
            let mut queue = self.inner.queue.borrow_mut();
            let waiter = Waiter {
                request: request.clone(),
                reply,
            };
            if queue.active.is_none() {
                queue.active = Some(waiter);
                true
            } else {
                queue.waiting.push_back(waiter);
                debug!(
                    "Confirmation {id} queued behind {} request(s)",
                    queue.waiting.len()
                );
                false
            }
        };

        if shown {
            debug!("Confirmation {id} shown");
            self.inner.current.set_and_notify(Some(request));
        }

        Confirmation {
            id,
            reply: receiver,
            broker: Rc::downgrade(&self.inner),
            settled: false,
        }
    }

    /// Like [`ConfirmBroker::ask`], but refuses to queue.
    pub fn try_ask(&self, options: ConfirmOptions) -> Result<Confirmation, FeedbackError> {
        if let Some(pending) = self.inner.queue.borrow().active_id() {
            return Err(FeedbackError::confirm_busy(pending));
        }
        Ok(self.ask(options))
    }

    /// Answers the pending request. No-op when idle.
    pub fn resolve(&self, outcome: bool) {
        if !self.inner.settle_active(outcome) {
            debug!("Ignoring confirmation answer while idle");
        }
    }

    pub fn accept(&self) {
        self.resolve(true);
    }

    pub fn decline(&self) {
        self.resolve(false);
    }

    /// Declines the pending request and everything queued behind it.
    pub fn abandon(&self) {
        self.inner.abandon();
    }

    /// Registers a confirmation surface.
    ///
    /// `listener` runs after every change; dropping the returned host
    /// unsubscribes it and abandons whatever is still waiting.
    pub fn attach_host(&self, listener: impl Fn() + 'static) -> ConfirmHost {
        ConfirmHost {
            subscription: self.subscribe(listener),
            broker: Rc::downgrade(&self.inner),
        }
    }

    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        self.inner.current.subscribe(listener)
    }

    /// See [`Observable::changes`].
    pub fn changes(&self) -> (Subscription, flume::Receiver<u64>) {
        self.inner.current.changes()
    }

    /// The request on screen, if any.
    pub fn snapshot(&self) -> Rc<Option<ConfirmRequest>> {
        self.inner.current.snapshot()
    }

    pub fn is_pending(&self) -> bool {
        self.inner.queue.borrow().active.is_some()
    }

    /// Requests waiting behind the pending one.
    pub fn queued_len(&self) -> usize {
        self.inner.queue.borrow().waiting.len()
    }
}

/// The caller's side of one confirmation request.
///
/// Resolves to `true` when accepted and `false` otherwise. Dropping it
/// before it resolves withdraws the request.
#[must_use = "a confirmation is withdrawn when dropped"]
pub struct Confirmation {
    id: ConfirmRequestId,
    reply: oneshot::Receiver<bool>,
    broker: Weak<BrokerInner>,
    settled: bool,
}

impl Confirmation {
    pub fn id(&self) -> ConfirmRequestId {
        self.id
    }
}

impl fmt::Debug for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Confirmation")
            .field("id", &self.id)
            .field("settled", &self.settled)
            .finish()
    }
}

impl Future for Confirmation {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<bool> {
        // A dropped sender means the broker went away: treat as declined.
        let outcome = ready!(Pin::new(&mut self.reply).poll(cx)).unwrap_or(false);
        self.settled = true;
        Poll::Ready(outcome)
    }
}

impl Drop for Confirmation {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(broker) = self.broker.upgrade() {
            broker.withdraw(self.id);
        }
    }
}

/// A mounted confirmation surface.
///
/// Dropping it models the surface unmounting: nothing is left pending.
pub struct ConfirmHost {
    subscription: Subscription,
    broker: Weak<BrokerInner>,
}

impl fmt::Debug for ConfirmHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmHost")
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl Drop for ConfirmHost {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
        if let Some(broker) = self.broker.upgrade() {
            broker.abandon();
        }
    }
}
