//! Cancellable one-shot timers for expiring UI state.
//!
//! This module provides `TimerId` and `TimerHandle` for timers with
//! cooperative cancellation via `CancellationToken` from `tokio_util`, plus
//! the [`Timers`] seam that stores schedule their expiry through.
//!
//! # Overview
//!
//! - `TimerId`: process-unique identifier, never reused
//! - `TimerHandle`: wraps a timer with its `CancellationToken`
//! - `TokioTimers`: runs each timer as a local task on the UI `LocalSet`
//! - `ManualTimers`: virtual clock advanced explicitly by the host
//!
//! # Usage
//!
//! ```ignore
//! use gateway_console_states::{Timers, TokioTimers};
//!
//! let timers = TokioTimers::new();
//! let handle = timers.schedule(Duration::from_secs(3), Box::new(|| dismiss(id)));
//!
//! // Later, before it fires
//! handle.cancel();
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::trace;
use tokio_util::sync::CancellationToken;

/// Unique identifier for a scheduled timer.
///
/// Generations come from a process-wide counter, so an id handed out once
/// never refers to another timer later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    generation: u64,
}

impl TimerId {
    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self {
            generation: COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Returns the generation counter of this timer identifier.
    ///
    /// Higher generation values indicate more recently scheduled timers.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Handle to a scheduled timer with cooperative cancellation support.
///
/// Cloned handles share the same token: cancelling one cancels them all.
/// A cancelled timer never runs its task.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    cancel_token: CancellationToken,
}

impl TimerHandle {
    /// Creates a new `TimerHandle` with the given ID and cancellation token.
    pub fn new(id: TimerId, cancel_token: CancellationToken) -> Self {
        Self { id, cancel_token }
    }

    /// Returns the `TimerId` of this timer.
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Returns a clone of the cancellation token.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Requests cancellation of this timer.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Returns `true` if cancellation has been requested for this timer.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Task run when a timer fires.
pub type TimerTask = Box<dyn FnOnce()>;

/// Schedules one-shot tasks on the UI thread.
pub trait Timers {
    /// Runs `task` once `after` has elapsed unless the returned handle is
    /// cancelled first.
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle;
}

/// Timers backed by the Tokio clock.
///
/// Each timer is a `spawn_local` task racing `tokio::time::sleep` against
/// its cancellation token.
///
/// # Panics
///
/// [`Timers::schedule`] panics when called outside a `tokio::task::LocalSet`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimers;

impl TokioTimers {
    pub fn new() -> Self {
        Self
    }
}

impl Timers for TokioTimers {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new(TimerId::next(), CancellationToken::new());
        let token = handle.cancellation_token();
        let id = handle.id();

        tokio::task::spawn_local(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!("timer {id:?} cancelled");
                }
                _ = tokio::time::sleep(after) => {
                    if !token.is_cancelled() {
                        trace!("timer {id:?} fired after {after:?}");
                        task();
                    }
                }
            }
        });

        handle
    }
}

struct ManualEntry {
    due: Duration,
    handle: TimerHandle,
    task: TimerTask,
}

/// Timers driven by an explicit virtual clock.
///
/// Nothing fires until [`ManualTimers::advance`] moves the clock past a
/// timer's due time. Useful for hosts that own their own frame loop.
#[derive(Default)]
pub struct ManualTimers {
    now: Cell<Duration>,
    entries: RefCell<Vec<ManualEntry>>,
}

impl fmt::Debug for ManualTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimers")
            .field("now", &self.now.get())
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.now.get()
    }

    /// Number of scheduled timers that are neither fired nor cancelled.
    pub fn pending(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| !entry.handle.is_cancelled())
            .count()
    }

    /// Moves the clock forward by `by`, running every due timer in due order.
    ///
    /// Timers with the same due time run in scheduling order. A task may
    /// schedule new timers; those fire in the same call if they fall due.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        while let Some(entry) = self.pop_due(target) {
            if entry.due > self.now.get() {
                self.now.set(entry.due);
            }
            trace!("manual timer {:?} fired at {:?}", entry.handle.id(), entry.due);
            (entry.task)();
        }
        self.now.set(target);
    }

    fn pop_due(&self, target: Duration) -> Option<ManualEntry> {
        let mut entries = self.entries.borrow_mut();
        entries.retain(|entry| !entry.handle.is_cancelled());
        let pos = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= target)
            .min_by_key(|(_, entry)| (entry.due, entry.handle.id()))
            .map(|(pos, _)| pos)?;
        Some(entries.remove(pos))
    }
}

impl Timers for ManualTimers {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new(TimerId::next(), CancellationToken::new());
        self.entries.borrow_mut().push(ManualEntry {
            due: self.now.get() + after,
            handle: handle.clone(),
            task,
        });
        handle
    }
}
