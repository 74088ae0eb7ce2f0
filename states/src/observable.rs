//! Observable value shared by every display surface of the console.
//!
//! An [`Observable<T>`] owns the current value behind an `Rc<T>` so that
//! consumers comparing snapshots by identity (`Rc::ptr_eq`) only see a new
//! pointer after a real mutation.
//!
//! Rules:
//! - `set_and_notify` replaces the value, then runs every listener that was
//!   registered when the call started, in registration order, exactly once.
//! - A listener unsubscribed by an earlier listener in the same pass is skipped.
//! - No borrow is held while listeners run, so a listener may read the
//!   snapshot, subscribe, unsubscribe or even mutate the observable again.
//!
//! Everything here is `!Send`: the console runs its UI state on a single
//! thread and relies on that instead of locks.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use log::trace;

struct Listener {
    key: u64,
    active: Cell<bool>,
    callback: Box<dyn Fn()>,
}

struct ObservableInner<T> {
    value: RefCell<Rc<T>>,
    version: Cell<u64>,
    listeners: RefCell<Vec<Rc<Listener>>>,
    next_key: Cell<u64>,
}

impl<T> ObservableInner<T> {
    fn remove_listener(&self, key: u64) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|l| l.key == key) {
            let listener = listeners.remove(pos);
            listener.active.set(false);
        }
    }
}

/// Shared value with synchronous change notification.
///
/// Cloning an `Observable` yields another handle to the same value and the
/// same listener list.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T: Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: 'static> Observable<T> {
    /// Creates an observable holding `value`, at version 0 with no listeners.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(Rc::new(value)),
                version: Cell::new(0),
                listeners: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
            }),
        }
    }

    /// Returns the current value.
    ///
    /// Two calls without a mutation in between return the same allocation.
    pub fn snapshot(&self) -> Rc<T> {
        Rc::clone(&self.inner.value.borrow())
    }

    /// Number of completed `set_and_notify` calls.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of live registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Registers `listener` to run after every mutation.
    ///
    /// Each call creates a separate registration, even for the same closure.
    pub fn subscribe(&self, listener: impl Fn() + 'static) -> Subscription {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);
        self.inner.listeners.borrow_mut().push(Rc::new(Listener {
            key,
            active: Cell::new(true),
            callback: Box::new(listener),
        }));
        trace!("observable listener {key} registered");

        let weak: Weak<ObservableInner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove_listener(key);
                trace!("observable listener {key} removed");
            }
        })
    }

    /// Subscribes a channel that receives the new version after every mutation.
    ///
    /// Meant for async surfaces that `recv_async().await` and then re-read
    /// [`Observable::snapshot`]. The registration outlives the receiver until
    /// the returned [`Subscription`] is unsubscribed.
    pub fn changes(&self) -> (Subscription, flume::Receiver<u64>) {
        let (send, recv) = flume::unbounded();
        let weak = Rc::downgrade(&self.inner);
        let subscription = self.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                // A dropped receiver only means nobody is watching anymore.
                let _ = send.send(inner.version.get());
            }
        });
        (subscription, recv)
    }

    /// Replaces the value and notifies every listener registered at call time.
    pub fn set_and_notify(&self, value: T) {
        *self.inner.value.borrow_mut() = Rc::new(value);
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);

        let listeners: Vec<Rc<Listener>> = self.inner.listeners.borrow().clone();
        trace!(
            "observable version {version}, notifying {} listener(s)",
            listeners.len()
        );
        for listener in &listeners {
            if listener.active.get() {
                (listener.callback)();
            }
        }
    }
}

/// Handle to one listener registration.
///
/// Dropping a `Subscription` keeps the listener registered; call
/// [`Subscription::unsubscribe`] or convert it with [`Subscription::guard`].
pub struct Subscription {
    unsubscribe: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: RefCell::new(Some(Box::new(unsubscribe))),
        }
    }

    /// Removes the registration. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        let unsubscribe = self.unsubscribe.borrow_mut().take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }
    }

    /// Whether [`Subscription::unsubscribe`] has not been called yet.
    pub fn is_active(&self) -> bool {
        self.unsubscribe.borrow().is_some()
    }

    /// Turns this subscription into a guard that unsubscribes on drop.
    pub fn guard(self) -> SubscriptionGuard {
        SubscriptionGuard { subscription: self }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Unsubscribes its listener when dropped.
#[derive(Debug)]
pub struct SubscriptionGuard {
    subscription: Subscription,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
