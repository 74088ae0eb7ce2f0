//! UI-thread state primitives for the gateway console.
//!
//! - [`Observable`]: shared value with synchronous change notification.
//! - [`Timers`]: seam for cancellable one-shot timers, with a Tokio-backed
//!   and a manually driven implementation.

mod observable;
mod timer;

pub use observable::{Observable, Subscription, SubscriptionGuard};
pub use timer::{ManualTimers, TimerHandle, TimerId, TimerTask, Timers, TokioTimers};
