//! User feedback for the gateway console: transient toasts and awaited
//! confirmation dialogs, shared by every screen on the UI thread.

mod config;
mod confirm;
mod confirm_broker;
mod error;
mod feedback;
mod notification;
mod notification_store;

pub use config::{FeedbackConfig, MAX_TIMEOUT_MS};
pub use confirm::{
    ConfirmOptions, ConfirmRequest, ConfirmRequestId, ConfirmVariant, DEFAULT_CANCEL_TEXT,
    DEFAULT_CONFIRM_TEXT, DEFAULT_TITLE,
};
pub use confirm_broker::{ConfirmBroker, ConfirmHost, Confirmation};
pub use error::FeedbackError;
pub use feedback::Feedback;
pub use notification::{Notification, NotificationId, NotificationKind};
pub use notification_store::NotificationStore;
