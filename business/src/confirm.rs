//! Confirmation request model.
//!
//! The console asks before destructive actions (deleting a user, revoking a
//! service account key, rotating a SAML certificate). The display surface
//! renders [`ConfirmOptions`] verbatim and falls back to the defaults below
//! for anything left out.

use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_TITLE: &str = "Are you sure?";
pub const DEFAULT_CONFIRM_TEXT: &str = "Confirm";
pub const DEFAULT_CANCEL_TEXT: &str = "Cancel";

/// Visual weight of the confirm button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmVariant {
    #[default]
    Plain,
    /// Destructive action, rendered with a red confirm button.
    Danger,
}

/// What to ask the operator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfirmOptions {
    pub title: Option<String>,
    pub description: String,
    pub variant: ConfirmVariant,
    pub confirm_text: Option<String>,
    pub cancel_text: Option<String>,
}

impl ConfirmOptions {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: ConfirmVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Shorthand for `variant(ConfirmVariant::Danger)`.
    #[must_use]
    pub fn danger(self) -> Self {
        self.variant(ConfirmVariant::Danger)
    }

    #[must_use]
    pub fn confirm_text(mut self, text: impl Into<String>) -> Self {
        self.confirm_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn cancel_text(mut self, text: impl Into<String>) -> Self {
        self.cancel_text = Some(text.into());
        self
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    pub fn confirm_label(&self) -> &str {
        self.confirm_text.as_deref().unwrap_or(DEFAULT_CONFIRM_TEXT)
    }

    pub fn cancel_label(&self) -> &str {
        self.cancel_text.as_deref().unwrap_or(DEFAULT_CANCEL_TEXT)
    }

    pub fn is_danger(&self) -> bool {
        self.variant == ConfirmVariant::Danger
    }
}

/// Identifier of one `ask` call, unique for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfirmRequestId(u64);

impl ConfirmRequestId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for ConfirmRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "confirm-{}", self.0)
    }
}

/// The request currently shown by the confirmation surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    id: ConfirmRequestId,
    options: ConfirmOptions,
}

impl ConfirmRequest {
    pub(crate) fn new(options: ConfirmOptions) -> Self {
        Self {
            id: ConfirmRequestId::next(),
            options,
        }
    }

    pub fn id(&self) -> ConfirmRequestId {
        self.id
    }

    pub fn options(&self) -> &ConfirmOptions {
        &self.options
    }
}
