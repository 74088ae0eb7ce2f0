use std::cell::OnceCell;
use std::rc::Rc;

use gateway_console_states::{Timers, TokioTimers};
use log::info;

use crate::{ConfirmBroker, FeedbackConfig, FeedbackError, NotificationStore};

thread_local! {
    static INSTALLED: OnceCell<Feedback> = const { OnceCell::new() };
}

/// The toast queue and the confirmation broker, shared by the whole console.
///
/// Both stores live on the UI thread. [`Feedback::install`] makes one pair
/// reachable through [`Feedback::current`] for code that cannot be handed
/// a reference, such as a deeply nested form handler.
#[derive(Debug, Clone)]
pub struct Feedback {
    notifications: NotificationStore,
    confirmations: ConfirmBroker,
}

impl Feedback {
    pub fn new(config: FeedbackConfig, timers: Rc<dyn Timers>) -> Self {
        Self {
            notifications: NotificationStore::new(config, timers),
            confirmations: ConfirmBroker::new(),
        }
    }

    /// Stores backed by Tokio timers. Toast expiry needs a `LocalSet`.
    pub fn with_tokio(config: FeedbackConfig) -> Self {
        Self::new(config, Rc::new(TokioTimers))
    }

    /// Makes these stores the ones returned by [`Feedback::current`] on
    /// this thread. Only the first call succeeds.
    pub fn install(self) -> Result<(), FeedbackError> {
        INSTALLED.with(|cell| {
            cell.set(self).map_err(|_| FeedbackError::AlreadyInstalled)?;
            info!("Feedback stores installed");
            Ok(())
        })
    }

    pub fn current() -> Result<Self, FeedbackError> {
        INSTALLED.with(|cell| cell.get().cloned().ok_or(FeedbackError::NotInstalled))
    }

    pub fn is_installed() -> bool {
        INSTALLED.with(|cell| cell.get().is_some())
    }

    pub fn notifications(&self) -> &NotificationStore {
        &self.notifications
    }

    pub fn confirmations(&self) -> &ConfirmBroker {
        &self.confirmations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfirmOptions;
    use gateway_console_states::ManualTimers;

    fn feedback() -> Feedback {
        Feedback::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()))
    }

    // Each #[test] runs on its own thread, so the registry starts empty.
    #[test]
    fn test_current_before_install() {
        assert!(!Feedback::is_installed());
        assert!(matches!(
            Feedback::current(),
            Err(FeedbackError::NotInstalled)
        ));
    }

    #[test]
    fn test_install_once() {
        feedback().install().expect("first install succeeds");
        assert!(Feedback::is_installed());
        assert!(matches!(
            feedback().install(),
            Err(FeedbackError::AlreadyInstalled)
        ));
    }

    #[test]
    fn test_current_shares_stores() {
        let installed = feedback();
        installed.clone().install().expect("first install succeeds");

        let current = Feedback::current().expect("installed");
        let id = current.notifications().info("Group created");
        assert!(installed.notifications().get(id).is_some());

        let _answer = current
            .confirmations()
            .ask(ConfirmOptions::new("Remove member?"));
        assert!(installed.confirmations().is_pending());
    }
}
