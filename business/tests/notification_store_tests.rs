//! Toast queue behaviour against the real Tokio clock.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use gateway_console_business::{
    FeedbackConfig, Notification, NotificationId, NotificationKind, NotificationStore,
};
use gateway_console_states::{ManualTimers, TokioTimers};
use tokio::task::LocalSet;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ids(store: &NotificationStore) -> Vec<NotificationId> {
    store.snapshot().iter().map(Notification::id).collect()
}

fn tokio_store() -> NotificationStore {
    NotificationStore::new(FeedbackConfig::default(), Rc::new(TokioTimers::new()))
}

mod expiry_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_success_toast_expires_after_three_seconds() {
        init_logger();
        LocalSet::new()
            .run_until(async {
                let store = tokio_store();
                let id = store.success("User alice created");

                tokio::time::sleep(Duration::from_millis(2_999)).await;
                assert_eq!(ids(&store), vec![id]);

                tokio::time::sleep(Duration::from_millis(2)).await;
                assert!(store.is_empty());
                assert_eq!(store.scheduled_len(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_toast_is_sticky() {
        init_logger();
        LocalSet::new()
            .run_until(async {
                let store = tokio_store();
                let id = store.error("Failed to reach the identity provider");

                tokio::time::sleep(Duration::from_secs(60 * 60)).await;
                assert_eq!(ids(&store), vec![id]);

                store.dismiss(id);
                assert!(store.is_empty());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_toast_timer_does_not_touch_newer_toasts() {
        init_logger();
        LocalSet::new()
            .run_until(async {
                let store = tokio_store();
                let first = store.info("Sync started");
                store.dismiss(first);

                tokio::time::sleep(Duration::from_secs(2)).await;
                let second = store.info("Sync finished");

                // The cancelled timer would have fired here.
                tokio::time::sleep(Duration::from_millis(1_500)).await;
                assert_eq!(ids(&store), vec![second]);

                tokio::time::sleep(Duration::from_secs(2)).await;
                assert!(store.is_empty());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_timeouts_apply() {
        init_logger();
        LocalSet::new()
            .run_until(async {
                let config = FeedbackConfig::from_vars(vec![
                    ("TOAST_WARNING_MS", "500"),
                    ("TOAST_ERROR_MS", "1000"),
                ])
                .expect("config should build");
                let store = NotificationStore::new(config, Rc::new(TokioTimers::new()));

                store.warning("Quota almost reached");
                let error = store.error("Quota exceeded");

                tokio::time::sleep(Duration::from_millis(501)).await;
                assert_eq!(ids(&store), vec![error]);

                tokio::time::sleep(Duration::from_millis(500)).await;
                assert!(store.is_empty());
            })
            .await;
    }
}

mod ordering_tests {
    use super::*;

    #[test]
    fn test_snapshot_is_inserted_minus_dismissed_minus_expired() {
        init_logger();
        let timers = Rc::new(ManualTimers::new());
        let store = NotificationStore::new(FeedbackConfig::default(), timers.clone());

        let mut expected = Vec::new();
        for round in 0..4 {
            let sticky = store.error(format!("error {round}"));
            let short = store.success(format!("saved {round}"));
            let dismissed = store.warning(format!("warning {round}"));
            store.dismiss(dismissed);
            expected.push(sticky);
            expected.push(short);
        }
        assert_eq!(ids(&store), expected);

        timers.advance(Duration::from_secs(3));
        expected.retain(|id| {
            store
                .get(*id)
                .is_some_and(|n| n.kind() == NotificationKind::Error)
        });
        assert_eq!(ids(&store), expected);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_ids_are_unique_across_stores() {
        let a = NotificationStore::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
        let b = NotificationStore::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));

        let first = a.info("from a");
        let second = b.info("from b");
        assert_ne!(first, second);
        assert!(b.get(first).is_none());
    }
}

mod subscription_tests {
    use super::*;

    #[test]
    fn test_each_mutation_notifies_once_with_new_snapshot() {
        init_logger();
        let timers = Rc::new(ManualTimers::new());
        let store = NotificationStore::new(FeedbackConfig::default(), timers.clone());

        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let store_clone = store.clone();
        let _sub = store.subscribe(move || seen_clone.borrow_mut().push(store_clone.len()));

        let a = store.success("a");
        store.info("b");
        store.dismiss(a);
        timers.advance(Duration::from_secs(3));

        assert_eq!(*seen.borrow(), vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_unsubscribed_listener_is_never_called() {
        let store = NotificationStore::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let subscription = store.subscribe(move || count_clone.set(count_clone.get() + 1));

        store.info("before");
        subscription.unsubscribe();
        store.info("after");
        store.clear();

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_changes_channel_reports_versions() {
        let store = NotificationStore::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
        let (_sub, changes) = store.changes();

        let id = store.warning("Session expires in 5 minutes");
        store.dismiss(id);

        let versions: Vec<u64> = changes.try_iter().collect();
        assert_eq!(versions.len(), 2);
        assert!(versions[0] < versions[1]);
    }

    #[test]
    fn test_old_snapshot_is_unchanged_after_push() {
        let store = NotificationStore::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
        store.info("first");
        let before = store.snapshot();
        store.info("second");

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
        assert!(Rc::ptr_eq(&store.snapshot(), &store.snapshot()));
    }
}
