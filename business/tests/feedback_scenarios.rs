//! End-to-end flows through the installed feedback stores.

use std::rc::Rc;
use std::time::Duration;

use gateway_console_business::{
    ConfirmOptions, Feedback, FeedbackConfig, FeedbackError, Notification, NotificationKind,
};
use gateway_console_states::ManualTimers;
use tokio::task::LocalSet;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_error_toast_push_and_dismiss() {
    init_logger();
    let feedback = Feedback::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
    let toasts = feedback.notifications();

    let id = toasts.push(NotificationKind::Error, "Network failure");
    let snapshot = toasts.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id(), id);
    assert_eq!(snapshot[0].kind(), NotificationKind::Error);
    assert_eq!(snapshot[0].message(), "Network failure");

    toasts.dismiss(id);
    assert!(toasts.snapshot().is_empty());
}

#[test]
fn test_dismiss_middle_toast() {
    let feedback = Feedback::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
    let toasts = feedback.notifications();

    let a = toasts.info("A");
    let b = toasts.info("B");
    let c = toasts.info("C");
    toasts.dismiss(b);

    let remaining: Vec<_> = toasts.snapshot().iter().map(Notification::id).collect();
    assert_eq!(remaining, vec![a, c]);
}

#[tokio::test(start_paused = true)]
async fn test_delete_flow_with_confirmation_and_toast() {
    init_logger();
    LocalSet::new()
        .run_until(async {
            Feedback::with_tokio(FeedbackConfig::default())
                .install()
                .expect("first install on this thread");

            let delete_user = tokio::task::spawn_local(async {
                let feedback = Feedback::current()?;
                let confirmed = feedback
                    .confirmations()
                    .ask(ConfirmOptions::new("Delete user alice?").danger())
                    .await;
                if confirmed {
                    feedback.notifications().success("User alice deleted");
                }
                Ok::<bool, FeedbackError>(confirmed)
            });

            tokio::time::sleep(Duration::from_millis(1)).await;
            let feedback = Feedback::current().expect("installed above");
            let shown = feedback.confirmations().snapshot();
            let request = shown.as_ref().as_ref().expect("dialog should be open");
            assert!(request.options().is_danger());

            feedback.confirmations().resolve(true);
            let confirmed = delete_user
                .await
                .expect("task should not panic")
                .expect("feedback is installed");
            assert!(confirmed);
            assert!(feedback.confirmations().snapshot().is_none());
            assert_eq!(feedback.notifications().len(), 1);

            tokio::time::sleep(Duration::from_millis(3_010)).await;
            assert!(feedback.notifications().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_abandoned_confirmation_resolves_false() {
    let feedback = Feedback::new(FeedbackConfig::default(), Rc::new(ManualTimers::new()));
    let host = feedback.confirmations().attach_host(|| {});

    let answer = feedback
        .confirmations()
        .ask(ConfirmOptions::new("Remove SAML provider?"));
    drop(host);

    assert!(!answer.await);
    assert!(!feedback.confirmations().is_pending());
}
