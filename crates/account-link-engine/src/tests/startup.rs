//! initialize() and the one-shot session listener.

use super::harness::{Call, Failure, ScriptedProvider, TestHarness};
use crate::{AuthError, LinkState, Session};

#[tokio::test]
async fn no_session_signs_in_anonymously() {
    let harness = TestHarness::new();

    let session = harness.controller.initialize().await.unwrap();

    assert!(session.is_anonymous);
    assert!(session.provider_ids.is_empty());
    assert_eq!(
        harness.provider.calls(),
        vec![Call::Subscribe, Call::SignInAnonymously]
    );

    let report = harness.controller.status_report().unwrap();
    assert!(report.is_anonymous);
    assert!(report.provider_ids.is_empty());
    assert!(!report.is_zombie);

    let view = harness.controller.view();
    assert!(view.auth_initialized);
    assert_eq!(view.link_state, LinkState::AnonymousSession);
    assert_eq!(
        view.log,
        vec![
            "Auth state initialized.",
            "No authenticated session found.",
            "Going to sign in anonymously.",
            "Signed in anonymously.",
        ]
    );
}

#[tokio::test]
async fn restored_session_is_rendered_without_sign_in() {
    let harness = TestHarness::new();
    harness
        .provider
        .backend()
        .restore_session(Session::anonymous("restoredABCDEFGHIJ"));

    let session = harness.controller.initialize().await.unwrap();

    assert_eq!(session.id, "restoredABCDEFGHIJ");
    assert_eq!(harness.provider.count(Call::SignInAnonymously), 0);
    assert!(harness
        .controller
        .view()
        .user_status
        .contains("id: resto...FGHIJ"));
}

#[tokio::test]
async fn listener_branch_runs_once_despite_repeated_notifications() {
    let harness = TestHarness::with_provider(ScriptedProvider::restoring());
    let controller = harness.controller.clone();
    let task = tokio::spawn(async move { controller.initialize().await });

    let listeners = harness.provider.backend().listeners().clone();
    while listeners.listener_count() == 0 {
        tokio::task::yield_now().await;
    }

    listeners.notify(None);
    listeners.notify(None);
    listeners.notify(None);

    let session = task.await.unwrap().unwrap();
    assert!(session.is_anonymous);
    assert_eq!(harness.provider.count(Call::SignInAnonymously), 1);
    assert_eq!(listeners.listener_count(), 0);

    let initialized = harness
        .log()
        .iter()
        .filter(|line| *line == "Auth state initialized.")
        .count();
    assert_eq!(initialized, 1);
}

#[tokio::test]
async fn later_session_changes_do_not_rerun_startup() {
    let harness = TestHarness::new();
    harness.controller.initialize().await.unwrap();

    harness.controller.sign_out();
    tokio::task::yield_now().await;

    assert_eq!(harness.provider.count(Call::SignInAnonymously), 1);
    assert_eq!(harness.provider.backend().listeners().listener_count(), 0);
    assert!(harness.controller.status_report().is_none());
}

#[tokio::test]
async fn failed_anonymous_sign_in_is_reported() {
    let harness = TestHarness::new();
    harness
        .provider
        .fail_next(Call::SignInAnonymously, Failure::Provider);

    let err = harness.controller.initialize().await.unwrap_err();

    assert!(matches!(err, AuthError::Provider(_)));
    assert!(harness.controller.view().auth_initialized);
    assert!(harness.log_contains("Error: Could not sign in anonymously"));
    assert_eq!(harness.controller.link_state(), LinkState::NoSession);
}

#[tokio::test]
async fn success_without_session_is_missing_session() {
    let harness = TestHarness::new();
    harness
        .provider
        .fail_next(Call::SignInAnonymously, Failure::LoseSession);

    let err = harness.controller.initialize().await.unwrap_err();

    assert!(matches!(err, AuthError::MissingSession(_)));
    assert!(harness.log_contains("Session missing after anonymous sign-in"));
}
