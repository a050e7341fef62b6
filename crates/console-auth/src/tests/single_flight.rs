//! Single-flight refresh behavior.

use super::harness::*;
use crate::{AuthError, RefreshConfig, RefreshMachineState, TokenGrant};
use console_storage::{Credential, SessionStorage};
use futures_util::future::join_all;
use std::time::Duration;

#[tokio::test]
async fn concurrent_callers_share_one_refresh_call() {
    let h = TestHarness::new().with_expired_credential();

    let results = join_all((0..5).map(|_| h.coordinator.refresh())).await;

    assert_eq!(h.auth.refresh_calls(), 1);
    let first = results[0].as_ref().unwrap().clone();
    for result in &results {
        assert_eq!(result.as_ref().unwrap(), &first);
    }
    assert_eq!(h.store.get().unwrap(), Some(first));
    assert_eq!(h.auth.refresh_handles_seen(), vec!["initial-handle".to_string()]);
}

#[tokio::test]
async fn store_is_updated_before_any_waiter_resumes() {
    let h = TestHarness::new().with_expired_credential();

    let waiters = (0..3).map(|_| async {
        let credential = h.coordinator.refresh().await.unwrap();
        let stored = h.store.get().unwrap().unwrap();
        assert_eq!(credential, stored);
    });
    join_all(waiters).await;

    assert_eq!(h.auth.refresh_calls(), 1);
}

#[tokio::test]
async fn slot_resets_after_each_cycle() {
    let h = TestHarness::new().with_expired_credential();

    let first = h.coordinator.refresh().await.unwrap();
    assert_eq!(h.coordinator.state(), RefreshMachineState::Idle);
    assert!(!h.coordinator.is_in_flight());

    let second = h.coordinator.refresh().await.unwrap();

    assert_eq!(h.auth.refresh_calls(), 2);
    assert_ne!(first, second);
    assert_eq!(h.coordinator.completed_cycles(), 2);
    // The second cycle presents the handle issued by the first.
    assert_eq!(
        h.auth.refresh_handles_seen(),
        vec!["initial-handle".to_string(), first.refresh_token_id.clone()]
    );
}

#[tokio::test]
async fn in_flight_state_is_visible_while_waiting() {
    let h = TestHarness::new().with_expired_credential();

    let refresh = h.coordinator.refresh();
    let observe = async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        (h.coordinator.state(), h.coordinator.is_in_flight())
    };

    let (result, (state, in_flight)) = tokio::join!(refresh, observe);
    assert!(result.is_ok());
    assert_eq!(state, RefreshMachineState::InFlight);
    assert!(in_flight);
    assert_eq!(h.coordinator.state(), RefreshMachineState::Idle);
}

#[tokio::test]
async fn failure_is_shared_and_tears_down_once() {
    let h = TestHarness::new().with_expired_credential();
    h.storage.set("dashboardFilters", "{}").unwrap();
    h.auth.script_refresh(Scripted::Reject(401));

    let results = join_all((0..4).map(|_| h.coordinator.refresh())).await;

    assert_eq!(h.auth.refresh_calls(), 1);
    for result in results {
        match result {
            Err(AuthError::RefreshFailed(cause)) => {
                assert!(matches!(*cause, AuthError::AuthService { status: 401, .. }));
            }
            other => panic!("expected shared refresh failure, got {:?}", other),
        }
    }

    assert!(h.stored_keys().is_empty());
    assert_eq!(h.navigator.redirects(), 1);
    assert_eq!(h.auth.logout_calls(), 0, "no remote logout on refresh failure");
    assert_eq!(h.coordinator.state(), RefreshMachineState::Idle);
}

#[tokio::test]
async fn hung_refresh_times_out_and_ends_session() {
    let h = TestHarness::build(
        MockAuthService::with_refresh_delay(Duration::ZERO),
        RefreshConfig {
            timeout: Duration::from_millis(50),
        },
    )
    .with_expired_credential();
    h.auth.script_refresh(Scripted::Hang);

    let results = join_all((0..2).map(|_| h.coordinator.refresh())).await;

    for result in results {
        match result {
            Err(AuthError::RefreshFailed(cause)) => assert!(matches!(*cause, AuthError::Timeout)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }
    assert_eq!(h.store.get().unwrap(), None);
    assert_eq!(h.navigator.redirects(), 1);
}

#[tokio::test]
async fn missing_refresh_handle_fails_without_network_call() {
    let h = TestHarness::new();
    h.storage.set("jwt", &expired_token("orphan")).unwrap();

    let err = h.coordinator.refresh().await.unwrap_err();

    match err {
        AuthError::RefreshFailed(cause) => assert!(matches!(*cause, AuthError::NotLoggedIn)),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(h.auth.refresh_calls(), 0);
    assert!(h.stored_keys().is_empty());
    assert_eq!(h.navigator.redirects(), 1);
}

#[tokio::test]
async fn incomplete_grant_counts_as_failure() {
    let h = TestHarness::new().with_expired_credential();
    h.auth
        .script_refresh(Scripted::Grant(TokenGrant::new(fresh_token("half"), "")));

    let err = h.coordinator.refresh().await.unwrap_err();

    match err {
        AuthError::RefreshFailed(cause) => {
            assert!(matches!(*cause, AuthError::InvalidResponse(_)))
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(h.store.get().unwrap(), None);
}

#[tokio::test]
async fn recovers_after_failed_cycle() {
    let h = TestHarness::new().with_expired_credential();
    h.auth.script_refresh(Scripted::Reject(500));

    assert!(h.coordinator.refresh().await.is_err());

    // A later login stores a new credential; the next cycle starts cleanly.
    h.store
        .set(&Credential::new(expired_token("again"), "handle-again"))
        .unwrap();
    let credential = h.coordinator.refresh().await.unwrap();

    assert_eq!(h.auth.refresh_calls(), 2);
    assert_eq!(h.store.get().unwrap(), Some(credential));
}
