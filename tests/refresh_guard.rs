use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use walrus_notes::application_impl::*;
use walrus_notes::application_port::*;
use walrus_notes::auth::*;
use walrus_notes::domain_model::Credentials;

const EXPIRED: &str = "expired-access";

fn expired_store() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        EXPIRED, "refresh-0",
    )))
}

/// Fails with 401 for the expired token, records every token it sees.
async fn notes_endpoint(
    credentials: Credentials,
    seen: Arc<Mutex<Vec<String>>>,
) -> Result<String, ApiError> {
    seen.lock().unwrap().push(credentials.access().to_owned());
    tokio::time::sleep(Duration::from_millis(5)).await;
    if credentials.access() == EXPIRED {
        Err(ApiError::with_status(401, "token expired"))
    } else {
        Ok(credentials.access().to_owned())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_calls_share_one_refresh() {
    let store = expired_store();
    let transport = Arc::new(FakeRefreshTransport::with_delay(Duration::from_millis(200)));
    let guard = TokenRefreshGuard::new(store.clone(), transport.clone());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let guard = guard.clone();
        let seen = seen.clone();
        handles.push(tokio::spawn(async move {
            guard
                .perform(|credentials| notes_endpoint(credentials, seen.clone()))
                .await
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "fake-access:1");
    }

    assert_eq!(transport.calls(), 1);
    assert_eq!(
        store.get().await.unwrap(),
        Some(Credentials::new("fake-access:1", "fake-refresh:1"))
    );
    assert!(!guard.is_refreshing());

    // every caller tried once with the expired pair and once with the fresh one
    let seen = seen.lock().unwrap();
    assert_eq!(seen.iter().filter(|t| *t == EXPIRED).count(), 16);
    assert_eq!(seen.iter().filter(|t| *t == "fake-access:1").count(), 16);
}

#[tokio::test]
async fn non_auth_errors_pass_through_untouched() {
    let store = expired_store();
    let transport = Arc::new(FakeRefreshTransport::new());
    let guard = TokenRefreshGuard::new(store, transport.clone());

    let result: Result<(), _> = guard
        .perform(|_| async { Err(ApiError::with_status(500, "upstream 401 unauthorized")) })
        .await;

    match result {
        Err(GuardError::Operation(e)) => {
            assert_eq!(e, ApiError::with_status(500, "upstream 401 unauthorized"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refresh_failure_is_terminal_for_every_waiter() {
    let store = expired_store();
    let transport = Arc::new(FakeRefreshTransport::failing(
        RefreshError::Rejected { status: 401 },
        Duration::from_millis(200),
    ));
    let guard = TokenRefreshGuard::new(store.clone(), transport.clone());
    let operation_calls = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let guard = guard.clone();
        let operation_calls = operation_calls.clone();
        handles.push(tokio::spawn(async move {
            guard
                .perform(|_| {
                    operation_calls.fetch_add(1, Ordering::SeqCst);
                    async {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Err::<(), _>(ApiError::with_status(401, "token expired"))
                    }
                })
                .await
        }));
    }

    for handle in handles {
        match handle.await.unwrap() {
            Err(GuardError::SessionExpired(RefreshError::Rejected { status: 401 })) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    assert_eq!(transport.calls(), 1);
    // one attempt each, no replays after the failed refresh
    assert_eq!(operation_calls.load(Ordering::SeqCst), 8);
    assert!(!guard.is_refreshing());
    // the guard never erases credentials itself
    assert!(store.get().await.unwrap().is_some());
}

#[tokio::test]
async fn next_expiry_starts_a_new_episode() {
    let store = expired_store();
    let transport = Arc::new(FakeRefreshTransport::new());
    let guard = TokenRefreshGuard::new(store.clone(), transport.clone());

    let first = guard
        .perform(|credentials| async move {
            if credentials.access() == EXPIRED {
                Err(ApiError::with_status(401, "expired"))
            } else {
                Ok(credentials.access().to_owned())
            }
        })
        .await
        .unwrap();
    assert_eq!(first, "fake-access:1");

    // the refreshed token expires too
    let second = guard
        .perform(|credentials| async move {
            if credentials.access() == "fake-access:1" {
                Err(ApiError::with_status(401, "expired"))
            } else {
                Ok(credentials.access().to_owned())
            }
        })
        .await
        .unwrap();
    assert_eq!(second, "fake-access:2");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn sign_out_during_request_is_not_undone_by_refresh() {
    let store = expired_store();
    let transport = Arc::new(FakeRefreshTransport::new());
    let guard = TokenRefreshGuard::new(store.clone(), transport.clone());
    let entered = Arc::new(tokio::sync::Notify::new());
    let released = Arc::new(tokio::sync::Notify::new());

    let request = {
        let guard = guard.clone();
        let entered = entered.clone();
        let released = released.clone();
        tokio::spawn(async move {
            guard
                .perform(|_| {
                    let entered = entered.clone();
                    let released = released.clone();
                    async move {
                        entered.notify_one();
                        released.notified().await;
                        Err::<(), _>(ApiError::with_status(401, "token expired"))
                    }
                })
                .await
        })
    };

    entered.notified().await;
    store.clear().await.unwrap();
    released.notify_one();

    let result = request.await.unwrap();
    assert!(matches!(result, Err(GuardError::Unauthenticated)));
    assert_eq!(transport.calls(), 0);
    assert_eq!(store.get().await.unwrap(), None);
}
