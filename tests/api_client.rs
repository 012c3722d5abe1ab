use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use walrus_notes::application_impl::*;
use walrus_notes::application_port::*;
use walrus_notes::auth::*;
use walrus_notes::domain_model::Credentials;
use warp::Filter;
use warp::http::StatusCode;

struct TestApi {
    addr: SocketAddr,
    refresh_calls: Arc<AtomicUsize>,
}

/// Notes API stub: `/notes` only accepts `access-1`, and `/auth/refresh`
/// trades `refresh-0` for the `access-1`/`refresh-1` pair.
fn start_api(accept_refresh: bool) -> TestApi {
    let refresh_calls = Arc::new(AtomicUsize::new(0));

    let calls = refresh_calls.clone();
    let refresh = warp::path!("auth" / "refresh")
        .and(warp::post())
        .and(warp::body::json())
        .map(move |body: Value| {
            calls.fetch_add(1, Ordering::SeqCst);
            if accept_refresh && body["refresh_token"] == "refresh-0" {
                warp::reply::with_status(
                    warp::reply::json(&json!({
                        "access_token": "access-1",
                        "refresh_token": "refresh-1",
                    })),
                    StatusCode::OK,
                )
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({"error": "invalid refresh token"})),
                    StatusCode::UNAUTHORIZED,
                )
            }
        });

    let notes = warp::path!("notes")
        .and(warp::get())
        .and(warp::header::optional::<String>("authorization"))
        .map(|authorization: Option<String>| {
            if authorization.as_deref() == Some("Bearer access-1") {
                warp::reply::with_status(
                    warp::reply::json(&json!([{"id": "n1", "title": "walrus"}])),
                    StatusCode::OK,
                )
            } else {
                warp::reply::with_status(
                    warp::reply::json(&json!({"error": "token expired"})),
                    StatusCode::UNAUTHORIZED,
                )
            }
        });

    let (addr, server) = warp::serve(refresh.or(notes).unify()).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    TestApi {
        addr,
        refresh_calls,
    }
}

fn client_for(api: &TestApi, store: Arc<MemoryCredentialStore>) -> ApiClient {
    let base_url = format!("http://{}", api.addr);
    let transport = HttpRefreshTransport::try_new(&HttpRefreshConfig {
        base_url: base_url.clone(),
        refresh_path: "/auth/refresh".to_owned(),
        timeout: Duration::from_secs(5),
    })
    .unwrap();
    let guard = TokenRefreshGuard::new(store, Arc::new(transport));
    ApiClient::try_new(
        &ApiClientConfig {
            base_url,
            timeout: Duration::from_secs(5),
        },
        guard,
    )
    .unwrap()
}

#[tokio::test]
async fn expired_token_is_refreshed_transparently() {
    let api = start_api(true);
    let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        "access-0",
        "refresh-0",
    )));
    let client = client_for(&api, store.clone());

    let notes: Vec<Value> = client.get_json("/notes").await.unwrap();

    assert_eq!(notes, vec![json!({"id": "n1", "title": "walrus"})]);
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.get().await.unwrap(),
        Some(Credentials::new("access-1", "refresh-1"))
    );

    // the stored pair is good now, no further refresh
    let _: Vec<Value> = client.get_json("/notes").await.unwrap();
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_refresh_logs_the_user_out() {
    let api = start_api(false);
    let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        "access-0",
        "refresh-0",
    )));
    let client = client_for(&api, store.clone());

    let result = client.get_json::<Vec<Value>>("/notes").await;

    match result {
        Err(GuardError::SessionExpired(RefreshError::Rejected { status: 401 })) => {}
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(store.get().await.unwrap(), None);

    // signed out: the next call fails fast without touching the network
    let result = client.get_json::<Vec<Value>>("/notes").await;
    assert!(matches!(result, Err(GuardError::Unauthenticated)));
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sign_in_then_request() {
    let api = start_api(true);
    let store = Arc::new(MemoryCredentialStore::new());
    let client = client_for(&api, store.clone());

    client
        .sign_in(&Credentials::new("access-1", "refresh-1"))
        .await
        .unwrap();
    let notes: Vec<Value> = client.get_json("/notes").await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 0);

    client.sign_out().await.unwrap();
    assert_eq!(store.get().await.unwrap(), None);
}

#[tokio::test]
async fn unknown_route_is_passed_through() {
    let api = start_api(true);
    let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::new(
        "access-1",
        "refresh-1",
    )));
    let client = client_for(&api, store.clone());

    let result = client.get_json::<Value>("/layouts").await;
    match result {
        Err(GuardError::Operation(e)) => assert_eq!(e.status, Some(404)),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(store.get().await.unwrap().is_some());
}
