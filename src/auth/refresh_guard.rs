use crate::application_port::*;
use crate::domain_model::Credentials;
use crate::logger::*;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum GuardError<E> {
    #[error("no credentials available")]
    Unauthenticated,
    #[error("session expired: {0}")]
    SessionExpired(RefreshError),
    #[error("failed to persist credentials: {0}")]
    Store(StoreError),
    #[error("{0}")]
    Operation(E),
}

impl<E> GuardError<E> {
    /// True when the caller should treat the user as logged out.
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            GuardError::Unauthenticated | GuardError::SessionExpired(_) | GuardError::Store(_)
        )
    }
}

#[derive(Debug, Clone)]
enum RefreshFailure {
    // the store was cleared before a refresh could start
    SignedOut,
    Refresh(RefreshError),
    Store(StoreError),
}

impl<E> From<RefreshFailure> for GuardError<E> {
    fn from(failure: RefreshFailure) -> Self {
        match failure {
            RefreshFailure::SignedOut => GuardError::Unauthenticated,
            RefreshFailure::Refresh(e) => GuardError::SessionExpired(e),
            RefreshFailure::Store(e) => GuardError::Store(e),
        }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Credentials, RefreshFailure>>>;

// `pending` doubles as the in-flight flag.
#[derive(Default)]
struct RefreshState {
    episode: u64,
    pending: Option<SharedRefresh>,
}

struct GuardInner {
    store: Arc<dyn CredentialStore>,
    transport: Arc<dyn RefreshTransport>,
    state: Mutex<RefreshState>,
}

/// Runs authenticated operations and recovers from expired access tokens.
///
/// When an operation fails with a 401, the guard obtains a fresh token pair
/// and retries the operation once. Concurrent callers that hit a 401 during
/// the same expiry episode share a single refresh call; only the refresh is
/// serialized, each caller replays its own operation independently.
///
/// Clones share the same refresh state. Construct one guard per session and
/// hand it to every call site that issues authenticated requests.
#[derive(Clone)]
pub struct TokenRefreshGuard {
    inner: Arc<GuardInner>,
}

impl TokenRefreshGuard {
    pub fn new(store: Arc<dyn CredentialStore>, transport: Arc<dyn RefreshTransport>) -> Self {
        Self {
            inner: Arc::new(GuardInner {
                store,
                transport,
                state: Mutex::new(RefreshState::default()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_state().pending.is_some()
    }

    /// Like [`perform_authenticated`](Self::perform_authenticated), starting
    /// from whatever pair the store currently holds.
    pub async fn perform<T, E, F, Fut>(&self, operation: F) -> Result<T, GuardError<E>>
    where
        F: Fn(Credentials) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StatusCoded,
    {
        let current = self.inner.store.get().await.map_err(GuardError::Store)?;
        self.perform_authenticated(operation, current).await
    }

    pub async fn perform_authenticated<T, E, F, Fut>(
        &self,
        operation: F,
        current: Option<Credentials>,
    ) -> Result<T, GuardError<E>>
    where
        F: Fn(Credentials) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: StatusCoded,
    {
        let Some(current) = current else {
            return Err(GuardError::Unauthenticated);
        };

        match operation(current.clone()).await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_unauthorized() => {}
            Err(e) => return Err(GuardError::Operation(e)),
        }

        let fresh = self.fresh_credentials(&current).await?;
        // The retry's outcome is final, even another 401.
        operation(fresh).await.map_err(GuardError::Operation)
    }

    async fn fresh_credentials(&self, stale: &Credentials) -> Result<Credentials, RefreshFailure> {
        loop {
            let (pending, seen) = {
                let state = self.inner.lock_state();
                (state.pending.clone(), state.episode)
            };
            if let Some(pending) = pending {
                trace!("joining refresh episode {}", seen);
                return pending.await;
            }

            let stored = self.inner.store.get().await.map_err(RefreshFailure::Store)?;

            let shared = {
                let mut state = self.inner.lock_state();
                if let Some(pending) = &state.pending {
                    trace!("joining refresh episode {}", state.episode);
                    pending.clone()
                } else if state.episode != seen {
                    // An episode ran while the store was being read.
                    continue;
                } else {
                    let stored = match stored {
                        Some(stored) => stored,
                        None => {
                            debug!("credentials cleared, not refreshing");
                            return Err(RefreshFailure::SignedOut);
                        }
                    };
                    // A previous episode may already have replaced the pair
                    // this caller failed with.
                    if stored.access_token != stale.access_token {
                        debug!("credentials already refreshed, retrying with stored pair");
                        return Ok(stored);
                    }

                    state.episode += 1;
                    let episode = state.episode;
                    debug!("starting refresh episode {}", episode);

                    let task = tokio::spawn(run_refresh(self.inner.clone(), episode, stored));
                    let shared = async move {
                        task.await.unwrap_or_else(|e| {
                            Err(RefreshFailure::Refresh(RefreshError::Transport(format!(
                                "refresh task failed: {e}"
                            ))))
                        })
                    }
                    .boxed()
                    .shared();
                    state.pending = Some(shared.clone());
                    shared
                }
            };

            return shared.await;
        }
    }
}

impl GuardInner {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

async fn run_refresh(
    inner: Arc<GuardInner>,
    episode: u64,
    current: Credentials,
) -> Result<Credentials, RefreshFailure> {
    let result = match inner.transport.refresh(&current).await {
        Ok(fresh) => match inner.store.set(&fresh).await {
            Ok(()) => Ok(fresh),
            Err(e) => Err(RefreshFailure::Store(e)),
        },
        Err(e) => Err(RefreshFailure::Refresh(e)),
    };

    match &result {
        Ok(_) => info!("refresh episode {} succeeded", episode),
        Err(e) => warn!("refresh episode {} failed: {:?}", episode, e),
    }

    let mut state = inner.lock_state();
    if state.episode == episode {
        state.pending = None;
    }
    drop(state);

    result
}
