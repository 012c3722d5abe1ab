use crate::application_port::{RefreshError, RefreshTransport};
use crate::domain_model::Credentials;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum FakeRefreshOutcome {
    /// Issue `fake-access:<n>` / `fake-refresh:<n>` where n is the call count.
    Succeed,
    Fail(RefreshError),
}

// Minimal fake for tests and demos: counts calls and answers after an
// optional delay.
#[derive(Debug)]
pub struct FakeRefreshTransport {
    calls: AtomicUsize,
    outcome: Mutex<FakeRefreshOutcome>,
    delay: Duration,
}

impl FakeRefreshTransport {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome: Mutex::new(FakeRefreshOutcome::Succeed),
            delay,
        }
    }

    pub fn failing(error: RefreshError, delay: Duration) -> Self {
        let fake = Self::with_delay(delay);
        fake.set_outcome(FakeRefreshOutcome::Fail(error));
        fake
    }

    pub fn set_outcome(&self, outcome: FakeRefreshOutcome) {
        if let Ok(mut lock) = self.outcome.lock() {
            *lock = outcome;
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeRefreshTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RefreshTransport for FakeRefreshTransport {
    async fn refresh(&self, _credentials: &Credentials) -> Result<Credentials, RefreshError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = self
            .outcome
            .lock()
            .map(|o| o.clone())
            .map_err(|e| RefreshError::Transport(e.to_string()))?;
        match outcome {
            FakeRefreshOutcome::Succeed => Ok(Credentials::new(
                format!("fake-access:{n}"),
                format!("fake-refresh:{n}"),
            )),
            FakeRefreshOutcome::Fail(e) => Err(e),
        }
    }
}
