use crate::domain_model::SocketEvent;
use crate::logger::*;
use crate::socket::*;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(250);
/// How long a replaced connection may take to finish its close handshake.
pub const CLOSE_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SocketConfig {
    pub url: String,
    pub backoff: ReconnectBackoff,
    /// Debounce between `connect()` and the underlying open.
    pub settle_delay: Duration,
    pub reconnect: bool,
}

impl SocketConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: ReconnectBackoff::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
            reconnect: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketPhase {
    Idle,
    Connecting,
    Open,
    Closed,
    TornDown,
}

struct TrackedConnection {
    id: u64,
    // set once the handshake completes
    outbound: Option<mpsc::UnboundedSender<ConnMessage>>,
    cancel: CancellationToken,
}

struct Session {
    phase: SocketPhase,
    slot: Option<TrackedConnection>,
    attempt: u32,
    next_id: u64,
    timer: Option<JoinHandle<()>>,
}

impl Session {
    fn is_current(&self, id: u64) -> bool {
        self.slot.as_ref().is_some_and(|slot| slot.id == id)
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct SocketInner {
    config: SocketConfig,
    connector: Arc<dyn SocketConnector>,
    session: Mutex<Session>,
    listeners: Arc<ListenerRegistry>,
    connected: watch::Sender<bool>,
    cancel: CancellationToken,
}

/// A self-healing connection to one push endpoint.
///
/// The client tracks at most one connection. Every lifecycle event carries
/// the id of the connection that raised it, and events from a connection
/// that is no longer tracked are dropped. Closes are followed by a reconnect
/// after an exponential backoff; there is no retry limit.
///
/// All methods must be called from within a tokio runtime. Dropping the
/// client tears it down.
pub struct ResilientSocketClient {
    inner: Arc<SocketInner>,
}

impl ResilientSocketClient {
    pub fn new(config: SocketConfig, connector: Arc<dyn SocketConnector>) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            inner: Arc::new(SocketInner {
                config,
                connector,
                session: Mutex::new(Session {
                    phase: SocketPhase::Idle,
                    slot: None,
                    attempt: 0,
                    next_id: 0,
                    timer: None,
                }),
                listeners: ListenerRegistry::new(),
                connected,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    /// Opens the connection after the settle delay, unless one is already
    /// open or opening. Repeated calls within the delay restart it.
    pub fn connect(&self) {
        self.inner.connect();
    }

    /// Replaces the tracked connection with a new one.
    pub fn reconnect(&self) {
        self.inner.reconnect();
    }

    /// Transmits `event` on the open connection. Returns `false` and drops
    /// the event when there is nothing open to send on.
    pub fn send(&self, event: &SocketEvent) -> bool {
        self.inner.send(event)
    }

    pub fn subscribe<F>(&self, event: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .subscribe(event.into(), Arc::new(callback))
    }

    /// Runs `callback` on every transition to open, reconnects included.
    pub fn on_open<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.listeners.on_open(Arc::new(callback))
    }

    pub fn is_connected(&self) -> bool {
        *self.inner.connected.borrow()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.inner.connected.subscribe()
    }

    pub fn phase(&self) -> SocketPhase {
        self.inner.lock().phase
    }

    /// Consecutive reconnect attempts since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.inner.lock().attempt
    }

    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl Drop for ResilientSocketClient {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl SocketInner {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn connect(self: &Arc<Self>) {
        let mut session = self.lock();
        if session.phase == SocketPhase::TornDown {
            return;
        }
        if session.slot.is_some() {
            trace!("connect ignored, connection already tracked");
            return;
        }

        session.cancel_timer();
        session.phase = SocketPhase::Connecting;
        session.timer = Some(self.schedule_open(self.config.settle_delay));
    }

    fn reconnect(self: &Arc<Self>) {
        let mut session = self.lock();
        if session.phase == SocketPhase::TornDown {
            return;
        }

        if let Some(old) = session.slot.take() {
            debug!("retiring socket connection {}", old.id);
            if let Some(outbound) = &old.outbound {
                let _ = outbound.send(ConnMessage::Close);
            }
            let cancel = old.cancel;
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(CLOSE_GRACE) => cancel.cancel(),
                }
            });
        }

        session.cancel_timer();
        session.phase = SocketPhase::Connecting;
        session.timer = Some(self.schedule_open(self.config.settle_delay));
        drop(session);

        self.connected.send_replace(false);
    }

    fn schedule_open(self: &Arc<Self>, delay: Duration) -> JoinHandle<()> {
        let inner = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => inner.open(),
            }
        })
    }

    fn open(self: &Arc<Self>) {
        let mut session = self.lock();
        session.timer = None;
        if session.phase == SocketPhase::TornDown || session.slot.is_some() {
            return;
        }

        session.next_id += 1;
        let id = session.next_id;
        let cancel = self.cancel.child_token();
        session.slot = Some(TrackedConnection {
            id,
            outbound: None,
            cancel: cancel.clone(),
        });
        session.phase = SocketPhase::Connecting;
        drop(session);

        info!("opening socket connection {} to {}", id, self.config.url);
        tokio::spawn(run_connection(self.clone(), id, cancel));
    }

    fn send(&self, event: &SocketEvent) -> bool {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                debug!("failed to serialize {}: {}", event.event, e);
                return false;
            }
        };

        let session = self.lock();
        if session.phase != SocketPhase::Open {
            return false;
        }
        match session.slot.as_ref().and_then(|slot| slot.outbound.as_ref()) {
            Some(outbound) => outbound.send(ConnMessage::Text(text)).is_ok(),
            None => false,
        }
    }

    fn is_current(&self, id: u64) -> bool {
        self.lock().is_current(id)
    }

    fn handle_open(&self, id: u64, outbound: mpsc::UnboundedSender<ConnMessage>) -> bool {
        let mut session = self.lock();
        match session.slot.as_mut() {
            Some(slot) if slot.id == id => slot.outbound = Some(outbound),
            _ => {
                debug!("ignoring open of stale socket connection {}", id);
                return false;
            }
        }
        session.phase = SocketPhase::Open;
        session.attempt = 0;
        drop(session);

        self.connected.send_replace(true);
        info!("socket connection {} open", id);
        self.listeners.notify_open();
        true
    }

    fn handle_close(self: &Arc<Self>, id: u64) {
        let mut session = self.lock();
        if !session.is_current(id) {
            debug!("ignoring close of stale socket connection {}", id);
            return;
        }
        session.slot = None;
        session.phase = SocketPhase::Closed;

        let retry = if self.config.reconnect {
            session.attempt = (session.attempt + 1).min(MAX_BACKOFF_ATTEMPT);
            let delay = self.config.backoff.next_delay(session.attempt);
            session.cancel_timer();
            session.timer = Some(self.schedule_open(delay));
            Some((session.attempt, delay))
        } else {
            None
        };
        drop(session);

        self.connected.send_replace(false);
        match retry {
            Some((attempt, delay)) => info!(
                "socket connection {} closed, reconnect attempt {} in {:?}",
                id, attempt, delay
            ),
            None => info!("socket connection {} closed", id),
        }
    }

    fn handle_text(&self, text: &str, outbound: &mpsc::UnboundedSender<ConnMessage>) {
        let event: SocketEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(e) => {
                debug!("dropping malformed frame: {}", e);
                return;
            }
        };

        if event.is_ping() {
            match serde_json::to_string(&SocketEvent::pong()) {
                Ok(pong) => {
                    let _ = outbound.send(ConnMessage::Text(pong));
                }
                Err(e) => error!("failed to encode pong: {}", e),
            }
            return;
        }

        self.listeners.dispatch(&event.event, &event.payload);
    }

    fn shutdown(&self) {
        let mut session = self.lock();
        if session.phase == SocketPhase::TornDown {
            return;
        }
        session.phase = SocketPhase::TornDown;
        session.cancel_timer();
        if let Some(slot) = session.slot.take() {
            slot.cancel.cancel();
        }
        drop(session);

        self.cancel.cancel();
        self.connected.send_replace(false);
        info!("socket client for {} torn down", self.config.url);
    }
}

async fn run_connection(inner: Arc<SocketInner>, id: u64, cancel: CancellationToken) {
    let connected = tokio::select! {
        _ = cancel.cancelled() => None,
        result = inner.connector.connect(&inner.config.url) => match result {
            Ok(halves) => Some(halves),
            Err(e) => {
                warn!("socket connection {} failed: {:#}", id, e);
                None
            }
        },
    };

    if let Some((sender, mut receiver)) = connected {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let writer = tokio::spawn(outbound_writer(sender, outbound_rx, cancel.clone()));

        if inner.handle_open(id, outbound_tx.clone()) {
            inbound_reader(&inner, id, &mut *receiver, &outbound_tx, &cancel).await;
        }

        cancel.cancel();
        drop(outbound_tx);
        let _ = writer.await;
    }

    inner.handle_close(id);
}

async fn outbound_writer(
    mut sender: Box<dyn ConnSender>,
    mut outbound_rx: mpsc::UnboundedReceiver<ConnMessage>,
    cancel: CancellationToken,
) {
    while let Some(message) = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        m = outbound_rx.recv() => m,
    } {
        trace!("outbound_writer: {:?}", message);
        let closing = message == ConnMessage::Close;
        if sender.send(message).await.is_err() {
            trace!("outbound_writer shutting down");
            cancel.cancel();
            break;
        }
        if closing {
            break;
        }
    }
}

async fn inbound_reader(
    inner: &SocketInner,
    id: u64,
    receiver: &mut dyn ConnReceiver,
    outbound: &mpsc::UnboundedSender<ConnMessage>,
    cancel: &CancellationToken,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            m = receiver.next() => m,
        };

        let message = match message {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                debug!("socket connection {} read error: {:#}", id, e);
                break;
            }
            None => break,
        };

        if !inner.is_current(id) {
            trace!("ignoring frame from stale socket connection {}", id);
            continue;
        }

        match message {
            ConnMessage::Text(text) => inner.handle_text(&text, outbound),
            ConnMessage::Close => break,
            // tungstenite queues the pong for transport pings itself
            ConnMessage::Ping | ConnMessage::Pong | ConnMessage::Binary(_) => {}
        }
    }
}
