use crate::socket::{ConnMessage, ConnReceiver, ConnSender, SocketConnector};
use anyhow::anyhow;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

const CHANNEL_CAP: usize = 64;

/// The far side of one in-memory connection.
///
/// Dropping `to_client` closes the connection from the server's side.
#[derive(Debug)]
pub struct ServerEnd {
    pub attempt: usize,
    pub to_client: mpsc::Sender<ConnMessage>,
    pub from_client: mpsc::Receiver<ConnMessage>,
}

// In-memory connector for tests and demos. Every accepted connection is
// handed to whoever holds the receiver returned by `new`.
#[derive(Debug)]
pub struct ChannelConnector {
    accepted: mpsc::UnboundedSender<ServerEnd>,
    attempts: AtomicUsize,
    refusing: AtomicBool,
}

impl ChannelConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerEnd>) {
        let (accepted, server_rx) = mpsc::unbounded_channel();
        let connector = Self {
            accepted,
            attempts: AtomicUsize::new(0),
            refusing: AtomicBool::new(false),
        };
        (connector, server_rx)
    }

    /// Number of connect calls seen so far, refused ones included.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn set_refusing(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl SocketConnector for ChannelConnector {
    async fn connect(
        &self,
        _url: &str,
    ) -> anyhow::Result<(Box<dyn ConnSender>, Box<dyn ConnReceiver>)> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.refusing.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }

        let (c2s_tx, c2s_rx) = mpsc::channel(CHANNEL_CAP);
        let (s2c_tx, s2c_rx) = mpsc::channel(CHANNEL_CAP);
        self.accepted
            .send(ServerEnd {
                attempt,
                to_client: s2c_tx,
                from_client: c2s_rx,
            })
            .map_err(|_| anyhow!("no server end listening"))?;

        Ok((Box::new(c2s_tx), Box::new(s2c_rx)))
    }
}
