use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// region conn message

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnMessage {
    Text(String),
    Binary(Vec<u8>),
    Ping,
    Pong,
    Close,
}

impl From<Message> for ConnMessage {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(t) => ConnMessage::Text(t.as_str().to_owned()),
            Message::Binary(b) => ConnMessage::Binary(b.to_vec()),
            Message::Ping(_) => ConnMessage::Ping,
            Message::Pong(_) => ConnMessage::Pong,
            Message::Close(_) => ConnMessage::Close,
            other => ConnMessage::Binary(other.into_data().to_vec()),
        }
    }
}

impl From<ConnMessage> for Message {
    fn from(message: ConnMessage) -> Message {
        match message {
            ConnMessage::Text(t) => Message::text(t),
            ConnMessage::Binary(b) => Message::binary(b),
            ConnMessage::Ping => Message::Ping(Default::default()),
            ConnMessage::Pong => Message::Pong(Default::default()),
            ConnMessage::Close => Message::Close(None),
        }
    }
}

// endregion

// region conn sender

#[async_trait::async_trait]
pub trait ConnSender: Send + Sync {
    async fn send(&mut self, message: ConnMessage) -> anyhow::Result<()>;
}

#[async_trait::async_trait]
impl ConnSender for SplitSink<WsStream, Message> {
    async fn send(&mut self, message: ConnMessage) -> anyhow::Result<()> {
        SinkExt::send(self, Message::from(message)).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ConnSender for Sender<ConnMessage> {
    async fn send(&mut self, message: ConnMessage) -> anyhow::Result<()> {
        Sender::<ConnMessage>::send(self, message).await?;
        Ok(())
    }
}

// endregion

// region conn receiver

#[async_trait::async_trait]
pub trait ConnReceiver: Send + Sync {
    async fn next(&mut self) -> Option<anyhow::Result<ConnMessage>>;
}

#[async_trait::async_trait]
impl ConnReceiver for SplitStream<WsStream> {
    async fn next(&mut self) -> Option<anyhow::Result<ConnMessage>> {
        StreamExt::next(self)
            .await
            .map(|result| result.map(ConnMessage::from).map_err(anyhow::Error::from))
    }
}

#[async_trait::async_trait]
impl ConnReceiver for Receiver<ConnMessage> {
    async fn next(&mut self) -> Option<anyhow::Result<ConnMessage>> {
        Some(Ok(Receiver::<ConnMessage>::recv(self).await?))
    }
}

// endregion

/// Opens one connection to a push endpoint.
#[async_trait::async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(
        &self,
        url: &str,
    ) -> anyhow::Result<(Box<dyn ConnSender>, Box<dyn ConnReceiver>)>;
}
