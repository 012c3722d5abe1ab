use crate::socket::{ConnReceiver, ConnSender, SocketConnector};
use futures_util::StreamExt;

/// Connects over WebSocket (ws:// or wss://).
#[derive(Debug, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl SocketConnector for WsConnector {
    async fn connect(
        &self,
        url: &str,
    ) -> anyhow::Result<(Box<dyn ConnSender>, Box<dyn ConnReceiver>)> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(url).await?;
        let (sink, stream) = ws_stream.split();
        Ok((Box::new(sink), Box::new(stream)))
    }
}
