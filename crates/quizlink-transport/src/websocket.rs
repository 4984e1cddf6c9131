//! WebSocket connector implementation using `tokio-tungstenite`.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use crate::{ClientConnection, Connector, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Connector`] that dials the backend over WebSocket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn connect(
        &self,
        url: &Url,
    ) -> Result<Self::Connection, Self::Error> {
        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        tracing::debug!(%url, "WebSocket connected");
        Ok(WebSocketConnection { ws })
    }
}

/// One established WebSocket connection.
pub struct WebSocketConnection {
    ws: WsStream,
}

impl ClientConnection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&mut self, text: &str) -> Result<(), Self::Error> {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<String>, Self::Error> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.to_string()));
                }
                Some(Ok(Message::Binary(data))) => {
                    // The wire vocabulary is JSON text; a UTF-8 binary
                    // frame is accepted, anything else skipped.
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => continue,
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // Transport-level ping/pong/fragment: tungstenite's
                // concern, invisible to the quiz protocol.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        e.to_string(),
                    ));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.ws
            .close(None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
