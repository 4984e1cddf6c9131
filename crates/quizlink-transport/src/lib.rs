//! Client transport seam for quizlink.
//!
//! Provides the [`Connector`] and [`ClientConnection`] traits that
//! abstract over the outbound socket, plus endpoint resolution for the
//! quiz backend's WebSocket namespace.
//!
//! The connection manager owns exactly one [`ClientConnection`] at a
//! time and talks to it in terms of text frames; everything below that
//! (TLS, transport-level ping/pong, frame reassembly) stays inside the
//! connector implementation.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket connector via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod endpoint;
mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use endpoint::{resolve_ws_endpoint, WS_NAMESPACE, WS_URL_ENV};
pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketConnector};

/// Establishes outbound connections to the backend.
pub trait Connector: Send + Sync + 'static {
    /// The connection type produced by this connector.
    type Connection: ClientConnection;
    /// The error type for connect attempts.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a connection to the given endpoint.
    fn connect(
        &self,
        url: &url::Url,
    ) -> impl std::future::Future<Output = Result<Self::Connection, Self::Error>>
           + Send;
}

/// One established connection, exchanging text frames.
pub trait ClientConnection: Send + 'static {
    /// The error type for send/recv operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one text frame.
    fn send(
        &mut self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

    /// Reads the next text frame.
    ///
    /// Returns `Ok(None)` when the peer closes cleanly. Must be
    /// cancel-safe: the connection manager polls it inside `select!`.
    fn recv(
        &mut self,
    ) -> impl std::future::Future<Output = Result<Option<String>, Self::Error>>
           + Send;

    /// Closes the connection.
    fn close(
        &mut self,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}
