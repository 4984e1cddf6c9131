//! `Connection` handle and builder.
//!
//! A [`Connection`] is the application's view of one live socket to the
//! backend for a `(session code, role)` pair. The actual socket lives in
//! a background task (see `worker.rs`); the handle only carries the
//! command channel and the status watch, so every method here is cheap
//! and none of them block.
//!
//! Changing the session code, role, or credentials means closing the
//! handle and building a new one — the outbound queue belongs to the
//! handle and deliberately does not carry across, only across automatic
//! reconnects inside one handle's lifetime.

use std::fmt;

use tokio::sync::{mpsc, watch};

use quizlink_protocol::{ClientCommand, Credentials, RawMessage, Role};
use quizlink_transport::{
    resolve_ws_endpoint, ClientConnection, Connector, TransportError,
    WebSocketConnector,
};

use crate::worker::{Callbacks, Worker, WorkerCommand};
use crate::{QuizlinkError, ReconnectPolicy};

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

/// Observable lifecycle state of a connection.
///
/// ```text
/// Connecting ──open──→ Connected ──close──→ Reconnecting ──open──→ Connected
///                          │                     │
///                        close()          attempts exhausted
///                          │                     │
///                          ▼                     ▼
///                     Disconnected          Disconnected (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// First attempt in progress.
    Connecting,
    /// Live.
    Connected,
    /// Lost the transport; an automatic retry is scheduled or running.
    Reconnecting,
    /// Not connected and not retrying — either closed deliberately or
    /// out of attempts.
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Disconnected => "disconnected",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// ConnectionBuilder
// ---------------------------------------------------------------------------

/// Configures and opens a [`Connection`].
///
/// # Example
///
/// ```rust,no_run
/// use quizlink::prelude::*;
///
/// # async fn run() -> Result<(), QuizlinkError> {
/// let connection = ConnectionBuilder::new("ABC123", Role::Player)
///     .credentials(Credentials::Player {
///         player_id: "p1".into(),
///         player_token: "t1".into(),
///     })
///     .on_message(|msg| tracing::info!(tag = msg.tag(), "event"))
///     .open()?;
/// connection.send(ClientCommand::SubmitAnswer {
///     question_id: "q1".into(),
///     option_index: 2,
/// });
/// # Ok(())
/// # }
/// ```
pub struct ConnectionBuilder<C = WebSocketConnector> {
    session_code: String,
    role: Role,
    credentials: Credentials,
    endpoint_override: Option<String>,
    api_base: Option<String>,
    policy: ReconnectPolicy,
    connector: C,
    callbacks: Callbacks,
}

impl ConnectionBuilder<WebSocketConnector> {
    /// Starts a builder for the given session and role, dialing over
    /// WebSocket.
    pub fn new(session_code: impl Into<String>, role: Role) -> Self {
        Self {
            session_code: session_code.into(),
            role,
            credentials: Credentials::None,
            endpoint_override: None,
            api_base: None,
            policy: ReconnectPolicy::default(),
            connector: WebSocketConnector,
            callbacks: Callbacks::default(),
        }
    }
}

impl<C> ConnectionBuilder<C>
where
    C: Connector<Error = TransportError>,
    C::Connection: ClientConnection<Error = TransportError>,
{
    /// Role-appropriate handshake credentials.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Explicit socket endpoint, overriding environment and derivation.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_override = Some(url.into());
        self
    }

    /// REST base URL the socket endpoint is derived from when no
    /// override or environment URL is present.
    pub fn api_base(mut self, url: impl Into<String>) -> Self {
        self.api_base = Some(url.into());
        self
    }

    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Swaps the transport implementation (tests inject loopback or
    /// scripted connectors here).
    pub fn connector<C2>(self, connector: C2) -> ConnectionBuilder<C2>
    where
        C2: Connector<Error = TransportError>,
        C2::Connection: ClientConnection<Error = TransportError>,
    {
        ConnectionBuilder {
            session_code: self.session_code,
            role: self.role,
            credentials: self.credentials,
            endpoint_override: self.endpoint_override,
            api_base: self.api_base,
            policy: self.policy,
            connector,
            callbacks: self.callbacks,
        }
    }

    /// Called with every application message. Heartbeats and malformed
    /// frames are consumed below this callback and never reach it.
    pub fn on_message(
        mut self,
        callback: impl Fn(RawMessage) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_message = Some(Box::new(callback));
        self
    }

    /// Called on every status transition, in addition to the
    /// [`Connection::status_watch`] channel.
    pub fn on_status(
        mut self,
        callback: impl Fn(ConnectionStatus) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_status = Some(Box::new(callback));
        self
    }

    /// Called on transport-level failures. Purely informational: the
    /// close that follows an error is what drives reconnection.
    pub fn on_error(
        mut self,
        callback: impl Fn(QuizlinkError) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_error = Some(Box::new(callback));
        self
    }

    /// Called exactly once if every reconnect attempt is used up.
    pub fn on_exhausted(
        mut self,
        callback: impl FnOnce() + Send + 'static,
    ) -> Self {
        self.callbacks.on_exhausted = Some(Box::new(callback));
        self
    }

    /// Resolves the endpoint and spawns the connection task.
    ///
    /// From here on every failure — including the very first connect —
    /// surfaces through status, callbacks, and backoff, never as an
    /// error to the caller.
    ///
    /// # Errors
    /// Only configuration problems fail here:
    /// [`TransportError::InvalidEndpoint`] for an empty session code or
    /// an unparseable endpoint.
    pub fn open(self) -> Result<Connection, QuizlinkError> {
        let url = resolve_ws_endpoint(
            self.endpoint_override.as_deref(),
            self.api_base.as_deref(),
            &self.session_code,
        )?;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) =
            watch::channel(ConnectionStatus::Connecting);

        let worker = Worker::new(
            self.connector,
            url,
            self.session_code,
            self.role,
            self.credentials,
            self.policy,
            cmd_rx,
            status_tx,
            self.callbacks,
        );
        tokio::spawn(worker.run());

        Ok(Connection { cmd_tx, status_rx })
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Handle to one live connection.
///
/// Dropping the handle closes the connection (best-effort), so a state
/// holder that owns a `Connection` gets teardown for free when it is
/// itself dropped.
pub struct Connection {
    cmd_tx: mpsc::UnboundedSender<WorkerCommand>,
    status_rx: watch::Receiver<ConnectionStatus>,
}

impl Connection {
    /// Sends a command, or queues it if the transport is not currently
    /// open. Fire-and-forget: delivery is best-effort by contract, so
    /// there is nothing useful to return.
    pub fn send(&self, command: ClientCommand) {
        // A send after terminal disconnect lands in a closed channel;
        // that is the documented "lost message" case, not an error.
        let _ = self.cmd_tx.send(WorkerCommand::Send(command));
    }

    /// Current status snapshot.
    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    /// A watch receiver observing every status transition.
    pub fn status_watch(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Tears the connection down: cancels any pending reconnect,
    /// detaches all callbacks, closes the transport. Idempotent.
    pub fn close(&self) {
        let _ = self.cmd_tx.send(WorkerCommand::Close);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WorkerCommand::Close);
    }
}
