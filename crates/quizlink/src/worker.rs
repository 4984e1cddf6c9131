//! The connection task: one task owns one socket, full stop.
//!
//! Everything stateful about a connection — the transport handle, the
//! outbound queue, the attempt counter — lives inside this task, so
//! there is no locking and no observable half-torn-down state. The
//! handle talks to it over a command channel; teardown empties the
//! callback slots *before* the transport is closed, which is what makes
//! a late event from a dying socket unobservable.
//!
//! Lifecycle per iteration of [`Worker::run`]:
//!
//! ```text
//! connect ──ok──→ init + flush queue ──→ serve loop ──close/error──→ backoff ──→ connect …
//!    │                                        │
//!    └──err──→ backoff (or exhausted)       Close command → teardown, done
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use url::Url;

use quizlink_protocol::{
    encode_command, ClientCommand, Credentials, Frame, RawMessage, Role,
};
use quizlink_transport::{ClientConnection, Connector, TransportError};

use crate::{ConnectionStatus, QuizlinkError, ReconnectPolicy};

/// Commands from the [`Connection`](crate::Connection) handle.
pub(crate) enum WorkerCommand {
    Send(ClientCommand),
    Close,
}

/// The four application callback slots.
///
/// Emptied on teardown; an empty slot means the event is absorbed.
#[derive(Default)]
pub(crate) struct Callbacks {
    pub(crate) on_message: Option<Box<dyn Fn(RawMessage) + Send + Sync>>,
    pub(crate) on_status:
        Option<Box<dyn Fn(ConnectionStatus) + Send + Sync>>,
    pub(crate) on_error: Option<Box<dyn Fn(QuizlinkError) + Send + Sync>>,
    pub(crate) on_exhausted: Option<Box<dyn FnOnce() + Send>>,
}

/// What ended a serve loop.
enum ServeOutcome {
    /// Transport died; try again.
    Reconnect,
    /// Deliberate close; the task is done.
    Shutdown,
}

pub(crate) struct Worker<C: Connector> {
    connector: C,
    url: Url,
    session_code: String,
    role: Role,
    credentials: Credentials,
    policy: ReconnectPolicy,
    cmd_rx: mpsc::UnboundedReceiver<WorkerCommand>,
    status_tx: watch::Sender<ConnectionStatus>,
    callbacks: Callbacks,
    /// Outbound messages waiting for the next successful handshake.
    /// FIFO; swapped out wholesale when flushed so a flush never feeds
    /// itself.
    queue: VecDeque<ClientCommand>,
    /// Consecutive failed opens since the last successful one.
    attempts: u32,
}

impl<C> Worker<C>
where
    C: Connector<Error = TransportError>,
    C::Connection: ClientConnection<Error = TransportError>,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        connector: C,
        url: Url,
        session_code: String,
        role: Role,
        credentials: Credentials,
        policy: ReconnectPolicy,
        cmd_rx: mpsc::UnboundedReceiver<WorkerCommand>,
        status_tx: watch::Sender<ConnectionStatus>,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            connector,
            url,
            session_code,
            role,
            credentials,
            policy,
            cmd_rx,
            status_tx,
            callbacks,
            queue: VecDeque::new(),
            attempts: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            self.set_status(if self.attempts == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting
            });

            // Connect, but stay responsive: sends arriving now are
            // queued, a Close aborts the attempt.
            let connected = tokio::select! {
                result = self.connector.connect(&self.url) => Some(result),
                _ = drain_until_close(&mut self.cmd_rx, &mut self.queue) => None,
            };
            let Some(result) = connected else {
                self.teardown();
                return;
            };

            match result {
                Ok(mut conn) => {
                    tracing::info!(
                        session_code = %self.session_code,
                        role = %self.role,
                        "socket open"
                    );
                    match self.serve(&mut conn).await {
                        ServeOutcome::Shutdown => {
                            // Callback slots are already empty; the
                            // socket closes with nobody left to hear it.
                            let _ = conn.close().await;
                            return;
                        }
                        ServeOutcome::Reconnect => {}
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "connect attempt failed");
                    self.emit_error(e);
                }
            }

            if self.attempts >= self.policy.max_attempts {
                tracing::warn!(
                    session_code = %self.session_code,
                    attempts = self.attempts,
                    "reconnect attempts exhausted"
                );
                self.set_status(ConnectionStatus::Disconnected);
                if let Some(exhausted) = self.callbacks.on_exhausted.take()
                {
                    exhausted();
                }
                self.detach();
                return;
            }

            let delay = self.policy.delay_for_attempt(self.attempts);
            self.attempts += 1;
            self.set_status(ConnectionStatus::Reconnecting);
            tracing::info!(
                delay_ms = delay.as_millis() as u64,
                attempt = self.attempts,
                "scheduling reconnect"
            );
            if !self.backoff(delay).await {
                self.teardown();
                return;
            }
        }
    }

    /// Runs one open transport from handshake to its end.
    async fn serve(&mut self, conn: &mut C::Connection) -> ServeOutcome {
        self.attempts = 0;
        self.set_status(ConnectionStatus::Connected);

        // Handshake first, then the queue — drained exactly once, in
        // enqueue order. Sends arriving mid-flush wait on the command
        // channel and follow afterwards.
        let init = ClientCommand::init(self.role, &self.credentials);
        if !self.write(conn, &init).await {
            return ServeOutcome::Reconnect;
        }
        let pending = std::mem::take(&mut self.queue);
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "flushing queued messages");
        }
        for command in pending {
            if !self.write(conn, &command).await {
                return ServeOutcome::Reconnect;
            }
        }

        loop {
            tokio::select! {
                command = self.cmd_rx.recv() => match command {
                    Some(WorkerCommand::Send(command)) => {
                        if !self.write(conn, &command).await {
                            return ServeOutcome::Reconnect;
                        }
                    }
                    Some(WorkerCommand::Close) | None => {
                        tracing::info!(
                            session_code = %self.session_code,
                            "connection closed by caller"
                        );
                        self.teardown();
                        return ServeOutcome::Shutdown;
                    }
                },
                frame = conn.recv() => match frame {
                    Ok(Some(text)) => {
                        match RawMessage::parse(&text) {
                            Some(Frame::Ping) => {
                                if !self.write(conn, &ClientCommand::Pong).await {
                                    return ServeOutcome::Reconnect;
                                }
                            }
                            Some(Frame::Message(raw)) => {
                                if let Some(on_message) =
                                    &self.callbacks.on_message
                                {
                                    on_message(raw);
                                }
                            }
                            None => {
                                tracing::trace!("dropping malformed frame");
                            }
                        }
                    }
                    Ok(None) => {
                        tracing::info!(
                            session_code = %self.session_code,
                            "server closed the socket"
                        );
                        return ServeOutcome::Reconnect;
                    }
                    Err(e) => {
                        // Error, then reconnect — sequential, not
                        // alternative outcomes.
                        self.emit_error(e);
                        return ServeOutcome::Reconnect;
                    }
                }
            }
        }
    }

    /// Serializes and writes one command. Returns `false` when the
    /// transport is dead.
    async fn write(
        &mut self,
        conn: &mut C::Connection,
        command: &ClientCommand,
    ) -> bool {
        let text = match encode_command(command) {
            Ok(text) => text,
            Err(e) => {
                // Unserializable command: drop the frame, keep the
                // connection.
                self.emit_error(e);
                return true;
            }
        };
        match conn.send(&text).await {
            Ok(()) => true,
            Err(e) => {
                self.emit_error(e);
                false
            }
        }
    }

    /// Sleeps out a backoff delay while keeping the command channel
    /// live. Returns `false` if a Close arrived (the pending reconnect
    /// is thereby cancelled).
    async fn backoff(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                command = self.cmd_rx.recv() => match command {
                    Some(WorkerCommand::Send(command)) => {
                        self.queue.push_back(command);
                    }
                    Some(WorkerCommand::Close) | None => return false,
                }
            }
        }
    }

    /// Final status plus callback detach. After this, nothing the old
    /// transport does can reach the application.
    fn teardown(&mut self) {
        self.set_status(ConnectionStatus::Disconnected);
        self.detach();
    }

    fn detach(&mut self) {
        self.callbacks.on_message = None;
        self.callbacks.on_status = None;
        self.callbacks.on_error = None;
        self.callbacks.on_exhausted = None;
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
        if changed {
            tracing::debug!(status = %status, "connection status");
            if let Some(on_status) = &self.callbacks.on_status {
                on_status(status);
            }
        }
    }

    fn emit_error(&self, error: impl Into<QuizlinkError>) {
        let error = error.into();
        tracing::debug!(error = %error, "connection error");
        if let Some(on_error) = &self.callbacks.on_error {
            on_error(error);
        }
    }
}

/// Absorbs commands while no transport exists: sends are queued for the
/// next flush, a Close (or a dropped handle) resolves.
async fn drain_until_close(
    cmd_rx: &mut mpsc::UnboundedReceiver<WorkerCommand>,
    queue: &mut VecDeque<ClientCommand>,
) {
    loop {
        match cmd_rx.recv().await {
            Some(WorkerCommand::Send(command)) => queue.push_back(command),
            Some(WorkerCommand::Close) | None => return,
        }
    }
}
