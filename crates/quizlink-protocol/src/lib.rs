//! Wire protocol for quizlink.
//!
//! This crate defines what travels between the quiz clients and the
//! backend, and how inbound traffic is vetted and routed:
//!
//! - **Types** ([`ClientCommand`], [`HostEvent`], [`PlayerEvent`], …) —
//!   the tagged message vocabulary per direction and role.
//! - **Frame boundary** ([`RawMessage`], [`Frame`]) — lenient parsing
//!   that drops malformed frames and classifies heartbeats.
//! - **Dispatch** ([`Dispatcher`]) — tag → handler routing.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (text frames) and the
//! connection manager (lifecycle, queuing). It knows nothing about
//! sockets or reconnection — only message shapes.
//!
//! ```text
//! Transport (text) → Protocol (RawMessage / typed event) → Application state
//! ```

mod dispatch;
mod error;
mod frame;
mod types;

pub use dispatch::Dispatcher;
pub use error::ProtocolError;
pub use frame::{is_message_type, Frame, RawMessage};
pub use types::{
    tags, AnswerTallyEntry, ClientCommand, Credentials, HostEvent,
    LobbyPlayer, PlayerEvent, Role, TeamStanding,
};

/// Serializes an outbound command to its wire form.
pub fn encode_command(command: &ClientCommand) -> Result<String, ProtocolError> {
    serde_json::to_string(command).map_err(ProtocolError::Encode)
}
