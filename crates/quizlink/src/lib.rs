//! # quizlink
//!
//! Real-time client SDK for live multiplayer quiz games.
//!
//! The backend owns the game — scoring, rounds, team assignment. This
//! SDK owns the client's half of the conversation:
//!
//! - [`Connection`] / [`ConnectionBuilder`] — a reconnecting socket per
//!   `(session code, role)` with exponential backoff, outbound queuing
//!   while disconnected, heartbeat replies, and a status FSM.
//! - `quizlink_protocol` — the tagged message vocabulary, the
//!   malformed-frame boundary, and tag-keyed dispatch (re-exported via
//!   [`prelude`]).
//! - `quizlink_api` — the REST client for sessions and question banks.
//! - `quizlink_fetch` — TTL caching, in-flight de-duplication, polling.
//! - `quizlink_session` — the client-held player identity and token.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quizlink::prelude::*;
//!
//! # async fn run() -> Result<(), QuizlinkError> {
//! let connection = ConnectionBuilder::new("ABC123", Role::Player)
//!     .credentials(Credentials::Player {
//!         player_id: "p1".into(),
//!         player_token: "t1".into(),
//!     })
//!     .on_message(|msg| println!("{}", msg.tag()))
//!     .open()?;
//!
//! connection.send(ClientCommand::SubmitAnswer {
//!     question_id: "q1".into(),
//!     option_index: 2,
//! });
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod policy;
mod worker;

pub use client::{Connection, ConnectionBuilder, ConnectionStatus};
pub use error::QuizlinkError;
pub use policy::ReconnectPolicy;

/// The common imports for building a quiz client.
pub mod prelude {
    pub use crate::{
        Connection, ConnectionBuilder, ConnectionStatus, QuizlinkError,
        ReconnectPolicy,
    };

    pub use quizlink_protocol::{
        tags, ClientCommand, Credentials, Dispatcher, Frame, HostEvent,
        PlayerEvent, RawMessage, Role,
    };

    pub use quizlink_api::{ApiClient, ApiConfig, ApiError};
    pub use quizlink_fetch::{FetchCache, FetchError, Fetcher};
    pub use quizlink_session::{
        MemoryStorage, PlayerIdentity, SessionStore,
    };
}
