//! Wire message vocabulary for the quiz backend.
//!
//! Every structure here travels as a JSON object with a string `type`
//! discriminant. The vocabulary is split by direction and role:
//!
//! - [`ClientCommand`] — client → server, both roles.
//! - [`HostEvent`] — server → client on a host connection.
//! - [`PlayerEvent`] — server → client on a player connection.
//!
//! Two tags (`game_intro`, `round_results`) exist in both inbound
//! vocabularies with role-specific payloads; they are decoded against the
//! vocabulary of the connection's role, never by sniffing fields.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role and credentials
// ---------------------------------------------------------------------------

/// Which side of the game a connection represents.
///
/// The role determines the handshake credential shape and which inbound
/// vocabulary the server will speak to this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The teacher dashboard driving a session.
    Host,
    /// A student client answering questions.
    Player,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Player => write!(f, "player"),
        }
    }
}

/// Handshake credentials, shaped per role.
///
/// Hosts authenticate with an optional bearer token issued by an external
/// identity provider; players carry the id/token pair returned by the
/// join endpoint. The server tolerates a host init without a token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    /// No credential. Valid for a host whose identity session is absent.
    #[default]
    None,
    /// Host bearer token.
    Host { token: Option<String> },
    /// Player identity pair from `POST /sessions/{code}/join`.
    Player {
        player_id: String,
        player_token: String,
    },
}

// ---------------------------------------------------------------------------
// Outbound: ClientCommand
// ---------------------------------------------------------------------------

/// A message the client sends to the server.
///
/// `#[serde(tag = "type")]` produces the flat internally tagged JSON the
/// backend expects: `{"type":"submit_answer","question_id":"q1",...}`.
/// Optional credential fields are skipped when absent so the `init` frame
/// carries exactly the fields the role requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    /// First frame after every transport open. Carries the role and the
    /// role-appropriate credential fields.
    Init {
        role: Role,
        #[serde(skip_serializing_if = "Option::is_none")]
        token: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_token: Option<String>,
    },

    /// A player's answer to the current question.
    SubmitAnswer {
        question_id: String,
        option_index: u32,
    },

    // -- Host control actions --
    StartGame,
    NextQuestion,
    Pause,
    Resume,
    EndSession,

    /// Heartbeat reply to a server `ping`. Sent by the connection layer;
    /// application code never needs to construct one.
    Pong,
}

impl ClientCommand {
    /// Builds the handshake frame for a role/credential pair.
    pub fn init(role: Role, credentials: &Credentials) -> Self {
        match credentials {
            Credentials::None => ClientCommand::Init {
                role,
                token: None,
                player_id: None,
                player_token: None,
            },
            Credentials::Host { token } => ClientCommand::Init {
                role,
                token: token.clone(),
                player_id: None,
                player_token: None,
            },
            Credentials::Player {
                player_id,
                player_token,
            } => ClientCommand::Init {
                role,
                token: None,
                player_id: Some(player_id.clone()),
                player_token: Some(player_token.clone()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Shared payload structs
// ---------------------------------------------------------------------------

/// A player as shown in the host lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub player_id: String,
    pub display_name: String,
    /// Team assignment, absent until the backend assigns one.
    #[serde(default)]
    pub team: Option<String>,
}

/// One team's position on a scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team: String,
    pub score: i64,
    #[serde(default)]
    pub rank: Option<u32>,
}

/// Per-option answer count for the question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTallyEntry {
    pub option_index: u32,
    pub count: u32,
}

// ---------------------------------------------------------------------------
// Inbound: host vocabulary
// ---------------------------------------------------------------------------

/// Server → client messages on a host connection.
///
/// Unknown tags never reach this enum — [`RawMessage`](crate::RawMessage)
/// parsing plus `HostEvent::from_raw` drop them at the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Full lobby state, sent on connect and whenever membership shifts
    /// enough that deltas are not worth it.
    LobbySnapshot {
        players: Vec<LobbyPlayer>,
        #[serde(default)]
        teams: Vec<TeamStanding>,
    },

    PlayerJoined { player: LobbyPlayer },

    PlayerLeft { player_id: String },

    /// Host-side intro: includes the mini-game name and round counters
    /// so the dashboard can narrate the transition.
    GameIntro {
        game_name: String,
        round: u32,
        #[serde(default)]
        total_rounds: Option<u32>,
    },

    /// Broadcast progress for the current question.
    QuestionBroadcastStatus {
        question_id: String,
        index: u32,
        total: u32,
    },

    /// Live per-option counts while a question is open.
    AnswerTally {
        question_id: String,
        tally: Vec<AnswerTallyEntry>,
        answered: u32,
        player_count: u32,
    },

    /// Scoreboard after a round closes. Always carries full standings.
    RoundResults {
        round: u32,
        standings: Vec<TeamStanding>,
    },

    GameComplete { standings: Vec<TeamStanding> },

    SessionEnded {
        #[serde(default)]
        reason: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Inbound: player vocabulary
// ---------------------------------------------------------------------------

/// Server → client messages on a player connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// A question to answer within `time_limit_secs`.
    Question {
        question_id: String,
        text: String,
        options: Vec<String>,
        time_limit_secs: u32,
        #[serde(default)]
        index: Option<u32>,
        #[serde(default)]
        total: Option<u32>,
    },

    /// Verdict for a submitted answer.
    AnswerResult {
        question_id: String,
        correct: bool,
        #[serde(default)]
        correct_option: Option<u32>,
        #[serde(default)]
        points_awarded: Option<i64>,
    },

    /// Player-side intro: just enough to show the transition screen.
    GameIntro { game_name: String, round: u32 },

    /// Scoreboard after a round. `your_score` is the personal figure when
    /// the backend computed one; the standings list is always present.
    RoundResults {
        round: u32,
        #[serde(default)]
        your_score: Option<i64>,
        standings: Vec<TeamStanding>,
    },

    SessionEnded {
        #[serde(default)]
        reason: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Tag constants
// ---------------------------------------------------------------------------

/// The `type` tags of the inbound vocabularies, for use with the
/// [`Dispatcher`](crate::Dispatcher) and the raw-message guards.
pub mod tags {
    // Host vocabulary.
    pub const LOBBY_SNAPSHOT: &str = "lobby_snapshot";
    pub const PLAYER_JOINED: &str = "player_joined";
    pub const PLAYER_LEFT: &str = "player_left";
    pub const QUESTION_BROADCAST_STATUS: &str = "question_broadcast_status";
    pub const ANSWER_TALLY: &str = "answer_tally";
    pub const GAME_COMPLETE: &str = "game_complete";

    // Player vocabulary.
    pub const QUESTION: &str = "question";
    pub const ANSWER_RESULT: &str = "answer_result";

    // Shared tags (payload shape differs by role).
    pub const GAME_INTRO: &str = "game_intro";
    pub const ROUND_RESULTS: &str = "round_results";
    pub const SESSION_ENDED: &str = "session_ended";

    // Heartbeat. Consumed by the connection layer, never dispatched.
    pub const PING: &str = "ping";
}

// =========================================================================
// Tests
// =========================================================================
