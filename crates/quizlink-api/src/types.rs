//! Request and response shapes for the quiz backend's REST surface.
//!
//! These mirror the backend's JSON exactly; fields the backend may omit
//! carry `#[serde(default)]` so a sparse response still decodes.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// One row in the session list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub player_count: Option<u32>,
}

/// Body of `POST /sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    pub question_bank_id: String,
    pub preset: String,
    pub chaos_level: u32,
    pub team_count: u32,
}

/// Creation result. `code` is the join code players type in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCreated {
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Full session snapshot from `GET /sessions/{code}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDetail {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub team_count: Option<u32>,
    #[serde(default)]
    pub player_count: Option<u32>,
}

/// Result of `POST /sessions/{code}/join`: who the player now is, plus
/// the bearer token for the socket handshake. The token belongs in the
/// session store's memory, nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedSession {
    pub player_id: String,
    pub display_name: String,
    pub player_token: String,
    #[serde(default)]
    pub team: Option<String>,
}

/// Result of `POST /sessions/{code}/reconnect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconnectStatus {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// Question banks
// ---------------------------------------------------------------------------

/// One row in the question-bank list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBankSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub question_count: Option<u32>,
}

/// Body of `POST /questions/banks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestionBank {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full bank from `GET /questions/banks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<BankQuestion>,
}

/// One stored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankQuestion {
    #[serde(default)]
    pub id: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: u32,
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
}

/// Body of `POST /questions/banks/{id}/questions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: u32,
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
}
