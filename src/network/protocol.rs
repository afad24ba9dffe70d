//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! All messages are JSON objects tagged by `type`.

use serde::{Serialize, Deserialize};

use crate::game::error::GameError;
use crate::game::events::GameMessage;
use crate::game::moves::GameInstruction;
use crate::game::player::{PlayerName, PlayerSummary};
use crate::network::lobby::JoinError;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Claim a player name. Must be the first message on a connection.
    Join(JoinRequest),

    /// Ask for a game (pair, rematch or wait).
    Start,

    /// Starting value, sent by the primary player.
    Number { value: i32 },

    /// A move.
    Play(GameInstruction),

    /// Ping for latency measurement.
    Ping { timestamp: u64 },

    /// Player is leaving; the connection closes.
    Leave,
}

/// Join request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Requested player name. Ignored when the token carries one.
    #[serde(default)]
    pub username: String,
    /// JWT, required only when the server has authentication configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted.
    Joined(JoinResult),

    /// Game update for this player.
    Update(GameMessage),

    /// Online roster.
    Players { players: Vec<PlayerSummary> },

    /// Request failed.
    Error(ServerError),

    /// Pong response.
    Pong { timestamp: u64, server_time: u64 },

    /// Server is shutting down.
    Shutdown { reason: String },
}

/// Join result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResult {
    /// Name the player was registered under.
    pub username: PlayerName,
    /// Server version.
    pub server_version: String,
}

/// Server error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Create an error frame.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<&GameError> for ServerError {
    fn from(err: &GameError) -> Self {
        let code = match err {
            GameError::PlayerNotFound(_) => ErrorCode::PlayerNotFound,
            GameError::OpponentMissing => ErrorCode::OpponentMissing,
            GameError::InvalidCombination { .. } => ErrorCode::InvalidCombination,
        };
        Self::new(code, err.to_string())
    }
}

impl From<&JoinError> for ServerError {
    fn from(err: &JoinError) -> Self {
        let code = match err {
            JoinError::UsernameRequired => ErrorCode::UsernameRequired,
            JoinError::UsernameTaken(_) => ErrorCode::UsernameTaken,
        };
        Self::new(code, err.to_string())
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Join without a name.
    UsernameRequired,
    /// Name already connected.
    UsernameTaken,
    /// Request before join.
    NotJoined,
    /// Second join on one connection.
    AlreadyJoined,
    /// Token rejected.
    AuthFailed,
    /// Unparseable message.
    InvalidInput,
    /// Requester not in the directory.
    PlayerNotFound,
    /// Seed or move without an opponent.
    OpponentMissing,
    /// Move sum not divisible by three.
    InvalidCombination,
}

impl From<GameMessage> for ServerMessage {
    fn from(message: GameMessage) -> Self {
        match message {
            GameMessage::Players { players } => ServerMessage::Players { players },
            other => ServerMessage::Update(other),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
