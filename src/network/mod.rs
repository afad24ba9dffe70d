//! Network Layer
//!
//! WebSocket server, wire protocol and the lobby that serializes access to
//! the player directory. All game rules live in `game/`.

pub mod auth;
pub mod lobby;
pub mod protocol;
pub mod server;

pub use auth::{AuthConfig, TokenClaims, AuthError, resolve_player_name, validate_token};
pub use lobby::{Lobby, NotificationSink, JoinError};
pub use protocol::{
    ClientMessage, ServerMessage, JoinRequest, JoinResult, ServerError, ErrorCode,
};
pub use server::{GameServer, ServerConfig, GameServerError, ChannelSink, Outbox, OUTBOX_CAPACITY};
