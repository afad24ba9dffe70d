//! # Game of Three Server
//!
//! Two-player "Game of Three" over WebSocket. Players join under a name, get
//! paired with someone who is free, and take turns adding -1, 0 or +1 to a
//! shared number and dividing by three. Whoever reaches 1 wins.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   GAME OF THREE SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/            - Rules (synchronous, no I/O)              │
//! │  ├── player.rs    - Player record and pairing status         │
//! │  ├── directory.rs - Name-keyed player table                  │
//! │  ├── pairing.rs   - Start requests and opponent claiming     │
//! │  ├── moves.rs     - Seed forwarding and move validation      │
//! │  ├── disconnect.rs- Departure and opponent release           │
//! │  ├── events.rs    - Outgoing messages and notifications      │
//! │  └── error.rs     - Request failures                         │
//! │                                                              │
//! │  network/         - Networking                               │
//! │  ├── lobby.rs     - Locked directory + notification sink     │
//! │  ├── server.rs    - WebSocket server                         │
//! │  ├── protocol.rs  - Message types                            │
//! │  └── auth.rs      - Optional JWT identity                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! The engine functions in `game/` take the directory by reference and
//! return the notifications they produce. The [`network::Lobby`] runs each
//! of them under a single lock and hands the notifications to its sink
//! before releasing it, so no opponent is claimed twice and every player
//! sees messages in the order they were produced.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod game;
pub mod network;

// Re-export commonly used types
pub use game::{Directory, GameError, GameInstruction, GameMessage, Player, PlayerName, PlayerStatus};
pub use network::{Lobby, NotificationSink, GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
