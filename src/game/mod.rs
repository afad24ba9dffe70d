//! Game Logic Module
//!
//! Pairing and move rules. Pure: no I/O, no locking.
//! Every operation takes the directory explicitly and returns a [`Dispatch`]
//! describing what each player must be told.
//!
//! ## Module Structure
//!
//! - `player`: Player records and pairing status
//! - `directory`: Player table
//! - `events`: Messages, notifications, dispatches
//! - `pairing`: Start requests (rematch, pair, wait)
//! - `moves`: Seed forwarding and move application
//! - `disconnect`: Player removal
//! - `error`: Request failures

pub mod player;
pub mod directory;
pub mod events;
pub mod pairing;
pub mod moves;
pub mod disconnect;
pub mod error;

// Re-export key types
pub use player::{Player, PlayerName, PlayerStatus, PlayerSummary};
pub use directory::Directory;
pub use events::{Dispatch, GameMessage, Notification, Recipient};
pub use moves::{GameInstruction, DIVISOR};
pub use error::GameError;
