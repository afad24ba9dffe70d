//! Engine errors.
//!
//! Every variant is a caller input problem: reported once to the requester,
//! never retried, and never leaves the directory modified.

use thiserror::Error;

use crate::game::player::PlayerName;

/// Failure of a start, seed or move request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The requesting identity is not in the directory.
    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerName),

    /// Seed or move from a player with no opponent.
    #[error("You have not been paired with an opponent")]
    OpponentMissing,

    /// Value plus addend is not a multiple of the divisor.
    #[error("{sum} is not divisible by {divisor}")]
    InvalidCombination {
        sum: i64,
        divisor: i64,
    },
}
