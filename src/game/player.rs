//! Player Records
//!
//! A connected player and its pairing link.
//! The opponent link is a name key into the [`Directory`](super::directory::Directory),
//! never an owned record.

use std::borrow::Borrow;
use std::fmt;
use serde::{Serialize, Deserialize};

// =============================================================================
// PLAYER NAME
// =============================================================================

/// Unique player name, stable for the lifetime of a connection.
///
/// Implements Ord so the directory iterates in a stable order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Create from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PlayerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PlayerName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// =============================================================================
// PLAYER STATUS
// =============================================================================

/// Pairing status of a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    /// Free to be paired.
    Unpaired,
    /// Linked to an opponent.
    Paired,
}

// =============================================================================
// PLAYER
// =============================================================================

/// A player known to the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    name: PlayerName,
    /// Tie-break marker assigned when a pairing is made.
    pub primary: bool,
    opponent: Option<PlayerName>,
}

impl Player {
    /// Create an unpaired player.
    pub fn new(name: impl Into<PlayerName>) -> Self {
        Self {
            name: name.into(),
            primary: false,
            opponent: None,
        }
    }

    /// Player name.
    pub fn name(&self) -> &PlayerName {
        &self.name
    }

    /// Current opponent, if paired.
    pub fn opponent(&self) -> Option<&PlayerName> {
        self.opponent.as_ref()
    }

    /// Check if this player has an opponent.
    pub fn has_opponent(&self) -> bool {
        self.opponent.is_some()
    }

    /// Pairing status, derived from the opponent link.
    pub fn status(&self) -> PlayerStatus {
        if self.opponent.is_some() {
            PlayerStatus::Paired
        } else {
            PlayerStatus::Unpaired
        }
    }

    /// Point this record at `opponent`.
    ///
    /// Only one side of the link. The pairing engine sets both sides in the
    /// same critical section. Linking a player to itself is ignored.
    pub(crate) fn set_opponent(&mut self, opponent: PlayerName) {
        if opponent != self.name {
            self.opponent = Some(opponent);
        }
    }

    /// Drop the opponent link, returning the player to the unpaired pool.
    pub(crate) fn clear_opponent(&mut self) -> Option<PlayerName> {
        self.opponent.take()
    }

    /// Roster entry for this player.
    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            name: self.name.clone(),
            status: self.status(),
        }
    }
}

/// Roster entry broadcast to connected players.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    /// Player name.
    pub name: PlayerName,
    /// Pairing status.
    pub status: PlayerStatus,
}
