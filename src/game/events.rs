//! Game Messages and Notifications
//!
//! Payloads the engine produces for players, and the recipient-addressed
//! notifications that carry them. The engine never delivers anything itself;
//! it returns a [`Dispatch`] for the caller to hand to a sink.

use serde::{Serialize, Deserialize};

use crate::game::player::{PlayerName, PlayerSummary};

/// Text sent with a waiting reply.
pub const WAITING_CONTENT: &str = "Waiting for available player";

/// Message delivered to a player about its game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameMessage {
    /// No opponent available yet.
    Waiting {
        primary: bool,
        content: String,
    },

    /// A pairing exists, seen from the recipient's side.
    Start {
        opponent: PlayerName,
        primary: bool,
        content: String,
    },

    /// Opponent played; the recipient moves next with this value.
    Play {
        value: i32,
    },

    /// The shared value reached 1.
    GameOver {
        winner: bool,
    },

    /// The recipient's opponent left.
    Disconnect {
        disconnected: PlayerName,
        content: String,
    },

    /// Online roster.
    Players {
        players: Vec<PlayerSummary>,
    },
}

impl GameMessage {
    /// Reply for a requester with no one to play against.
    pub fn waiting() -> Self {
        GameMessage::Waiting {
            primary: true,
            content: WAITING_CONTENT.to_string(),
        }
    }

    /// Session start as seen by a player whose opponent is `opponent`.
    pub fn start(opponent: PlayerName, primary: bool) -> Self {
        let content = format!("{} requested a game session", opponent);
        GameMessage::Start { opponent, primary, content }
    }

    /// Value handed to the next mover.
    pub fn play(value: i32) -> Self {
        GameMessage::Play { value }
    }

    /// Final result for one side.
    pub fn game_over(winner: bool) -> Self {
        GameMessage::GameOver { winner }
    }

    /// Departure notice naming the player who left.
    pub fn disconnect(disconnected: PlayerName) -> Self {
        let content = format!("{} disconnected from game", disconnected);
        GameMessage::Disconnect { disconnected, content }
    }
}

/// Who a notification is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Exactly one named player.
    Player(PlayerName),
    /// Every connected player.
    All,
}

/// A message addressed to a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Target.
    pub recipient: Recipient,
    /// Payload.
    pub message: GameMessage,
}

impl Notification {
    /// Address a message to one player.
    pub fn to_player(name: PlayerName, message: GameMessage) -> Self {
        Self {
            recipient: Recipient::Player(name),
            message,
        }
    }

    /// Address a message to everyone.
    pub fn broadcast(message: GameMessage) -> Self {
        Self {
            recipient: Recipient::All,
            message,
        }
    }
}

/// Notifications produced by one engine operation, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dispatch {
    /// Queued notifications.
    pub notifications: Vec<Notification>,
}

impl Dispatch {
    /// Empty dispatch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Queue a message for one player.
    pub fn notify(&mut self, name: PlayerName, message: GameMessage) {
        self.notifications.push(Notification::to_player(name, message));
    }

    /// Messages addressed to `name`, in order.
    pub fn messages_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a GameMessage> + 'a {
        self.notifications.iter().filter_map(move |n| match &n.recipient {
            Recipient::Player(p) if p.as_str() == name => Some(&n.message),
            _ => None,
        })
    }
}
