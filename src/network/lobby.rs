//! Lobby
//!
//! Owns the player directory and runs each request as one critical section:
//! the engine call and the hand-off of its notifications to the sink happen
//! under the same lock, so every player receives messages in the order the
//! engine produced them.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::game::directory::Directory;
use crate::game::disconnect::remove_player;
use crate::game::error::GameError;
use crate::game::events::{Dispatch, GameMessage, Notification};
use crate::game::moves::{self, GameInstruction};
use crate::game::pairing;
use crate::game::player::{Player, PlayerName, PlayerSummary};

/// Delivery side of the lobby.
///
/// Calls are made while the directory lock is held and must not block.
/// Delivery is fire-and-forget.
pub trait NotificationSink: Send + Sync {
    /// Per-player delivery handle registered on join.
    type Endpoint: Send;

    /// Register the endpoint for a newly joined player.
    fn attach(&self, name: &PlayerName, endpoint: Self::Endpoint);

    /// Forget a departed player's endpoint.
    fn detach(&self, name: &PlayerName);

    /// Deliver one notification.
    fn deliver(&self, notification: Notification);
}

/// Join failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// Empty or whitespace-only name.
    #[error("username is required to establish a connection")]
    UsernameRequired,

    /// Name already connected.
    #[error("Player with username already connected: {0}")]
    UsernameTaken(PlayerName),
}

/// The lobby.
pub struct Lobby<S> {
    /// Player table. One lock for all of it.
    directory: Mutex<Directory>,
    /// Delivery.
    sink: Arc<S>,
}

impl<S: NotificationSink> Lobby<S> {
    /// Create an empty lobby delivering through `sink`.
    pub fn new(sink: Arc<S>) -> Self {
        Self {
            directory: Mutex::new(Directory::new()),
            sink,
        }
    }

    /// The sink notifications go to.
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    /// Register a player under `name`.
    ///
    /// Leading and trailing whitespace is trimmed. The endpoint is attached
    /// before the player becomes visible to pairing.
    #[instrument(skip(self, endpoint))]
    pub async fn join(&self, name: &str, endpoint: S::Endpoint) -> Result<PlayerName, JoinError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(JoinError::UsernameRequired);
        }

        let mut directory = self.directory.lock().await;
        if directory.exists(name) {
            return Err(JoinError::UsernameTaken(name.into()));
        }

        let player = Player::new(name);
        let name = player.name().clone();
        self.sink.attach(&name, endpoint);
        directory.upsert(player);
        self.publish_roster(&directory);

        info!("Player {} joined ({} online)", name, directory.len());
        Ok(name)
    }

    /// Handle a start request.
    ///
    /// The reply is returned and also delivered to the requester ahead of the
    /// opponent's notification, so it precedes anything the opponent sends
    /// in response.
    pub async fn request_start(&self, name: &str) -> Result<GameMessage, GameError> {
        let mut directory = self.directory.lock().await;
        let was_paired = directory.find(name).is_some_and(Player::has_opponent);

        let (reply, dispatch) = pairing::request_start(&mut directory, name)?;
        self.sink.deliver(Notification::to_player(name.into(), reply.clone()));
        self.deliver(dispatch);

        if !was_paired && directory.find(name).is_some_and(Player::has_opponent) {
            info!("Paired {} with {}", name, opponent_label(&directory, name));
            self.publish_roster(&directory);
        } else {
            debug!("Start request from {} answered without pairing", name);
        }

        Ok(reply)
    }

    /// Forward the seed from `name` to its opponent.
    pub async fn submit_seed(&self, name: &str, value: i32) -> Result<(), GameError> {
        let directory = self.directory.lock().await;
        let dispatch = moves::submit_seed(&directory, value, name)?;
        debug!("{} seeded the game with {}", name, value);
        self.deliver(dispatch);
        Ok(())
    }

    /// Apply a move from `name`.
    pub async fn submit_move(&self, name: &str, instruction: GameInstruction) -> Result<(), GameError> {
        let directory = self.directory.lock().await;
        let dispatch = moves::submit_move(&directory, name, instruction)?;
        self.deliver(dispatch);
        Ok(())
    }

    /// Remove `name` and release its opponent. Unknown names are ignored.
    #[instrument(skip(self))]
    pub async fn leave(&self, name: &str) {
        let mut directory = self.directory.lock().await;
        let Some(dispatch) = remove_player(&mut directory, name) else {
            return;
        };

        self.sink.detach(&PlayerName::new(name));
        self.deliver(dispatch);
        self.publish_roster(&directory);

        info!("Player {} left ({} online)", name, directory.len());
    }

    /// Current roster, ordered by name.
    pub async fn online_players(&self) -> Vec<PlayerSummary> {
        self.directory.lock().await.summaries()
    }

    /// Snapshot of one player's record.
    pub async fn player(&self, name: &str) -> Option<Player> {
        self.directory.lock().await.find(name).cloned()
    }

    /// Number of joined players.
    pub async fn player_count(&self) -> usize {
        self.directory.lock().await.len()
    }

    fn deliver(&self, dispatch: Dispatch) {
        for notification in dispatch.notifications {
            self.sink.deliver(notification);
        }
    }

    fn publish_roster(&self, directory: &Directory) {
        self.sink.deliver(Notification::broadcast(GameMessage::Players {
            players: directory.summaries(),
        }));
    }
}

fn opponent_label(directory: &Directory, name: &str) -> String {
    directory
        .find(name)
        .and_then(Player::opponent)
        .map(ToString::to_string)
        .unwrap_or_default()
}
