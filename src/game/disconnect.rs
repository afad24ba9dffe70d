//! Disconnect Handler
//!
//! Removes a departing player and releases its opponent back to the pool.

use crate::game::directory::Directory;
use crate::game::events::{Dispatch, GameMessage};

/// Remove `name` from the directory.
///
/// Unknown names are ignored. If the player was paired, the opponent is
/// unlinked and told who left. Returns None when no player was removed.
pub fn remove_player(directory: &mut Directory, name: &str) -> Option<Dispatch> {
    let player = directory.remove(name)?;
    let mut dispatch = Dispatch::new();

    let Some(opponent_name) = player.opponent() else {
        return Some(dispatch);
    };

    if let Some(mut opponent) = directory.find(opponent_name.as_str()).cloned() {
        opponent.clear_opponent();
        directory.upsert(opponent);
        dispatch.notify(opponent_name.clone(), GameMessage::disconnect(player.name().clone()));
    }

    Some(dispatch)
}
