//! Pairing Engine
//!
//! Handles a start request: rematch with the current opponent, claim an
//! available player, or report waiting.
//!
//! The player who was already waiting becomes primary; the requester does not.
//! Clients use the flag to decide which side sends the seed.

use crate::game::directory::Directory;
use crate::game::error::GameError;
use crate::game::events::{Dispatch, GameMessage};
use crate::game::player::Player;

/// Handle a start request from `name`.
///
/// Returns the reply for the requester and the notifications for everyone
/// else. The caller must hold exclusive access to the directory for the whole
/// call: the opponent lookup and the link are one unit.
pub fn request_start(directory: &mut Directory, name: &str) -> Result<(GameMessage, Dispatch), GameError> {
    let player = directory
        .find(name)
        .cloned()
        .ok_or_else(|| GameError::PlayerNotFound(name.into()))?;

    if let Some(opponent_name) = player.opponent() {
        let opponent = directory
            .find(opponent_name.as_str())
            .ok_or_else(|| GameError::PlayerNotFound(opponent_name.clone()))?;
        return Ok(announce(&player, opponent));
    }

    let Some(available) = directory.find_available_opponent(name).cloned() else {
        return Ok((GameMessage::waiting(), Dispatch::new()));
    };

    let (waiting, requester) = link(available, player);
    let outcome = announce(&requester, &waiting);

    directory.upsert(waiting);
    directory.upsert(requester);

    Ok(outcome)
}

/// Start messages for a linked pair: the reply for `player`, a notification
/// for `opponent`.
fn announce(player: &Player, opponent: &Player) -> (GameMessage, Dispatch) {
    let mut dispatch = Dispatch::new();
    dispatch.notify(
        opponent.name().clone(),
        GameMessage::start(player.name().clone(), opponent.primary),
    );
    let reply = GameMessage::start(opponent.name().clone(), player.primary);
    (reply, dispatch)
}

/// Link two unpaired players, making `waiting` primary.
fn link(mut waiting: Player, mut requester: Player) -> (Player, Player) {
    waiting.primary = true;
    requester.primary = false;

    waiting.set_opponent(requester.name().clone());
    requester.set_opponent(waiting.name().clone());

    (waiting, requester)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::{PlayerName, PlayerStatus};
    use proptest::prelude::*;

    fn directory_with(names: &[&str]) -> Directory {
        let mut directory = Directory::new();
        for name in names {
            directory.upsert(Player::new(*name));
        }
        directory
    }

    fn opponent_of<'a>(directory: &'a Directory, name: &str) -> Option<&'a str> {
        directory.find(name)?.opponent().map(PlayerName::as_str)
    }

    #[test]
    fn test_unknown_player() {
        let mut directory = Directory::new();
        let result = request_start(&mut directory, "ghost");
        assert_eq!(result, Err(GameError::PlayerNotFound(PlayerName::from("ghost"))));
    }

    #[test]
    fn test_alone_waits() {
        let mut directory = directory_with(&["ann"]);

        let (reply, dispatch) = request_start(&mut directory, "ann").unwrap();

        assert_eq!(reply, GameMessage::waiting());
        assert!(dispatch.is_empty());
        assert_eq!(directory.find("ann").map(Player::status), Some(PlayerStatus::Unpaired));
    }

    #[test]
    fn test_second_player_pairs_with_waiting() {
        let mut directory = directory_with(&["ann"]);
        request_start(&mut directory, "ann").unwrap();
        directory.upsert(Player::new("bob"));

        let (reply, dispatch) = request_start(&mut directory, "bob").unwrap();

        let ann = directory.find("ann").unwrap();
        let bob = directory.find("bob").unwrap();
        assert!(ann.primary);
        assert!(!bob.primary);
        assert_eq!(ann.status(), PlayerStatus::Paired);
        assert_eq!(bob.status(), PlayerStatus::Paired);
        assert_eq!(opponent_of(&directory, "ann"), Some("bob"));
        assert_eq!(opponent_of(&directory, "bob"), Some("ann"));

        // Bob's reply shows Ann as opponent, non-primary.
        assert_eq!(reply, GameMessage::start(PlayerName::from("ann"), false));

        // Ann is told about Bob, as primary.
        let for_ann: Vec<_> = dispatch.messages_for("ann").collect();
        assert_eq!(for_ann, vec![&GameMessage::start(PlayerName::from("bob"), true)]);
        assert_eq!(dispatch.notifications.len(), 1);
    }

    #[test]
    fn test_rematch_reuses_opponent() {
        let mut directory = directory_with(&["ann", "bob"]);
        request_start(&mut directory, "bob").unwrap();
        directory.upsert(Player::new("carl"));

        let (reply, dispatch) = request_start(&mut directory, "ann").unwrap();

        // Still paired with Bob; Carl untouched.
        assert_eq!(opponent_of(&directory, "ann"), Some("bob"));
        assert_eq!(opponent_of(&directory, "bob"), Some("ann"));
        assert_eq!(directory.find("carl").map(Player::status), Some(PlayerStatus::Unpaired));

        // Flags are reported, not reassigned.
        assert_eq!(reply, GameMessage::start(PlayerName::from("bob"), true));
        let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
        assert_eq!(for_bob, vec![&GameMessage::start(PlayerName::from("ann"), false)]);
    }

    #[test]
    fn test_paired_players_are_not_claimed() {
        let mut directory = directory_with(&["ann", "bob"]);
        request_start(&mut directory, "bob").unwrap();
        directory.upsert(Player::new("carl"));

        let (reply, dispatch) = request_start(&mut directory, "carl").unwrap();
        assert_eq!(reply, GameMessage::waiting());
        assert!(dispatch.is_empty());
    }

    proptest! {
        #[test]
        fn prop_pairing_is_symmetric(count in 1usize..12, order in proptest::collection::vec(0usize..12, 1..40)) {
            let names: Vec<String> = (0..count).map(|i| format!("player{:02}", i)).collect();
            let mut directory = Directory::new();
            for name in &names {
                directory.upsert(Player::new(name.as_str()));
            }

            for idx in order {
                let name = &names[idx % count];
                let before = directory.summaries();
                let was_paired = directory.find(name).map(Player::has_opponent).unwrap_or(false);
                let (reply, dispatch) = request_start(&mut directory, name).unwrap();

                if reply == GameMessage::waiting() {
                    prop_assert!(!was_paired);
                    prop_assert_eq!(before, directory.summaries());
                    prop_assert!(dispatch.is_empty());
                }

                for player in directory.players() {
                    if let Some(opponent) = player.opponent() {
                        prop_assert_ne!(opponent, player.name());
                        let other = directory.find(opponent.as_str()).unwrap();
                        prop_assert_eq!(other.opponent(), Some(player.name()));
                        prop_assert_ne!(other.primary, player.primary);
                    }
                }
            }
        }
    }
}
