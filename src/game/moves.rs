//! Move Engine
//!
//! Forwards the seed and applies moves. The session value is never stored:
//! every move carries the value the mover last saw plus its addend, and the
//! quotient is forwarded to the opponent.

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::directory::Directory;
use crate::game::error::GameError;
use crate::game::events::{Dispatch, GameMessage};
use crate::game::player::{Player, PlayerName};

/// Every accepted move divides by this.
pub const DIVISOR: i64 = 3;

/// A player's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInstruction {
    /// Last value the mover observed.
    pub value: i32,
    /// Amount the mover adds. Clients send -1, 0 or 1, but any integer is applied.
    #[serde(rename = "move")]
    pub addend: i32,
}

impl GameInstruction {
    /// Create an instruction.
    pub const fn new(value: i32, addend: i32) -> Self {
        Self { value, addend }
    }

    /// Value plus addend, widened so no pair of inputs overflows.
    pub fn sum(&self) -> i64 {
        i64::from(self.value) + i64::from(self.addend)
    }
}

/// Forward the starting value to the opponent of `name`.
pub fn submit_seed(directory: &Directory, value: i32, name: &str) -> Result<Dispatch, GameError> {
    let (_, opponent) = find_paired(directory, name)?;
    let mut dispatch = Dispatch::new();
    dispatch.notify(opponent.clone(), GameMessage::play(value));
    Ok(dispatch)
}

/// Apply a move by `name`.
///
/// Divisibility is checked before the player lookup, so an invalid
/// combination is reported even for an unknown or unpaired player.
pub fn submit_move(
    directory: &Directory,
    name: &str,
    instruction: GameInstruction,
) -> Result<Dispatch, GameError> {
    let sum = instruction.sum();
    if sum % DIVISOR != 0 {
        return Err(GameError::InvalidCombination { sum, divisor: DIVISOR });
    }

    let (player, opponent) = find_paired(directory, name)?;

    // |sum| <= 2^32, so the quotient fits in an i32.
    let result = (sum / DIVISOR) as i32;

    debug!(
        "{} got value: {} and added {} to get {}. Result after division by {}: {}",
        name, instruction.value, instruction.addend, sum, DIVISOR, result
    );

    let mut dispatch = Dispatch::new();
    if result != 1 {
        dispatch.notify(opponent.clone(), GameMessage::play(result));
    } else {
        dispatch.notify(player.name().clone(), GameMessage::game_over(true));
        dispatch.notify(opponent.clone(), GameMessage::game_over(false));
    }

    Ok(dispatch)
}

/// Look up `name` and its opponent.
fn find_paired<'a>(directory: &'a Directory, name: &str) -> Result<(&'a Player, &'a PlayerName), GameError> {
    let player = directory
        .find(name)
        .ok_or_else(|| GameError::PlayerNotFound(name.into()))?;
    let opponent = player.opponent().ok_or(GameError::OpponentMissing)?;
    Ok((player, opponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pairing::request_start;
    use proptest::prelude::*;

    /// Ann waits, Bob joins: Ann is primary, Bob is not.
    fn ann_and_bob() -> Directory {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));
        directory.upsert(Player::new("bob"));
        request_start(&mut directory, "bob").unwrap();
        directory
    }

    #[test]
    fn test_seed_forwarded_to_opponent() {
        let directory = ann_and_bob();
        let dispatch = submit_seed(&directory, 56, "ann").unwrap();

        let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
        assert_eq!(for_bob, vec![&GameMessage::play(56)]);
        assert_eq!(dispatch.messages_for("ann").count(), 0);
    }

    #[test]
    fn test_seed_requires_known_player() {
        let directory = ann_and_bob();
        assert_eq!(
            submit_seed(&directory, 56, "carl"),
            Err(GameError::PlayerNotFound(PlayerName::from("carl")))
        );
    }

    #[test]
    fn test_seed_requires_opponent() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));
        assert_eq!(submit_seed(&directory, 56, "ann"), Err(GameError::OpponentMissing));
    }

    #[test]
    fn test_move_forwards_quotient() {
        let directory = ann_and_bob();
        let dispatch = submit_move(&directory, "ann", GameInstruction::new(12, 0)).unwrap();

        let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
        assert_eq!(for_bob, vec![&GameMessage::play(4)]);
        assert_eq!(dispatch.messages_for("ann").count(), 0);
    }

    #[test]
    fn test_move_to_one_ends_game() {
        let directory = ann_and_bob();
        let dispatch = submit_move(&directory, "bob", GameInstruction::new(4, -1)).unwrap();

        assert_eq!(dispatch.notifications.len(), 2);
        let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
        let for_ann: Vec<_> = dispatch.messages_for("ann").collect();
        assert_eq!(for_bob, vec![&GameMessage::game_over(true)]);
        assert_eq!(for_ann, vec![&GameMessage::game_over(false)]);

        // Pairing survives the end of the game.
        assert_eq!(directory.find("bob").and_then(Player::opponent), Some(&PlayerName::from("ann")));
    }

    #[test]
    fn test_move_unknown_player() {
        let directory = ann_and_bob();
        assert_eq!(
            submit_move(&directory, "carl", GameInstruction::new(1, 2)),
            Err(GameError::PlayerNotFound(PlayerName::from("carl")))
        );
        assert_eq!(
            submit_move(&directory, "carl", GameInstruction::new(1, 1)),
            Err(GameError::InvalidCombination { sum: 2, divisor: 3 })
        );
    }

    #[test]
    fn test_move_invalid_combination() {
        let directory = ann_and_bob();
        let result = submit_move(&directory, "ann", GameInstruction::new(20, -1));
        assert_eq!(result, Err(GameError::InvalidCombination { sum: 19, divisor: 3 }));
        assert_eq!(result.unwrap_err().to_string(), "19 is not divisible by 3");
    }

    #[test]
    fn test_move_checks_divisibility_before_lookup() {
        let directory = Directory::new();
        let result = submit_move(&directory, "ghost", GameInstruction::new(7, 0));
        assert!(matches!(result, Err(GameError::InvalidCombination { .. })));
    }

    #[test]
    fn test_move_without_opponent() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));
        assert_eq!(
            submit_move(&directory, "ann", GameInstruction::new(9, 0)),
            Err(GameError::OpponentMissing)
        );
    }

    #[test]
    fn test_large_addend_applied() {
        let directory = ann_and_bob();
        let dispatch = submit_move(&directory, "ann", GameInstruction::new(10, 20)).unwrap();
        let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
        assert_eq!(for_bob, vec![&GameMessage::play(10)]);
    }

    #[test]
    fn test_extreme_values_do_not_overflow() {
        let directory = ann_and_bob();
        let dispatch = submit_move(&directory, "ann", GameInstruction::new(i32::MAX, i32::MAX - 2)).unwrap();
        let expected = ((i64::from(i32::MAX) * 2 - 2) / 3) as i32;
        let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
        assert_eq!(for_bob, vec![&GameMessage::play(expected)]);
    }

    #[test]
    fn test_instruction_json_uses_move_field() {
        let instruction: GameInstruction = serde_json::from_str(r#"{"value":4,"move":-1}"#).unwrap();
        assert_eq!(instruction, GameInstruction::new(4, -1));
    }

    proptest! {
        #[test]
        fn prop_invalid_iff_not_divisible(value in any::<i32>(), addend in any::<i32>(), paired in any::<bool>()) {
            let directory = if paired {
                ann_and_bob()
            } else {
                let mut d = Directory::new();
                d.upsert(Player::new("ann"));
                d
            };
            let sum = i64::from(value) + i64::from(addend);
            let result = submit_move(&directory, "ann", GameInstruction::new(value, addend));
            let invalid = matches!(result, Err(GameError::InvalidCombination { .. }));
            prop_assert_eq!(invalid, sum % 3 != 0);
        }

        #[test]
        fn prop_exactly_one_recipient_per_outcome(k in -1000i32..1000, addend in -1i32..=1) {
            let directory = ann_and_bob();
            let value = k * 3 - addend;
            let dispatch = submit_move(&directory, "ann", GameInstruction::new(value, addend)).unwrap();
            if k == 1 {
                let winners: Vec<_> = dispatch.notifications.iter()
                    .filter(|n| n.message == GameMessage::game_over(true))
                    .collect();
                let losers: Vec<_> = dispatch.notifications.iter()
                    .filter(|n| n.message == GameMessage::game_over(false))
                    .collect();
                prop_assert_eq!(winners.len(), 1);
                prop_assert_eq!(losers.len(), 1);
            } else {
                prop_assert_eq!(dispatch.notifications.len(), 1);
                let for_bob: Vec<_> = dispatch.messages_for("bob").collect();
                let expected = GameMessage::play(k);
                prop_assert_eq!(for_bob, vec![&expected]);
            }
        }
    }
}
