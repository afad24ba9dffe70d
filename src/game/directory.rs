//! Player Directory
//!
//! Authoritative table of connected players, keyed by name.
//! Uses BTreeMap so "first available opponent" is stable across runs.

use std::collections::BTreeMap;

use crate::game::player::{Player, PlayerName, PlayerStatus, PlayerSummary};

/// The player table.
///
/// Not synchronized on its own: the lobby serializes access behind one lock.
#[derive(Debug, Default)]
pub struct Directory {
    players: BTreeMap<PlayerName, Player>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record keyed by the player's name.
    pub fn upsert(&mut self, player: Player) {
        self.players.insert(player.name().clone(), player);
    }

    /// Look up a player.
    pub fn find(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    /// Check if a player with this name exists.
    pub fn exists(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    /// First unpaired player whose name differs from `excluding`.
    pub fn find_available_opponent(&self, excluding: &str) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.status() == PlayerStatus::Unpaired && p.name().as_str() != excluding)
    }

    /// Delete a player, returning its last record.
    pub fn remove(&mut self, name: &str) -> Option<Player> {
        self.players.remove(name)
    }

    /// All players, ordered by name.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Roster of all players, ordered by name.
    pub fn summaries(&self) -> Vec<PlayerSummary> {
        self.players.values().map(Player::summary).collect()
    }

    /// Number of players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Check if no players are connected.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired(name: &str, opponent: &str) -> Player {
        let mut player = Player::new(name);
        player.set_opponent(PlayerName::from(opponent));
        player
    }

    #[test]
    fn test_upsert_and_find() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));

        assert!(directory.exists("ann"));
        assert_eq!(directory.find("ann").map(|p| p.name().as_str()), Some("ann"));
        assert!(directory.find("bob").is_none());
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_record() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));
        directory.upsert(paired("ann", "bob"));

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.find("ann").map(Player::status), Some(PlayerStatus::Paired));
    }

    #[test]
    fn test_find_available_excludes_requester() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));

        assert!(directory.find_available_opponent("ann").is_none());

        directory.upsert(Player::new("bob"));
        let found = directory.find_available_opponent("ann").unwrap();
        assert_eq!(found.name().as_str(), "bob");
    }

    #[test]
    fn test_find_available_skips_paired() {
        let mut directory = Directory::new();
        directory.upsert(paired("ann", "bob"));
        directory.upsert(paired("bob", "ann"));
        directory.upsert(Player::new("carl"));

        let found = directory.find_available_opponent("dave").unwrap();
        assert_eq!(found.name().as_str(), "carl");
        assert!(directory.find_available_opponent("carl").is_none());
    }

    #[test]
    fn test_remove() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("ann"));

        let removed = directory.remove("ann");
        assert!(removed.is_some());
        assert!(!directory.exists("ann"));
        assert!(directory.is_empty());
        assert!(directory.remove("ann").is_none());
    }

    #[test]
    fn test_summaries_are_ordered() {
        let mut directory = Directory::new();
        directory.upsert(Player::new("carl"));
        directory.upsert(Player::new("ann"));

        let names: Vec<_> = directory.summaries().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec![PlayerName::from("ann"), PlayerName::from("carl")]);
    }
}
