//! Owned world state and its immutable snapshots.
//!
//! `WorldState` is the single mutable handle; only the observation
//! interpreter and the episode loop touch it. Constraint evaluation and
//! prompt building work from `WorldSnapshot`, a structural copy that later
//! mutation cannot affect.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::lexicon;
use crate::world::atoms::{Atom, Pred, PredicateStore};

pub const PLAYER: &str = "player";

#[derive(Debug, Clone)]
pub struct WorldState {
    store: PredicateStore,
    visited_ever: BTreeSet<String>,
    held_ever: BTreeSet<String>,
    torch_lit: bool,
    turn: u64,
}

impl WorldState {
    /// Seeds the store with the starting location, the known map, and `lit`
    /// atoms for every non-dark seeded location.
    pub fn new(start_location: &str) -> Self {
        let mut world = Self {
            store: PredicateStore::new(),
            visited_ever: BTreeSet::new(),
            held_ever: BTreeSet::new(),
            // The Lost Pig torch starts lit.
            torch_lit: true,
            turn: 0,
        };
        world.store.add(Atom::alive(PLAYER));
        world.set_player_location(start_location);
        for (from, dir, to) in lexicon::SEED_CONNECTIONS {
            world.link(from, dir, to);
        }
        for (name, _) in lexicon::LOCATIONS {
            if !lexicon::is_dark(name) {
                world.store.add(Atom::lit(name));
            }
        }
        world
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    pub fn advance_turn(&mut self) {
        self.turn += 1;
    }

    pub fn version(&self) -> u64 {
        self.store.version()
    }

    pub fn player_location(&self) -> Option<String> {
        self.store
            .holds(Pred::At, &[Some(PLAYER)])
            .into_iter()
            .next()
            .and_then(|atom| atom.args.into_iter().nth(1))
    }

    /// Moves the player, preserving the single-`at` invariant and the
    /// visited bookkeeping. Unknown locations become new graph nodes.
    pub fn set_player_location(&mut self, location: &str) {
        for old in self.store.holds(Pred::At, &[Some(PLAYER)]) {
            self.store.remove(&old);
        }
        self.store.add(Atom::at(PLAYER, location));
        self.store.add(Atom::visited(location));
        self.visited_ever.insert(location.to_string());
    }

    /// Records a discovered exit in both directions. Exits are treated as
    /// bidirectional until an observation contradicts them.
    pub fn link(&mut self, from: &str, direction: &str, to: &str) {
        self.store.add(Atom::connected(from, direction, to));
        if let Some(back) = lexicon::opposite(direction) {
            self.store.add(Atom::connected(to, back, from));
        }
    }

    /// Drops an edge (and its known inverse) when an observation contradicts
    /// an assumed connection.
    pub fn unlink(&mut self, from: &str, direction: &str, to: &str) {
        self.store.remove(&Atom::connected(from, direction, to));
        if let Some(back) = lexicon::opposite(direction) {
            self.store.remove(&Atom::connected(to, back, from));
        }
    }

    /// Confirmed pickup. This is the only path that grows the inventory.
    pub fn add_item(&mut self, item: &str) {
        self.store.add(Atom::has(PLAYER, item));
        self.held_ever.insert(item.to_string());
    }

    pub fn remove_item(&mut self, item: &str) {
        self.store.remove(&Atom::has(PLAYER, item));
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.store.contains(&Atom::has(PLAYER, item))
    }

    pub fn set_entity_location(&mut self, entity: &str, location: &str) {
        for old in self.store.holds(Pred::At, &[Some(entity)]) {
            self.store.remove(&old);
        }
        self.store.add(Atom::at(entity, location));
    }

    pub fn set_alive(&mut self, entity: &str, alive: bool) {
        if alive {
            self.store.add(Atom::alive(entity));
        } else {
            self.store.remove(&Atom::alive(entity));
        }
    }

    pub fn set_torch_lit(&mut self, lit: bool) {
        self.torch_lit = lit;
    }

    /// True when the player carries a working light source.
    pub fn light_carried(&self) -> bool {
        (self.torch_lit && self.has_item("torch")) || self.has_item("orb")
    }

    /// Marks a command as attempted at a location (anti-repetition bookkeeping).
    pub fn note_tried(&mut self, location: &str, command: &str) {
        self.store.add(Atom::tried(location, command));
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        let inventory = self
            .store
            .holds(Pred::Has, &[Some(PLAYER)])
            .into_iter()
            .filter_map(|atom| atom.args.into_iter().nth(1))
            .collect();
        WorldSnapshot {
            version: self.store.version(),
            turn: self.turn,
            player_location: self.player_location(),
            inventory,
            visited: self.visited_ever.clone(),
            held_ever: self.held_ever.clone(),
            light_carried: self.light_carried(),
            atoms: self.store.atoms(),
        }
    }
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new(lexicon::START_LOCATION)
    }
}

/// Immutable copy of the world at a point in time. Constraint evaluation and
/// prompts read this; nothing writes it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub version: u64,
    pub turn: u64,
    pub player_location: Option<String>,
    pub inventory: BTreeSet<String>,
    pub visited: BTreeSet<String>,
    pub held_ever: BTreeSet<String>,
    pub light_carried: bool,
    pub atoms: BTreeSet<Atom>,
}

impl WorldSnapshot {
    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.contains(item)
    }

    pub fn is_lit(&self, location: &str) -> bool {
        self.atoms.contains(&Atom::lit(location))
    }

    pub fn is_tried(&self, location: &str, command: &str) -> bool {
        self.atoms.contains(&Atom::tried(location, command))
    }

    /// Destination of an exit from `location` in `direction`, if known.
    pub fn destination(&self, location: &str, direction: &str) -> Option<&str> {
        self.atoms
            .iter()
            .find(|atom| {
                atom.pred == Pred::Connected
                    && atom.args.first().map(String::as_str) == Some(location)
                    && atom.args.get(1).map(String::as_str) == Some(direction)
            })
            .and_then(|atom| atom.args.get(2))
            .map(String::as_str)
    }

    /// Known exits from `location` as (direction, destination) pairs.
    pub fn exits(&self, location: &str) -> Vec<(String, String)> {
        self.atoms
            .iter()
            .filter(|atom| {
                atom.pred == Pred::Connected
                    && atom.args.first().map(String::as_str) == Some(location)
            })
            .filter_map(|atom| {
                let dir = atom.args.get(1)?.clone();
                let dest = atom.args.get(2)?.clone();
                Some((dir, dest))
            })
            .collect()
    }

    /// Commands already attempted at `location`.
    pub fn tried_here(&self, location: &str) -> BTreeSet<String> {
        self.atoms
            .iter()
            .filter(|atom| {
                atom.pred == Pred::Tried
                    && atom.args.first().map(String::as_str) == Some(location)
            })
            .filter_map(|atom| atom.args.get(1).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_occupies_exactly_one_location() {
        let mut world = WorldState::new("outside");
        world.set_player_location("forest");
        world.set_player_location("hole");

        let snap = world.snapshot();
        let at_player: Vec<_> = snap
            .atoms
            .iter()
            .filter(|a| a.pred == Pred::At && a.args[0] == PLAYER)
            .collect();
        assert_eq!(at_player.len(), 1);
        assert_eq!(snap.player_location.as_deref(), Some("hole"));
        assert!(snap.visited.contains("forest"));
        assert!(snap.visited.contains("outside"));
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let mut world = WorldState::new("outside");
        world.add_item("torch");
        let snap = world.snapshot();

        world.remove_item("torch");
        world.set_player_location("forest");

        assert!(snap.has_item("torch"));
        assert_eq!(snap.player_location.as_deref(), Some("outside"));
        assert_ne!(snap.version, world.version());
    }

    #[test]
    fn link_inserts_both_directions() {
        let mut world = WorldState::new("outside");
        world.link("outside", "east", "stump_hollow");
        let snap = world.snapshot();
        assert_eq!(snap.destination("outside", "east"), Some("stump_hollow"));
        assert_eq!(snap.destination("stump_hollow", "west"), Some("outside"));
    }

    #[test]
    fn held_ever_is_a_superset_of_inventory() {
        let mut world = WorldState::new("outside");
        world.add_item("torch");
        world.add_item("coin");
        world.remove_item("coin");
        let snap = world.snapshot();
        assert!(snap.has_item("torch"));
        assert!(!snap.has_item("coin"));
        assert!(snap.held_ever.contains("coin"));
    }

    #[test]
    fn light_carried_requires_a_lit_source_in_inventory() {
        let mut world = WorldState::new("outside");
        assert!(!world.light_carried(), "torch lit but not held");
        world.add_item("torch");
        assert!(world.light_carried());
        world.set_torch_lit(false);
        assert!(!world.light_carried());
        world.add_item("orb");
        assert!(world.light_carried(), "orb never goes out");
    }
}
