//! Ground atoms and the predicate store.
//!
//! An atom is a fully-instantiated predicate application over interned
//! strings, e.g. `at(player, outside)`. The store is the only mutable home of
//! the world model; everything else sees snapshots.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The fixed predicate vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pred {
    At,
    Has,
    Alive,
    Connected,
    Lit,
    Visited,
    Tried,
}

impl Pred {
    pub fn name(self) -> &'static str {
        match self {
            Pred::At => "at",
            Pred::Has => "has",
            Pred::Alive => "alive",
            Pred::Connected => "connected",
            Pred::Lit => "lit",
            Pred::Visited => "visited",
            Pred::Tried => "tried",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    pub pred: Pred,
    pub args: Vec<String>,
}

impl Atom {
    pub fn new(pred: Pred, args: &[&str]) -> Self {
        Self {
            pred,
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn at(entity: &str, location: &str) -> Self {
        Self::new(Pred::At, &[entity, location])
    }

    pub fn has(entity: &str, item: &str) -> Self {
        Self::new(Pred::Has, &[entity, item])
    }

    pub fn alive(entity: &str) -> Self {
        Self::new(Pred::Alive, &[entity])
    }

    pub fn connected(from: &str, direction: &str, to: &str) -> Self {
        Self::new(Pred::Connected, &[from, direction, to])
    }

    pub fn lit(location: &str) -> Self {
        Self::new(Pred::Lit, &[location])
    }

    pub fn visited(location: &str) -> Self {
        Self::new(Pred::Visited, &[location])
    }

    pub fn tried(location: &str, command: &str) -> Self {
        Self::new(Pred::Tried, &[location, command])
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.pred.name(), self.args.join(", "))
    }
}

/// Set of currently-true ground atoms, with a version bumped on every
/// mutation so stale snapshots are identifiable in event logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredicateStore {
    atoms: BTreeSet<Atom>,
    version: u64,
}

impl PredicateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.contains(atom)
    }

    /// Inserts an atom. Returns true if the store changed.
    pub fn add(&mut self, atom: Atom) -> bool {
        let inserted = self.atoms.insert(atom);
        if inserted {
            self.version += 1;
        }
        inserted
    }

    /// Removes an atom. Returns true if the store changed.
    pub fn remove(&mut self, atom: &Atom) -> bool {
        let removed = self.atoms.remove(atom);
        if removed {
            self.version += 1;
        }
        removed
    }

    /// Matching atoms for a predicate and an argument pattern. `None` entries
    /// are wildcards; a pattern shorter than the atom's arity leaves the
    /// remaining arguments unconstrained.
    pub fn holds(&self, pred: Pred, pattern: &[Option<&str>]) -> Vec<Atom> {
        self.atoms
            .iter()
            .filter(|atom| atom.pred == pred)
            .filter(|atom| {
                pattern.iter().enumerate().all(|(i, want)| match want {
                    Some(value) => atom.args.get(i).map(String::as_str) == Some(value),
                    None => true,
                })
            })
            .cloned()
            .collect()
    }

    /// Structural copy of the current atom set.
    pub fn atoms(&self) -> BTreeSet<Atom> {
        self.atoms.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_and_contains() {
        let mut store = PredicateStore::new();
        let atom = Atom::at("player", "outside");
        assert!(store.add(atom.clone()));
        assert!(!store.add(atom.clone()), "duplicate insert is a no-op");
        assert!(store.contains(&atom));
        assert!(store.remove(&atom));
        assert!(!store.remove(&atom));
        assert!(store.is_empty());
    }

    #[test]
    fn version_only_changes_on_real_mutation() {
        let mut store = PredicateStore::new();
        store.add(Atom::alive("pig"));
        let v = store.version();
        store.add(Atom::alive("pig"));
        assert_eq!(store.version(), v);
        store.remove(&Atom::alive("pig"));
        assert_eq!(store.version(), v + 1);
    }

    #[test]
    fn holds_matches_wildcards() {
        let mut store = PredicateStore::new();
        store.add(Atom::connected("forest", "north", "clearing"));
        store.add(Atom::connected("forest", "east", "hole"));
        store.add(Atom::connected("hole", "west", "forest"));

        let from_forest = store.holds(Pred::Connected, &[Some("forest")]);
        assert_eq!(from_forest.len(), 2);

        let north_exit = store.holds(Pred::Connected, &[Some("forest"), Some("north")]);
        assert_eq!(north_exit.len(), 1);
        assert_eq!(north_exit[0].args[2], "clearing");

        assert!(store.holds(Pred::Connected, &[Some("clearing")]).is_empty());
    }

    #[test]
    fn atom_display_reads_like_a_predicate() {
        assert_eq!(Atom::at("player", "forest").to_string(), "at(player, forest)");
        assert_eq!(Atom::alive("pig").to_string(), "alive(pig)");
    }
}
