//! World model: ground-atom store, mutable state, observation interpretation.

pub mod atoms;
pub mod interpret;
pub mod state;

pub use atoms::{Atom, Pred, PredicateStore};
pub use interpret::{Interpretation, ObservationInterpreter, Signal};
pub use state::{PLAYER, WorldSnapshot, WorldState};
