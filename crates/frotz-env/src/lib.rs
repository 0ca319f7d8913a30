//! Runs a Z-machine interpreter (frotz) as a subprocess and exposes it
//! through `grunk_core::agent::GameProcess`: opening text, then one reply per
//! typed command, cleaned of terminal noise.

pub mod config_loader;
pub mod process;

pub use config_loader::{ConfigLoader, FrotzConfig};
pub use process::FrotzProcess;
