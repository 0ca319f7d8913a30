//! Core engine for playing Lost Pig with an LLM under symbolic supervision.
//!
//! The world model tracks ground atoms (`at`, `has`, `connected`, ...)
//! inferred from game text; the agent pipeline verifies and constraint-checks
//! every proposed command before it is committed to the game. Binaries wire
//! these pieces to a real game process and a real model.

pub mod agent;
pub mod eval;
pub mod lexicon;
pub mod llm;
pub mod world;
