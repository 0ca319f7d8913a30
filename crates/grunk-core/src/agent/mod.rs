//! Agent pipeline: verify proposals, check constraints, run the episode.
//!
//! The flow per turn is observe, propose, verify, check, commit, update. The
//! verifier and checker are pure; the episode controller owns the world and
//! the io seams (`ActionProposer`, `GameProcess`).

pub mod constraint;
pub mod episode;
pub mod prompt;
pub mod propose;
pub mod verify;

pub use constraint::{ConstraintChecker, Reason, Verdict, VerdictStatus};
pub use episode::{
    Episode, EpisodeConfig, EpisodeReport, EventSink, NullSink, Outcome, StopFlag, TurnEvent,
};
pub use prompt::{PromptConfig, WorldContext, build_action_prompt};
pub use propose::{ActionProposer, GameProcess, ProposerFailure, extract_command};
pub use verify::{ActionVerifier, VerifiedCommand, VerifyError};
