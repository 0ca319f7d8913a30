//! Seams between the episode loop and the outside world: the command
//! proposer (an LLM in production, a scripted fake in tests) and the game
//! process it plays against.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

use crate::agent::prompt::WorldContext;

#[derive(Debug, Error)]
pub enum ProposerFailure {
    #[error("proposer timed out after {0:?}")]
    Timeout(Duration),
    #[error("proposer failed: {0}")]
    Failed(String),
}

/// Produces a candidate command from the latest observation plus the world
/// context. `feedback` carries the rejection reason when a previous proposal
/// this turn was refused, or soft-penalty notes from the last committed turn.
///
/// Failures are typed so the loop (and anyone else driving a proposer) can
/// match on them instead of scraping strings; timeouts are imposed by the
/// caller and reported as `ProposerFailure::Timeout`.
pub trait ActionProposer: Send + Sync {
    fn propose<'a>(
        &'a self,
        observation: &'a str,
        context: &'a WorldContext,
        feedback: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<String, ProposerFailure>> + Send + 'a>>;
}

/// A running game the episode can type into. `intro` yields the opening text
/// before any command; `send` types one command and returns everything the
/// game printed up to its next prompt.
pub trait GameProcess: Send + Sync {
    fn intro<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

    fn send<'a>(
        &'a self,
        command: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// First plausible command line in a raw proposer reply. Models often wrap
/// the command in chatter; we take the first non-empty line and strip obvious
/// framing, leaving grammar enforcement to the verifier.
pub fn extract_command(raw: &str) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| {
            line.trim_start_matches('>')
                .trim_start_matches("command:")
                .trim_start_matches("COMMAND:")
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
}
