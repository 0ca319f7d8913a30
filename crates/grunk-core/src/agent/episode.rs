//! The episode controller: observe, propose, verify, check, commit, update.
//!
//! One turn is one committed command. Within a turn the proposer gets at most
//! `retry_cap + 1` calls; every refusal (timeout, malformed text, hard
//! constraint) is turned into feedback for the next attempt. When the budget
//! for a turn is exhausted the episode commits the fallback command instead
//! of stalling, so the game always advances.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::agent::constraint::{ConstraintChecker, Verdict, VerdictStatus};
use crate::agent::prompt::WorldContext;
use crate::agent::propose::{ActionProposer, GameProcess, ProposerFailure, extract_command};
use crate::agent::verify::{ActionVerifier, VerifiedCommand};
use crate::world::{ObservationInterpreter, Signal, WorldSnapshot, WorldState};

#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    pub system_prompt: String,
    /// Committed commands before the episode gives up.
    pub max_turns: u64,
    /// Extra proposer attempts after the first refusal, per turn.
    pub retry_cap: u32,
    pub proposer_timeout: Duration,
    /// Committed verbatim when a turn's proposal budget runs out.
    pub fallback_command: String,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are Grunk, an orc playing a text adventure. Find the pig and bring it back.".to_string(),
            max_turns: 40,
            retry_cap: 3,
            proposer_timeout: Duration::from_secs(30),
            fallback_command: "look".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The game announced completion.
    Done,
    /// The game process died or refused io.
    Failed { reason: String },
    /// `max_turns` commands committed without a terminal signal.
    BudgetExhausted,
    /// The caller raised the stop flag; the episode ended between turns.
    Cancelled,
}

/// Caller-side cancellation handle. The loop consults it only between turns,
/// so an in-flight proposer or game call always finishes its turn first.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything that happened in one committed turn, for the event log.
#[derive(Debug, Clone, Serialize)]
pub struct TurnEvent {
    pub turn: u64,
    pub proposer_calls: u32,
    pub fallback_used: bool,
    pub command: VerifiedCommand,
    pub verdict: Verdict,
    pub observation: String,
    pub matched_rule: Option<&'static str>,
    pub signals: Vec<Signal>,
    /// World state after this turn's update.
    pub snapshot: WorldSnapshot,
}

pub trait EventSink {
    fn record(&mut self, event: &TurnEvent);
}

/// Sink for callers that do not care about per-turn events.
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &TurnEvent) {}
}

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    pub outcome: Outcome,
    pub turns_played: u64,
    pub score: u32,
    pub final_snapshot: WorldSnapshot,
}

pub struct Episode {
    config: EpisodeConfig,
    world: WorldState,
    verifier: ActionVerifier,
    checker: ConstraintChecker,
    interpreter: ObservationInterpreter,
    /// Soft-penalty notes from the last committed command, shown to the
    /// proposer at the start of the next turn.
    carried_feedback: Option<String>,
    stop: StopFlag,
}

impl Episode {
    pub fn new(config: EpisodeConfig) -> Self {
        Self {
            config,
            world: WorldState::default(),
            verifier: ActionVerifier::new(),
            checker: ConstraintChecker::new(),
            interpreter: ObservationInterpreter::new(),
            carried_feedback: None,
            stop: StopFlag::default(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.config.system_prompt
    }

    /// Handle for stopping the episode from another task. Takes effect at
    /// the next turn boundary.
    pub fn stop_flag(&self) -> StopFlag {
        self.stop.clone()
    }

    pub async fn run(
        &mut self,
        game: &dyn GameProcess,
        proposer: &dyn ActionProposer,
        sink: &mut dyn EventSink,
    ) -> EpisodeReport {
        let mut observation = match game.intro().await {
            Ok(text) => text,
            Err(e) => {
                return self.finish(
                    Outcome::Failed {
                        reason: format!("game start: {e:#}"),
                    },
                    0,
                );
            }
        };
        self.interpreter.interpret(&observation, None, &mut self.world);

        let mut score = 0u32;
        for _ in 0..self.config.max_turns {
            if self.stop.is_set() {
                tracing::info!(target: "episode", "episode.cancelled turn={}", self.world.turn());
                return self.finish(Outcome::Cancelled, score);
            }
            let snap = self.world.snapshot();
            let ctx = WorldContext::from_snapshot(&snap);
            let mut feedback = self.carried_feedback.take();
            let mut proposer_calls = 0u32;
            let mut chosen: Option<(VerifiedCommand, Verdict)> = None;

            for _ in 0..=self.config.retry_cap {
                proposer_calls += 1;
                let attempt = tokio::time::timeout(
                    self.config.proposer_timeout,
                    proposer.propose(&observation, &ctx, feedback.as_deref()),
                )
                .await;
                let raw = match attempt {
                    Ok(Ok(raw)) => raw,
                    Ok(Err(failure)) => {
                        feedback = Some(failure.to_string());
                        continue;
                    }
                    Err(_) => {
                        feedback =
                            Some(ProposerFailure::Timeout(self.config.proposer_timeout).to_string());
                        continue;
                    }
                };
                let Some(candidate) = extract_command(&raw) else {
                    feedback = Some("empty reply; send exactly one command".to_string());
                    continue;
                };
                let cmd = match self.verifier.verify(&candidate) {
                    Ok(cmd) => cmd,
                    Err(e) => {
                        feedback = Some(format!("{e}; use VERB NOUN form or a direction"));
                        continue;
                    }
                };
                let verdict = self.checker.check(&cmd, &snap);
                if verdict.is_hard_reject() {
                    tracing::debug!(
                        target: "episode",
                        "episode.propose.rejected turn={} cmd={:?} reason={}",
                        snap.turn,
                        cmd.text,
                        verdict.feedback()
                    );
                    feedback = Some(verdict.feedback());
                    continue;
                }
                chosen = Some((cmd, verdict));
                break;
            }

            let fallback_used = chosen.is_none();
            let (cmd, verdict) = match chosen {
                Some(picked) => picked,
                None => {
                    let cmd = self
                        .verifier
                        .verify(&self.config.fallback_command)
                        .unwrap_or_else(|_| VerifiedCommand {
                            text: "look".to_string(),
                            verb: "look".to_string(),
                            noun: None,
                            second: None,
                            truncated: false,
                        });
                    tracing::warn!(
                        target: "episode",
                        "episode.fallback turn={} cmd={:?}",
                        snap.turn,
                        cmd.text
                    );
                    let verdict = self.checker.check(&cmd, &snap);
                    (cmd, verdict)
                }
            };

            if verdict.status == VerdictStatus::SoftPenalized {
                self.carried_feedback = Some(verdict.feedback());
            }

            let reply = match game.send(&cmd.text).await {
                Ok(reply) => reply,
                Err(e) => {
                    return self.finish(
                        Outcome::Failed {
                            reason: format!("game io: {e:#}"),
                        },
                        score,
                    );
                }
            };

            // Anti-repetition bookkeeping is keyed on the location the
            // command was issued from, before interpretation can move us.
            if let Some(here) = self.world.player_location() {
                self.world.note_tried(&here, &cmd.text);
            }
            let interp = self.interpreter.interpret(&reply, Some(&cmd), &mut self.world);
            self.world.advance_turn();

            if interp.signals.contains(&Signal::ScoreUp) {
                score += 1;
            }
            let completed = interp.signals.contains(&Signal::Completed);

            tracing::info!(
                target: "episode",
                "episode.turn turn={} cmd={:?} rule={:?} signals={:?}",
                snap.turn,
                cmd.text,
                interp.matched_rule,
                interp.signals
            );
            sink.record(&TurnEvent {
                turn: snap.turn,
                proposer_calls,
                fallback_used,
                command: cmd,
                verdict,
                observation: reply.clone(),
                matched_rule: interp.matched_rule,
                signals: interp.signals,
                snapshot: self.world.snapshot(),
            });
            observation = reply;

            if completed {
                return self.finish(Outcome::Done, score);
            }
        }

        self.finish(Outcome::BudgetExhausted, score)
    }

    fn finish(&self, outcome: Outcome, score: u32) -> EpisodeReport {
        EpisodeReport {
            outcome,
            turns_played: self.world.turn(),
            score,
            final_snapshot: self.world.snapshot(),
        }
    }
}
