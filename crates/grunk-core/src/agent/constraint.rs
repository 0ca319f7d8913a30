//! Constraint checker: a pure function from (command, snapshot) to a verdict.
//!
//! Hard constraints reject outright and are evaluated in a fixed order with
//! short-circuiting, so a command that violates several reports only the
//! highest-priority one. Soft constraints accumulate a penalty but never
//! block. Same command plus same snapshot always yields the same verdict.

use std::fmt;

use serde::Serialize;

use crate::agent::verify::VerifiedCommand;
use crate::lexicon;
use crate::world::WorldSnapshot;

pub const REPETITION_PENALTY: f32 = 0.3;
pub const DISTRACTION_PENALTY: f32 = 0.2;
pub const UNGROUNDED_NOUN_PENALTY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Accepted,
    HardRejected,
    SoftPenalized,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum Reason {
    MissingItem { item: String },
    NoExit { direction: String },
    DarkWithoutLight { destination: String },
    TorchBlowsOut { destination: String },
    Repetition,
    Incoherent { detail: String },
}

impl Reason {
    pub fn code(&self) -> &'static str {
        match self {
            Reason::MissingItem { .. } => "missing_item",
            Reason::NoExit { .. } => "no_exit",
            Reason::DarkWithoutLight { .. } => "dark_without_light",
            Reason::TorchBlowsOut { .. } => "torch_blows_out",
            Reason::Repetition => "repetition",
            Reason::Incoherent { .. } => "incoherent",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::MissingItem { item } => write!(f, "Grunk not carrying {item}"),
            Reason::NoExit { direction } => write!(f, "no known exit {direction} from here"),
            Reason::DarkWithoutLight { destination } => {
                write!(f, "{destination} is dark and Grunk has no light")
            }
            Reason::TorchBlowsOut { destination } => {
                write!(f, "wind in {destination} blow torch out; Grunk need the orb")
            }
            Reason::Repetition => write!(f, "already tried that here"),
            Reason::Incoherent { detail } => write!(f, "unlikely to help: {detail}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub reasons: Vec<Reason>,
    pub penalty: f32,
}

impl Verdict {
    pub fn is_hard_reject(&self) -> bool {
        self.status == VerdictStatus::HardRejected
    }

    /// One-line feedback for the proposer, built from all reasons.
    pub fn feedback(&self) -> String {
        self.reasons
            .iter()
            .map(Reason::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstraintChecker;

impl ConstraintChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, cmd: &VerifiedCommand, snap: &WorldSnapshot) -> Verdict {
        if let Some(reason) = hard_violation(cmd, snap) {
            return Verdict {
                status: VerdictStatus::HardRejected,
                reasons: vec![reason],
                penalty: 1.0,
            };
        }

        let mut reasons = Vec::new();
        let mut penalty = 0.0f32;
        if let Some(here) = snap.player_location.as_deref()
            && snap.is_tried(here, &cmd.text)
        {
            reasons.push(Reason::Repetition);
            penalty += REPETITION_PENALTY;
        }
        if lexicon::DISTRACTION_VERBS.contains(&cmd.verb.as_str()) {
            reasons.push(Reason::Incoherent {
                detail: format!("'{}' does not move the hunt forward", cmd.verb),
            });
            penalty += DISTRACTION_PENALTY;
        } else if let Some(noun) = cmd.noun.as_deref()
            && cmd.direction().is_none()
            && !lexicon::is_item(noun)
        {
            reasons.push(Reason::Incoherent {
                detail: format!("'{noun}' is not a thing Grunk knows"),
            });
            penalty += UNGROUNDED_NOUN_PENALTY;
        }

        if reasons.is_empty() {
            Verdict {
                status: VerdictStatus::Accepted,
                reasons,
                penalty: 0.0,
            }
        } else {
            Verdict {
                status: VerdictStatus::SoftPenalized,
                reasons,
                penalty: penalty.min(1.0),
            }
        }
    }
}

/// Hard constraints in priority order; the first violation wins.
fn hard_violation(cmd: &VerifiedCommand, snap: &WorldSnapshot) -> Option<Reason> {
    // 1. Using an item requires holding it. Acquisition and perception verbs
    //    are exempt; they are how items get into inventory at all.
    if lexicon::ITEM_USE_VERBS.contains(&cmd.verb.as_str())
        && let Some(item) = cmd.noun.as_deref()
        && lexicon::is_item(item)
        && !snap.has_item(item)
    {
        return Some(Reason::MissingItem {
            item: item.to_string(),
        });
    }

    let (Some(direction), Some(here)) = (cmd.direction(), snap.player_location.as_deref()) else {
        return None;
    };

    // 2. Movement requires a known exit.
    let Some(destination) = snap.destination(here, direction) else {
        return Some(Reason::NoExit {
            direction: direction.to_string(),
        });
    };

    // 3. Entering a dark place requires carrying light.
    if !snap.is_lit(destination) && !snap.light_carried {
        return Some(Reason::DarkWithoutLight {
            destination: destination.to_string(),
        });
    }

    // 4. The draft in windy places puts out open flames; torchlight does
    //    not count there.
    if lexicon::is_windy(destination) && !snap.has_item("orb") {
        return Some(Reason::TorchBlowsOut {
            destination: destination.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::verify::ActionVerifier;
    use crate::world::WorldState;

    fn cmd(raw: &str) -> VerifiedCommand {
        ActionVerifier::new().verify(raw).expect("valid command")
    }

    #[test]
    fn using_an_item_not_held_is_hard_rejected() {
        let snap = WorldState::new("outside").snapshot();
        let verdict = ConstraintChecker::new().check(&cmd("light torch"), &snap);
        assert_eq!(verdict.status, VerdictStatus::HardRejected);
        assert_eq!(
            verdict.reasons,
            vec![Reason::MissingItem {
                item: "torch".to_string()
            }]
        );
        assert_eq!(verdict.penalty, 1.0);
    }

    #[test]
    fn acquisition_verbs_are_exempt_from_the_inventory_constraint() {
        let snap = WorldState::new("outside").snapshot();
        let verdict = ConstraintChecker::new().check(&cmd("take torch"), &snap);
        assert_eq!(verdict.status, VerdictStatus::Accepted);
        let verdict = ConstraintChecker::new().check(&cmd("examine torch"), &snap);
        assert_ne!(verdict.status, VerdictStatus::HardRejected);
    }

    #[test]
    fn moving_through_an_unknown_exit_is_hard_rejected() {
        let snap = WorldState::new("outside").snapshot();
        let verdict = ConstraintChecker::new().check(&cmd("go west"), &snap);
        assert_eq!(
            verdict.reasons,
            vec![Reason::NoExit {
                direction: "west".to_string()
            }]
        );
        assert_eq!(verdict.reasons[0].code(), "no_exit");
    }

    #[test]
    fn dark_destination_requires_carried_light() {
        let mut world = WorldState::new("outside");
        world.set_player_location("forest");
        let verdict = ConstraintChecker::new().check(&cmd("go down"), &world.snapshot());
        assert_eq!(
            verdict.reasons,
            vec![Reason::DarkWithoutLight {
                destination: "hole".to_string()
            }]
        );

        world.add_item("torch");
        let verdict = ConstraintChecker::new().check(&cmd("go down"), &world.snapshot());
        assert_eq!(verdict.status, VerdictStatus::Accepted);

        world.set_torch_lit(false);
        let verdict = ConstraintChecker::new().check(&cmd("go down"), &world.snapshot());
        assert_eq!(verdict.status, VerdictStatus::HardRejected);
    }

    #[test]
    fn windy_cave_needs_the_orb_even_with_a_lit_torch() {
        let mut world = WorldState::new("outside");
        world.set_player_location("statue_room");
        world.add_item("torch");

        let verdict = ConstraintChecker::new().check(&cmd("go north"), &world.snapshot());
        assert_eq!(verdict.status, VerdictStatus::HardRejected);
        assert_eq!(
            verdict.reasons,
            vec![Reason::TorchBlowsOut {
                destination: "windy_cave".to_string()
            }]
        );

        world.add_item("orb");
        let verdict = ConstraintChecker::new().check(&cmd("go north"), &world.snapshot());
        assert_eq!(verdict.status, VerdictStatus::Accepted);
    }

    #[test]
    fn dark_rejection_outranks_the_wind() {
        // No light at all: the illumination rule fires, not the wind rule.
        let mut world = WorldState::new("outside");
        world.set_player_location("statue_room");
        let verdict = ConstraintChecker::new().check(&cmd("go north"), &world.snapshot());
        assert_eq!(verdict.reasons.len(), 1);
        assert_eq!(verdict.reasons[0].code(), "dark_without_light");
    }

    #[test]
    fn hard_rejections_short_circuit_to_one_reason() {
        // `drop torch` without the torch also has an ungrounded-noun angle,
        // but the hard reason must stand alone.
        let snap = WorldState::new("outside").snapshot();
        let verdict = ConstraintChecker::new().check(&cmd("drop torch"), &snap);
        assert_eq!(verdict.reasons.len(), 1);
        assert_eq!(verdict.reasons[0].code(), "missing_item");
    }

    #[test]
    fn repetition_is_penalized_but_not_blocked() {
        let mut world = WorldState::new("outside");
        world.note_tried("outside", "look");
        let verdict = ConstraintChecker::new().check(&cmd("look"), &world.snapshot());
        assert_eq!(verdict.status, VerdictStatus::SoftPenalized);
        assert_eq!(verdict.reasons, vec![Reason::Repetition]);
        assert!((verdict.penalty - REPETITION_PENALTY).abs() < f32::EPSILON);
    }

    #[test]
    fn distraction_verbs_are_penalized() {
        let snap = WorldState::new("outside").snapshot();
        let verdict = ConstraintChecker::new().check(&cmd("sing"), &snap);
        assert_eq!(verdict.status, VerdictStatus::SoftPenalized);
        assert_eq!(verdict.reasons[0].code(), "incoherent");
    }

    #[test]
    fn verdicts_are_deterministic() {
        let mut world = WorldState::new("outside");
        world.note_tried("outside", "sing");
        let snap = world.snapshot();
        let command = cmd("sing");
        let a = ConstraintChecker::new().check(&command, &snap);
        let b = ConstraintChecker::new().check(&command, &snap);
        assert_eq!(a, b);
        assert_eq!(a.reasons.len(), 2, "repetition plus distraction stack");
    }
}
