//! Post-episode achievement evaluation.
//!
//! Achievements are milestones of progress through the hunt, computed from
//! the final report only. They make short, failed runs comparable: two
//! budget-exhausted episodes can still differ a lot in how far they got.

use serde::Serialize;

use crate::agent::{EpisodeReport, Outcome};
use crate::lexicon;
use crate::world::Pred;

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub name: &'static str,
    pub description: &'static str,
    pub earned: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub achievements: Vec<Achievement>,
    pub earned: usize,
    pub total: usize,
    pub score: u32,
    pub outcome: Outcome,
}

struct Check {
    name: &'static str,
    description: &'static str,
    earned: fn(&EpisodeReport) -> bool,
}

const CHECKS: &[Check] = &[
    Check {
        name: "left_the_clearing",
        description: "Moved out of the starting clearing",
        earned: |r| r.final_snapshot.visited.len() > 1,
    },
    Check {
        name: "went_underground",
        description: "Entered a dark place",
        earned: |r| {
            r.final_snapshot
                .visited
                .iter()
                .any(|loc| lexicon::is_dark(loc))
        },
    },
    Check {
        name: "got_torch",
        description: "Picked up the torch at some point",
        earned: |r| r.final_snapshot.held_ever.contains("torch"),
    },
    Check {
        name: "light_in_hand",
        description: "Ended the run carrying a working light",
        earned: |r| r.final_snapshot.light_carried,
    },
    Check {
        name: "got_key",
        description: "Picked up the key at some point",
        earned: |r| r.final_snapshot.held_ever.contains("key"),
    },
    Check {
        name: "found_the_pig",
        description: "Learned where the pig is",
        earned: |r| {
            r.final_snapshot
                .atoms
                .iter()
                .any(|a| a.pred == Pred::At && a.args.first().map(String::as_str) == Some("pig"))
        },
    },
    Check {
        name: "caught_the_pig",
        description: "Got hands on the pig",
        earned: |r| r.final_snapshot.held_ever.contains("pig"),
    },
    Check {
        name: "explored_the_caves",
        description: "Visited five or more places",
        earned: |r| r.final_snapshot.visited.len() >= 5,
    },
    Check {
        name: "brought_pig_home",
        description: "Finished the game",
        earned: |r| r.outcome == Outcome::Done,
    },
];

pub fn evaluate(report: &EpisodeReport) -> Evaluation {
    let achievements: Vec<Achievement> = CHECKS
        .iter()
        .map(|check| Achievement {
            name: check.name,
            description: check.description,
            earned: (check.earned)(report),
        })
        .collect();
    let earned = achievements.iter().filter(|a| a.earned).count();
    Evaluation {
        earned,
        total: achievements.len(),
        achievements,
        score: report.score,
        outcome: report.outcome.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::WorldState;

    fn report_for(world: &WorldState, outcome: Outcome, score: u32) -> EpisodeReport {
        EpisodeReport {
            outcome,
            turns_played: world.turn(),
            score,
            final_snapshot: world.snapshot(),
        }
    }

    #[test]
    fn fresh_world_earns_nothing() {
        let world = WorldState::new("outside");
        let eval = evaluate(&report_for(&world, Outcome::BudgetExhausted, 0));
        assert_eq!(eval.earned, 0);
        assert_eq!(eval.total, CHECKS.len());
    }

    #[test]
    fn progress_shows_up_as_achievements() {
        let mut world = WorldState::new("outside");
        world.set_player_location("forest");
        world.add_item("torch");
        world.set_player_location("hole");
        world.set_entity_location("pig", "fountain_room");

        let eval = evaluate(&report_for(&world, Outcome::BudgetExhausted, 1));
        let earned: Vec<_> = eval
            .achievements
            .iter()
            .filter(|a| a.earned)
            .map(|a| a.name)
            .collect();
        assert_eq!(
            earned,
            vec![
                "left_the_clearing",
                "went_underground",
                "got_torch",
                "light_in_hand",
                "found_the_pig",
            ]
        );
        assert_eq!(eval.score, 1);
    }

    #[test]
    fn winning_earns_the_final_achievement() {
        let mut world = WorldState::new("outside");
        world.add_item("pig");
        let eval = evaluate(&report_for(&world, Outcome::Done, 7));
        let by_name = |name: &str| {
            eval.achievements
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.earned)
        };
        assert_eq!(by_name("caught_the_pig"), Some(true));
        assert_eq!(by_name("brought_pig_home"), Some(true));
    }
}
