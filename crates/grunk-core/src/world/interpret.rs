//! Observation interpreter: free game text in, predicate deltas out.
//!
//! The interpreter is a prioritized rule list evaluated in order; the first
//! rule that matches mutates the world and ends the pass. Text that matches
//! nothing causes no mutation at all — the world stays at its last known-good
//! value rather than the episode aborting, at the cost of possibly going
//! stale. Game-over and scoring phrases are not world-state facts; they come
//! back as signals for the episode loop.

use serde::Serialize;

use crate::agent::verify::VerifiedCommand;
use crate::lexicon;
use crate::world::state::WorldState;

/// Out-of-band phrases routed to the episode rather than the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// The game announced completion.
    Completed,
    /// The score went up this turn.
    ScoreUp,
}

#[derive(Debug, Clone, Default)]
pub struct Interpretation {
    /// Name of the rule that fired, if any. `None` means the text was
    /// unmatched and the world untouched.
    pub matched_rule: Option<&'static str>,
    pub signals: Vec<Signal>,
}

struct RuleInput<'a> {
    /// Lowercased observation text.
    text: &'a str,
    /// The command that produced this observation, when known.
    command: Option<&'a VerifiedCommand>,
}

struct Rule {
    name: &'static str,
    apply: fn(&RuleInput<'_>, &mut WorldState) -> bool,
}

pub struct ObservationInterpreter {
    rules: Vec<Rule>,
}

impl Default for ObservationInterpreter {
    fn default() -> Self {
        Self {
            rules: vec![
                Rule { name: "item_taken", apply: item_taken },
                Rule { name: "item_dropped", apply: item_dropped },
                Rule { name: "torch_out", apply: torch_out },
                Rule { name: "torch_lit", apply: torch_lit },
                Rule { name: "pig_caught", apply: pig_caught },
                Rule { name: "pig_seen", apply: pig_seen },
                Rule { name: "exit_blocked", apply: exit_blocked },
                Rule { name: "moved", apply: moved },
            ],
        }
    }
}

impl ObservationInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies at most one rule to the world and collects signals. Signals
    /// never mutate state, so they are scanned regardless of rule matching.
    pub fn interpret(
        &self,
        observation: &str,
        command: Option<&VerifiedCommand>,
        world: &mut WorldState,
    ) -> Interpretation {
        let text = observation.to_lowercase();
        let input = RuleInput {
            text: &text,
            command,
        };

        let mut matched_rule = None;
        for rule in &self.rules {
            if (rule.apply)(&input, world) {
                matched_rule = Some(rule.name);
                break;
            }
        }
        if matched_rule.is_none() && !text.trim().is_empty() {
            tracing::debug!(target: "interpret", "interpret.unmatched len={}", text.len());
        }

        Interpretation {
            matched_rule,
            signals: scan_signals(&text),
        }
    }
}

fn scan_signals(text: &str) -> Vec<Signal> {
    let mut signals = Vec::new();
    if text.contains("score go up") || text.contains("score has just gone up") {
        signals.push(Signal::ScoreUp);
    }
    const COMPLETION_PHRASES: &[&str] = &[
        "grunk bring pig back",
        "boss happy",
        "you have won",
        "you won",
        "the end",
    ];
    if COMPLETION_PHRASES.iter().any(|p| text.contains(p)) {
        signals.push(Signal::Completed);
    }
    signals
}

/// Confirmed pickup: the take command echoed back with an acknowledgement.
/// `has(player, item)` is only ever added here and in `pig_caught`.
fn item_taken(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    let Some(cmd) = input.command else {
        return false;
    };
    if cmd.verb != "take" {
        return false;
    }
    let Some(item) = cmd.noun.as_deref().filter(|n| lexicon::is_item(n)) else {
        return false;
    };
    const CONFIRMATIONS: &[&str] = &["taken", "got it", "ok, got", "grunk take", "grunk get"];
    if !CONFIRMATIONS.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    world.add_item(item);
    true
}

fn item_dropped(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    let Some(cmd) = input.command else {
        return false;
    };
    if cmd.verb != "drop" {
        return false;
    }
    let Some(item) = cmd.noun.as_deref() else {
        return false;
    };
    if !world.has_item(item) {
        return false;
    }
    const CONFIRMATIONS: &[&str] = &["dropped", "grunk drop", "put down"];
    if !CONFIRMATIONS.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    world.remove_item(item);
    true
}

fn torch_out(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    if !input.text.contains("torch") {
        return false;
    }
    const OUT_PHRASES: &[&str] = &["go out", "went out", "goes out", "not lit", "sooty", "extinguish"];
    if !OUT_PHRASES.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    world.set_torch_lit(false);
    true
}

fn torch_lit(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    if !input.text.contains("torch") {
        return false;
    }
    const LIT_PHRASES: &[&str] = &["now lit", "burning", "on fire", "catch fire"];
    if !LIT_PHRASES.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    world.set_torch_lit(true);
    true
}

fn pig_caught(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    const CAUGHT_PHRASES: &[&str] = &["grunk catch pig", "grunk grab pig", "have pig", "carrying pig"];
    if !CAUGHT_PHRASES.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    world.add_item("pig");
    if let Some(here) = world.player_location() {
        world.set_entity_location("pig", &here);
    }
    true
}

fn pig_seen(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    const SEEN_PHRASES: &[&str] = &["see pig", "pig here", "pig there", "pig run"];
    if !SEEN_PHRASES.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    // Prefer a location named in the same text; otherwise the pig is here.
    let location = lexicon::match_location(input.text)
        .map(str::to_string)
        .or_else(|| world.player_location());
    let Some(location) = location else {
        return false;
    };
    world.set_entity_location("pig", &location);
    true
}

/// The game refused a move we thought existed: retract the assumed edge.
fn exit_blocked(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    let Some(direction) = input.command.and_then(VerifiedCommand::direction) else {
        return false;
    };
    const BLOCKED_PHRASES: &[&str] = &["can't go that way", "cannot go that way", "no way to go"];
    if !BLOCKED_PHRASES.iter().any(|p| input.text.contains(p)) {
        return false;
    }
    let Some(here) = world.player_location() else {
        return false;
    };
    let dest = world
        .snapshot()
        .destination(&here, direction)
        .map(str::to_string);
    let Some(dest) = dest else {
        return false;
    };
    world.unlink(&here, direction, &dest);
    true
}

/// A known location keyword in the text means the player moved. A location
/// not yet in the connectivity graph becomes a new node; if we know which
/// direction was taken, the edge (and its inverse) is recorded too.
fn moved(input: &RuleInput<'_>, world: &mut WorldState) -> bool {
    let Some(location) = lexicon::match_location(input.text) else {
        return false;
    };
    let previous = world.player_location();
    if previous.as_deref() == Some(location) {
        return false;
    }
    if let (Some(prev), Some(direction)) =
        (previous, input.command.and_then(VerifiedCommand::direction))
    {
        world.link(&prev, direction, location);
    }
    world.set_player_location(location);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::verify::ActionVerifier;
    use crate::world::atoms::Atom;

    fn cmd(raw: &str) -> VerifiedCommand {
        ActionVerifier::new().verify(raw).expect("valid command")
    }

    #[test]
    fn movement_updates_location_and_links_both_ways() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        // "stump_hollow" is not in the lexicon, so drive through a known one.
        let north = cmd("go north");
        let out = interp.interpret(
            "Grunk walk into forest. Tree everywhere.",
            Some(&north),
            &mut world,
        );
        assert_eq!(out.matched_rule, Some("moved"));
        let snap = world.snapshot();
        assert_eq!(snap.player_location.as_deref(), Some("forest"));
        assert_eq!(snap.destination("outside", "north"), Some("forest"));
        assert_eq!(snap.destination("forest", "south"), Some("outside"));
    }

    #[test]
    fn unmatched_text_never_mutates() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        let before = world.snapshot();
        for _ in 0..3 {
            let out = interp.interpret("", None, &mut world);
            assert_eq!(out.matched_rule, None);
            assert!(out.signals.is_empty());
        }
        let out = interp.interpret("Grunk not understand that.", None, &mut world);
        assert_eq!(out.matched_rule, None);
        assert_eq!(world.snapshot(), before);
    }

    #[test]
    fn take_confirmation_adds_has_atom() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        let take = cmd("take torch");
        let out = interp.interpret("Taken.", Some(&take), &mut world);
        assert_eq!(out.matched_rule, Some("item_taken"));
        assert!(world.has_item("torch"));
    }

    #[test]
    fn take_without_confirmation_is_not_inferred() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        let take = cmd("take torch");
        interp.interpret("Grunk see torch on ground.", Some(&take), &mut world);
        assert!(!world.has_item("torch"));
    }

    #[test]
    fn drop_confirmation_removes_has_atom() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        world.add_item("coin");
        let drop = cmd("drop coin");
        let out = interp.interpret("Dropped.", Some(&drop), &mut world);
        assert_eq!(out.matched_rule, Some("item_dropped"));
        assert!(!world.has_item("coin"));
    }

    #[test]
    fn torch_phrases_toggle_light_state() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        world.add_item("torch");
        assert!(world.light_carried());

        interp.interpret("Wind blow hard. Torch go out!", None, &mut world);
        assert!(!world.light_carried());

        interp.interpret("Torch catch fire and now burning good.", None, &mut world);
        assert!(world.light_carried());
    }

    #[test]
    fn blocked_exit_retracts_the_assumed_edge() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        assert_eq!(world.snapshot().destination("outside", "north"), Some("forest"));
        let north = cmd("go north");
        let out = interp.interpret("Grunk can't go that way.", Some(&north), &mut world);
        assert_eq!(out.matched_rule, Some("exit_blocked"));
        assert_eq!(world.snapshot().destination("outside", "north"), None);
        assert_eq!(world.snapshot().destination("forest", "south"), None);
    }

    #[test]
    fn score_and_completion_are_signals_not_atoms() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        let atoms_before = world.snapshot().atoms;

        let out = interp.interpret("[Grunk score go up one.]", None, &mut world);
        assert_eq!(out.signals, vec![Signal::ScoreUp]);

        let out = interp.interpret(
            "Grunk bring pig back! Boss happy. THE END",
            None,
            &mut world,
        );
        assert!(out.signals.contains(&Signal::Completed));
        assert_eq!(world.snapshot().atoms, atoms_before);
    }

    #[test]
    fn pig_sighting_places_the_pig() {
        let interp = ObservationInterpreter::new();
        let mut world = WorldState::new("outside");
        interp.interpret("Grunk see pig by fountain!", None, &mut world);
        assert!(
            world
                .snapshot()
                .atoms
                .contains(&Atom::at("pig", "fountain_room"))
        );
    }
}
