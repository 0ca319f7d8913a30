use serde::Serialize;
use serde_json::json;

use crate::world::WorldSnapshot;

/// The slice of world state the proposer gets to see, in stable serialized
/// form.
#[derive(Debug, Clone, Serialize)]
pub struct WorldContext {
    pub turn: u64,
    pub location: Option<String>,
    pub exits: Vec<(String, String)>,
    pub inventory: Vec<String>,
    pub light_carried: bool,
    pub tried_here: Vec<String>,
    pub visited_count: usize,
}

impl WorldContext {
    pub fn from_snapshot(snap: &WorldSnapshot) -> Self {
        let (exits, tried_here) = match snap.player_location.as_deref() {
            Some(here) => (
                snap.exits(here),
                snap.tried_here(here).into_iter().collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            turn: snap.turn,
            location: snap.player_location.clone(),
            exits,
            inventory: snap.inventory.iter().cloned().collect(),
            light_carried: snap.light_carried,
            tried_here,
            visited_count: snap.visited.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub command_contract: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            command_contract: "Reply with exactly one game command on a single line and nothing else.\nGrammar: VERB [NOUN [PREPOSITION NOUN]], or a bare compass direction.\nExamples: north, take torch, put coin in fountain, examine pole".to_string(),
        }
    }
}

pub fn build_action_prompt(
    system_prompt: &str,
    observation: &str,
    ctx: &WorldContext,
    feedback: Option<&str>,
    cfg: &PromptConfig,
) -> String {
    let state = json!({
        "turn": ctx.turn,
        "location": ctx.location,
        "exits": ctx.exits,
        "inventory": ctx.inventory,
        "light_carried": ctx.light_carried,
        "tried_here": ctx.tried_here,
        "rooms_visited": ctx.visited_count,
    });
    let state_json = serde_json::to_string_pretty(&state).unwrap_or_else(|_| "{}".to_string());

    let feedback_block = match feedback {
        Some(text) => format!("\n[FEEDBACK]\n{text}\n"),
        None => String::new(),
    };

    format!(
        "{system_prompt}\n\n[STATE_JSON]\n{state_json}\n\n[OBSERVATION]\n{observation}\n{feedback_block}\n[CONTRACT]\n{}\n",
        cfg.command_contract
    )
}
