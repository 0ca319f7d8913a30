//! Action verifier: raw proposer text to a canonical game command.
//!
//! The accepted grammar is `VERB [NOUN [PREPOSITION NOUN]]`, plus bare
//! directions. Normalization is idempotent: verifying an already-canonical
//! command returns it unchanged.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::lexicon;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("empty command")]
    Empty,
    #[error("malformed command: {0}")]
    Malformed(String),
}

/// A command that passed the grammar. `text` is the canonical form actually
/// sent to the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCommand {
    pub text: String,
    pub verb: String,
    pub noun: Option<String>,
    pub second: Option<(String, String)>,
    /// True when trailing clauses were cut off a compound proposal.
    pub truncated: bool,
}

impl VerifiedCommand {
    /// The canonical direction for movement commands, `None` otherwise.
    pub fn direction(&self) -> Option<&'static str> {
        if self.verb != "go" {
            return None;
        }
        self.noun.as_deref().and_then(lexicon::canonical_direction)
    }
}

impl fmt::Display for VerifiedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionVerifier;

impl ActionVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, raw: &str) -> Result<VerifiedCommand, VerifyError> {
        let lowered = raw.trim().to_lowercase();
        let stripped = lowered.trim_matches(|c| c == '"' || c == '\'' || c == '`');
        if stripped.is_empty() {
            return Err(VerifyError::Empty);
        }

        let (clause, truncated) = first_clause(stripped);
        let mut tokens = tokenize(clause);
        if tokens.is_empty() {
            return Err(VerifyError::Empty);
        }

        collapse_phrases(&mut tokens);
        apply_synonyms(&mut tokens);
        tokens.retain(|t| !lexicon::CONNECTIVES.contains(&t.as_str()));
        if tokens.is_empty() {
            return Err(VerifyError::Malformed("only filler words".into()));
        }

        // Movement: a direction anywhere in a `go` command, or a bare
        // direction token, becomes the canonical one-word form.
        if let Some(direction) = movement_direction(&tokens) {
            return Ok(VerifiedCommand {
                text: direction.to_string(),
                verb: "go".to_string(),
                noun: Some(direction.to_string()),
                second: None,
                truncated,
            });
        }

        let verb = tokens.remove(0);
        if !lexicon::KNOWN_VERBS.contains(&verb.as_str()) {
            return Err(VerifyError::Malformed(format!("unknown verb '{verb}'")));
        }

        let prep_index = tokens
            .iter()
            .position(|t| lexicon::PREPOSITIONS.contains(&t.as_str()));
        let (noun_tokens, rest) = match prep_index {
            Some(i) => tokens.split_at(i),
            None => (&tokens[..], &[][..]),
        };

        let noun = (!noun_tokens.is_empty()).then(|| noun_tokens.join(" "));
        let second = match rest.split_first() {
            Some((prep, object)) if !object.is_empty() => {
                Some((prep.clone(), object.join(" ")))
            }
            Some((prep, _)) => {
                return Err(VerifyError::Malformed(format!(
                    "nothing after '{prep}'"
                )));
            }
            None => None,
        };

        let mut text = verb.clone();
        if let Some(n) = &noun {
            text.push(' ');
            text.push_str(n);
        }
        if let Some((prep, object)) = &second {
            text.push(' ');
            text.push_str(prep);
            text.push(' ');
            text.push_str(object);
        }

        Ok(VerifiedCommand {
            text,
            verb,
            noun,
            second,
            truncated,
        })
    }
}

/// First clause of a possibly-compound proposal, plus whether anything was cut.
fn first_clause(text: &str) -> (&str, bool) {
    let earliest = [" then ", " and ", ",", ";", "."]
        .iter()
        .filter_map(|sep| text.find(sep).map(|i| (i, sep.len())))
        .min_by_key(|(i, _)| *i);
    if let Some((i, len)) = earliest {
        let head = text[..i].trim();
        if !head.is_empty() {
            return (head, !text[i + len..].trim().is_empty());
        }
    }
    (text, false)
}

fn tokenize(clause: &str) -> Vec<String> {
    clause
        .split_whitespace()
        .map(|t| {
            t.trim_matches(|c: char| !c.is_ascii_alphanumeric())
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

fn collapse_phrases(tokens: &mut Vec<String>) {
    let mut i = 0;
    while i + 1 < tokens.len() {
        let matched = lexicon::VERB_PHRASES
            .iter()
            .find(|(a, b, _)| *a == tokens[i] && *b == tokens[i + 1]);
        if let Some((_, _, canonical)) = matched {
            tokens[i] = canonical.to_string();
            tokens.remove(i + 1);
        } else {
            i += 1;
        }
    }
}

fn apply_synonyms(tokens: &mut [String]) {
    for token in tokens.iter_mut() {
        if let Some((_, canonical)) = lexicon::VERB_SYNONYMS
            .iter()
            .find(|(raw, _)| *raw == token.as_str())
        {
            *token = canonical.to_string();
        }
    }
}

fn movement_direction(tokens: &[String]) -> Option<&'static str> {
    if tokens.len() == 1 {
        if let Some(dir) = lexicon::canonical_direction(&tokens[0]) {
            return Some(dir);
        }
    }
    if tokens[0] == "go" {
        return tokens
            .iter()
            .skip(1)
            .find_map(|t| lexicon::canonical_direction(t));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verify(raw: &str) -> VerifiedCommand {
        ActionVerifier::new().verify(raw).expect("valid command")
    }

    #[test]
    fn go_direction_collapses_to_bare_direction() {
        let cmd = verify("go north");
        assert_eq!(cmd.text, "north");
        assert_eq!(cmd.direction(), Some("north"));
        assert!(!cmd.truncated);
    }

    #[test]
    fn noisy_movement_reduces_to_the_direction() {
        let cmd = verify("go to the old stump east");
        assert_eq!(cmd.text, "east");
        assert_eq!(cmd.direction(), Some("east"));
    }

    #[test]
    fn abbreviations_expand() {
        assert_eq!(verify("ne").text, "northeast");
        assert_eq!(verify("u").text, "up");
    }

    #[test]
    fn verb_phrase_and_synonyms_normalize() {
        assert_eq!(verify("pick up the torch").text, "take torch");
        assert_eq!(verify("grab torch").text, "take torch");
        assert_eq!(verify("look at pole").text, "examine pole");
        assert_eq!(verify("x pole").text, "examine pole");
    }

    #[test]
    fn compound_proposals_are_truncated_to_the_first_clause() {
        let cmd = verify("take torch then go north");
        assert_eq!(cmd.text, "take torch");
        assert!(cmd.truncated);

        let cmd = verify("open door, go east");
        assert_eq!(cmd.text, "open door");
        assert!(cmd.truncated);
    }

    #[test]
    fn prepositional_objects_are_kept() {
        let cmd = verify("put the coin in fountain");
        assert_eq!(cmd.verb, "put");
        assert_eq!(cmd.noun.as_deref(), Some("coin"));
        assert_eq!(cmd.second, Some(("in".to_string(), "fountain".to_string())));
        assert_eq!(cmd.text, "put coin in fountain");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "go north",
            "Pick up the torch then run south",
            "put coin in fountain",
            "\"examine glowing wall\"",
        ] {
            let once = verify(raw);
            let twice = verify(&once.text);
            assert_eq!(once.text, twice.text, "{raw}");
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        let verifier = ActionVerifier::new();
        assert_eq!(verifier.verify("   "), Err(VerifyError::Empty));
        assert!(matches!(
            verifier.verify("frobnicate the pig"),
            Err(VerifyError::Malformed(_))
        ));
        assert!(matches!(
            verifier.verify("put coin in"),
            Err(VerifyError::Malformed(_))
        ));
        assert!(matches!(
            verifier.verify("the an some"),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn bare_verbs_are_fine() {
        let cmd = verify("look");
        assert_eq!(cmd.text, "look");
        assert_eq!(cmd.noun, None);
        assert_eq!(verify("inventory").text, "inventory");
        assert_eq!(verify("i").text, "inventory");
    }
}
