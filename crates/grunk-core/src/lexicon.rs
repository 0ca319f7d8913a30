//! Fixed game knowledge for Lost Pig: direction tokens, verb synonyms, item
//! vocabulary, the location lexicon used by the observation interpreter, and
//! the seeded connectivity graph.
//!
//! Everything here is data. Targeting a different adventure means swapping
//! these tables, not touching the engine.

/// Canonical direction tokens, in the order the game understands them.
pub const DIRECTIONS: &[&str] = &[
    "north",
    "south",
    "east",
    "west",
    "northeast",
    "northwest",
    "southeast",
    "southwest",
    "up",
    "down",
];

const DIRECTION_ABBREVIATIONS: &[(&str, &str)] = &[
    ("n", "north"),
    ("s", "south"),
    ("e", "east"),
    ("w", "west"),
    ("ne", "northeast"),
    ("nw", "northwest"),
    ("se", "southeast"),
    ("sw", "southwest"),
    ("u", "up"),
    ("d", "down"),
];

/// Maps a raw token to a canonical direction, expanding abbreviations.
pub fn canonical_direction(token: &str) -> Option<&'static str> {
    if let Some(dir) = DIRECTIONS.iter().find(|d| **d == token) {
        return Some(dir);
    }
    DIRECTION_ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, dir)| *dir)
}

const OPPOSITE_PAIRS: &[(&str, &str)] = &[
    ("north", "south"),
    ("east", "west"),
    ("northeast", "southwest"),
    ("northwest", "southeast"),
    ("up", "down"),
];

/// The reverse of a direction, for inserting the return edge of a discovered exit.
pub fn opposite(direction: &str) -> Option<&'static str> {
    for (a, b) in OPPOSITE_PAIRS {
        if *a == direction {
            return Some(b);
        }
        if *b == direction {
            return Some(a);
        }
    }
    None
}

/// Two-token phrases collapsed to a canonical single verb before parsing.
pub const VERB_PHRASES: &[(&str, &str, &str)] = &[
    ("pick", "up", "take"),
    ("put", "down", "drop"),
    ("look", "at", "examine"),
    ("talk", "to", "talk"),
    ("speak", "to", "talk"),
    ("go", "to", "go"),
];

/// Single-token verb synonyms.
pub const VERB_SYNONYMS: &[(&str, &str)] = &[
    ("get", "take"),
    ("grab", "take"),
    ("walk", "go"),
    ("run", "go"),
    ("move", "go"),
    ("travel", "go"),
    ("inspect", "examine"),
    ("x", "examine"),
    ("l", "look"),
    ("i", "inventory"),
    ("inv", "inventory"),
    ("discard", "drop"),
    ("activate", "use"),
    ("operate", "use"),
];

/// Verbs the command grammar accepts.
pub const KNOWN_VERBS: &[&str] = &[
    "go",
    "take",
    "drop",
    "use",
    "examine",
    "look",
    "read",
    "open",
    "close",
    "unlock",
    "lock",
    "light",
    "burn",
    "give",
    "put",
    "talk",
    "say",
    "search",
    "catch",
    "throw",
    "climb",
    "enter",
    "wait",
    "inventory",
    "pour",
    "fill",
    "hit",
    "push",
    "pull",
    "wear",
    "eat",
    "drink",
    "smell",
    "listen",
    "dig",
    "jump",
    "knock",
    "tie",
    "wave",
    "blow",
    "quit",
    "save",
    "restore",
    "help",
    "sing",
    "score",
];

/// Verbs that acquire their object; exempt from the inventory constraint.
pub const ACQUIRE_VERBS: &[&str] = &["take", "catch"];

/// Verbs whose object must already be in inventory (from the game's actual
/// mechanics; perception verbs like examine work on items on the floor).
pub const ITEM_USE_VERBS: &[&str] = &[
    "use", "drop", "give", "put", "open", "close", "unlock", "lock", "read", "eat", "drink",
    "light", "burn", "throw", "wear", "pour", "fill", "wave", "blow", "tie",
];

/// Verbs that rarely move the episode forward; soft-penalized.
pub const DISTRACTION_VERBS: &[&str] = &["quit", "save", "restore", "help", "sing"];

/// Articles and filler stripped during normalization.
pub const CONNECTIVES: &[&str] = &["the", "a", "an", "some", "my", "that", "this", "old"];

/// Prepositions the `VERB NOUN PREPOSITION NOUN` grammar keeps.
pub const PREPOSITIONS: &[&str] = &[
    "to", "in", "into", "on", "onto", "with", "at", "from", "under", "behind", "about",
];

/// Portable item vocabulary for Lost Pig.
pub const ITEMS: &[&str] = &[
    "torch", "pole", "key", "coin", "chair", "hat", "whistle", "book", "paper", "powder", "brick",
    "orb", "pants",
];

pub fn is_item(noun: &str) -> bool {
    ITEMS.contains(&noun)
}

/// Location lexicon: canonical name plus the observation keywords that name
/// it. Ordered most-specific first; the interpreter takes the first match.
pub const LOCATIONS: &[(&str, &[&str])] = &[
    ("fountain_room", &["fountain room", "fountain", "all wall glow", "glowing wall"]),
    ("shelf_room", &["shelf room", "shelves", "shelfs"]),
    ("table_room", &["table room", "autobaker"]),
    ("gnome_room", &["gnome room", "little person room", "closet"]),
    ("statue_room", &["statue room", "statue"]),
    ("cave_with_stream", &["cave with stream", "stream"]),
    ("windy_cave", &["windy cave", "windy"]),
    ("twisty_cave", &["twisty cave", "twisty tunnel"]),
    ("hole", &["bottom of hole", "deep hole", "fall down", "hole"]),
    ("forest", &["forest"]),
    ("outside", &["outside", "clearing", "open area"]),
];

/// First location keyword found in (lowercased) observation text, if any.
pub fn match_location(lower_text: &str) -> Option<&'static str> {
    for (name, keywords) in LOCATIONS {
        if keywords.iter().any(|kw| lower_text.contains(kw)) {
            return Some(name);
        }
    }
    None
}

/// Locations that need a light source to enter.
pub const DARK_LOCATIONS: &[&str] = &["hole", "cave_with_stream", "windy_cave", "twisty_cave"];

pub fn is_dark(location: &str) -> bool {
    DARK_LOCATIONS.contains(&location)
}

/// Locations where the draft blows out open flames; only the orb's glow
/// survives there.
pub const WINDY_LOCATIONS: &[&str] = &["windy_cave"];

pub fn is_windy(location: &str) -> bool {
    WINDY_LOCATIONS.contains(&location)
}

pub const START_LOCATION: &str = "outside";

/// Exits known before the first observation (from the game map). Each entry
/// is seeded in both directions.
pub const SEED_CONNECTIONS: &[(&str, &str, &str)] = &[
    ("outside", "north", "forest"),
    ("forest", "down", "hole"),
    ("hole", "east", "fountain_room"),
    ("fountain_room", "southeast", "shelf_room"),
    ("fountain_room", "southwest", "table_room"),
    ("fountain_room", "north", "statue_room"),
    ("fountain_room", "east", "cave_with_stream"),
    ("shelf_room", "west", "gnome_room"),
    ("table_room", "east", "gnome_room"),
    ("statue_room", "north", "windy_cave"),
    ("windy_cave", "north", "twisty_cave"),
    ("twisty_cave", "up", "forest"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_abbreviations_expand() {
        assert_eq!(canonical_direction("ne"), Some("northeast"));
        assert_eq!(canonical_direction("north"), Some("north"));
        assert_eq!(canonical_direction("stump"), None);
    }

    #[test]
    fn every_direction_has_an_opposite() {
        for dir in DIRECTIONS {
            let opp = opposite(dir).expect("opposite");
            assert_eq!(opposite(opp), Some(*dir));
        }
    }

    #[test]
    fn location_matching_prefers_specific_keywords() {
        assert_eq!(match_location("grunk in fountain room now"), Some("fountain_room"));
        assert_eq!(match_location("grunk fall down deep hole"), Some("hole"));
        assert_eq!(match_location("nothing recognizable here"), None);
    }

    #[test]
    fn seed_connections_only_name_known_locations() {
        for (from, dir, to) in SEED_CONNECTIONS {
            assert!(LOCATIONS.iter().any(|(name, _)| name == from), "{from}");
            assert!(LOCATIONS.iter().any(|(name, _)| name == to), "{to}");
            assert!(canonical_direction(dir).is_some(), "{dir}");
        }
    }
}
