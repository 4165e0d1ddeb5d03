use serde::{Deserialize, Serialize};

use super::Card;

/// Opaque storage handle for a registered character.
///
/// Obtained only by resolving a name through the registry, so holding one
/// means the character existed when it was looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub(crate) i64);

impl CharacterId {
    pub fn get(&self) -> i64 {
        self.0
    }
}

pub const DEALER: &str = "dealer";
pub const PLAYER: &str = "player";

pub const MAX_CHARACTER_NAME_LEN: usize = 32;

/// Character names are 1-32 ASCII letters, digits, `_` or `-`.
pub fn is_valid_character_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_CHARACTER_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// One row of the stats table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub character: String,
    /// Cached holdings count, refreshed by transfers and `update_stats`.
    pub total_cards: i64,
    pub chips: i64,
}

/// One physical card copy held by a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub id: i64,
    pub card: Card,
}
