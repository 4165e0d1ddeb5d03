use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type EntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// The dealer's hand was rebuilt from a fresh permutation
    Shuffle,
    /// Cards moved between two characters
    Cards,
    /// Chips moved between two characters
    Chips,
    /// A chip balance was set or adjusted directly
    Balance,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Shuffle => "shuffle",
            EntryKind::Cards => "cards",
            EntryKind::Chips => "chips",
            EntryKind::Balance => "balance",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "shuffle" => Some(EntryKind::Shuffle),
            "cards" => Some(EntryKind::Cards),
            "chips" => Some(EntryKind::Chips),
            "balance" => Some(EntryKind::Balance),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Append-only record of a mutating ledger operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Assigned by the store on insert; 0 until saved.
    pub sequence: i64,
    pub kind: EntryKind,
    pub from_character: String,
    pub to_character: String,
    pub quantity: i64,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        kind: EntryKind,
        from_character: impl Into<String>,
        to_character: impl Into<String>,
        quantity: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0,
            kind,
            from_character: from_character.into(),
            to_character: to_character.into(),
            quantity,
            recorded_at: Utc::now(),
        }
    }
}
