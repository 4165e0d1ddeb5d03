use thiserror::Error;

use crate::domain::ShuffleError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown character: {0}")]
    UnknownCharacter(String),

    #[error("Invalid character name '{0}': use 1-32 letters, digits, '_' or '-'")]
    InvalidCharacterName(String),

    #[error("Insufficient cards held by {character}: holding {available}, requested {requested}")]
    InsufficientCards {
        character: String,
        available: i64,
        requested: i64,
    },

    #[error("Insufficient chips for {character}: balance {balance}, requested {requested}")]
    InsufficientChips {
        character: String,
        balance: i64,
        requested: i64,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Source and destination are the same character: {0}")]
    SameCharacter(String),

    #[error("Cannot shuffle {requested} cards (maximum is {max})")]
    ShuffleTooLarge { requested: usize, max: usize },

    #[error("Canonical deck is incomplete: found {found} cards, run init first")]
    DeckIncomplete { found: i64 },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<ShuffleError> for LedgerError {
    fn from(err: ShuffleError) -> Self {
        match err {
            ShuffleError::TooLarge { requested, max } => {
                LedgerError::ShuffleTooLarge { requested, max }
            }
        }
    }
}
