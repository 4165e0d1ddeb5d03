use rand::Rng;
use rand::seq::SliceRandom;

use super::CardId;

/// Largest permutation `shuffle_numbers` will produce.
pub const MAX_SHUFFLE_SIZE: usize = 999;

/// Produce a uniformly random permutation of `1..=count` (Fisher-Yates).
pub fn shuffle_numbers<R: Rng + ?Sized>(
    count: usize,
    rng: &mut R,
) -> Result<Vec<CardId>, ShuffleError> {
    if count > MAX_SHUFFLE_SIZE {
        return Err(ShuffleError::TooLarge {
            requested: count,
            max: MAX_SHUFFLE_SIZE,
        });
    }

    // count <= 999 so the cast cannot truncate
    let mut numbers: Vec<CardId> = (1..=count as CardId).collect();
    numbers.shuffle(rng);
    Ok(numbers)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShuffleError {
    TooLarge { requested: usize, max: usize },
}

impl std::fmt::Display for ShuffleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShuffleError::TooLarge { requested, max } => {
                write!(f, "Cannot shuffle {} numbers (maximum is {})", requested, max)
            }
        }
    }
}

impl std::error::Error for ShuffleError {}
