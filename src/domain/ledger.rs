use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{Card, CharacterStats, DECK_SIZE};

/// A character whose cached `total_cards` disagrees with its holdings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsDrift {
    pub character: String,
    pub cached: i64,
    pub actual: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub canonical_cards: i64,
    pub character_count: usize,
    pub total_holdings: i64,
    pub total_chips: i64,
    pub drift: Vec<StatsDrift>,
    /// Cards held in more than one copy, with their copy count.
    pub duplicates: Vec<(Card, usize)>,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Build an integrity report from raw store counts.
///
/// `actual_counts` maps character name to its real holdings count and
/// `held_cards` is every card copy currently held by anyone.
pub fn build_integrity_report(
    canonical_cards: i64,
    stats: &[CharacterStats],
    actual_counts: &HashMap<String, i64>,
    held_cards: &[Card],
) -> IntegrityReport {
    let mut issues = Vec::new();

    if canonical_cards != DECK_SIZE as i64 {
        issues.push(format!(
            "Canonical deck has {} cards, expected {}",
            canonical_cards, DECK_SIZE
        ));
    }

    let drift: Vec<StatsDrift> = stats
        .iter()
        .filter_map(|s| {
            let actual = actual_counts.get(&s.character).copied().unwrap_or(0);
            (actual != s.total_cards).then(|| StatsDrift {
                character: s.character.clone(),
                cached: s.total_cards,
                actual,
            })
        })
        .collect();

    for d in &drift {
        issues.push(format!(
            "Stats for '{}' say {} cards but {} are held",
            d.character, d.cached, d.actual
        ));
    }

    let mut copies: BTreeMap<Card, usize> = BTreeMap::new();
    for card in held_cards {
        *copies.entry(*card).or_insert(0) += 1;
    }
    let duplicates: Vec<(Card, usize)> = copies.into_iter().filter(|(_, n)| *n > 1).collect();

    for (card, n) in &duplicates {
        issues.push(format!("{} is held {} times", card, n));
    }

    let negative: Vec<&CharacterStats> = stats.iter().filter(|s| s.chips < 0).collect();
    for s in negative {
        issues.push(format!("'{}' has a negative chip balance ({})", s.character, s.chips));
    }

    IntegrityReport {
        canonical_cards,
        character_count: stats.len(),
        total_holdings: held_cards.len() as i64,
        total_chips: stats.iter().map(|s| s.chips).sum(),
        drift,
        duplicates,
        issues,
    }
}
