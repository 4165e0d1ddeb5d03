// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::collections::HashMap;

use anyhow::Result;
use card_ledger::application::CardLedger;
use card_ledger::domain::Card;
use tempfile::TempDir;

/// Helper to create a ledger on a fresh temporary store, already initialized
/// with the canonical deck, dealer and player.
pub async fn test_ledger() -> Result<(CardLedger, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let ledger = CardLedger::open(db_path.to_str().unwrap()).await?;
    ledger.init().await?;
    Ok((ledger, temp_dir))
}

/// Helper to create a ledger whose dealer holds a seeded shuffled deck.
pub async fn shuffled_ledger(seed: u64) -> Result<(CardLedger, TempDir)> {
    let (ledger, temp) = test_ledger().await?;
    ledger.shuffle_cards_dealer_seeded(seed).await?;
    Ok((ledger, temp))
}

/// A character's hand as plain cards, in deal order.
pub async fn hand_cards(ledger: &CardLedger, name: &str) -> Result<Vec<Card>> {
    Ok(ledger
        .get_hand(name)
        .await?
        .into_iter()
        .map(|h| h.card)
        .collect())
}

/// Count copies of each card, for comparing hands regardless of order.
pub fn multiset(cards: &[Card]) -> HashMap<Card, usize> {
    let mut counts = HashMap::new();
    for card in cards {
        *counts.entry(*card).or_insert(0) += 1;
    }
    counts
}
