use std::collections::HashMap;

use anyhow::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::domain::{
    build_integrity_report, canonical_deck, is_valid_character_name, shuffle_numbers,
    CanonicalCard, Card, CardId, CharacterId, CharacterStats, EntryKind, Holding,
    IntegrityReport, LedgerEntry, DEALER, DECK_SIZE, PLAYER,
};
use crate::io::render_holdings;
use crate::storage::Repository;

use super::LedgerError;

/// The card ledger: canonical deck, per-character holdings, chip balances
/// and the journal, behind one explicit store handle.
///
/// Single process, single writer. Every mutating operation runs in its own
/// transaction, so a failure part-way leaves the store untouched.
pub struct CardLedger {
    repo: Repository,
}

/// Result of moving cards between two characters
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub from_character: String,
    pub to_character: String,
    /// Cards moved, in the order they were dealt
    pub cards: Vec<Card>,
    pub from_total: i64,
    pub to_total: i64,
}

/// Result of moving chips between two characters
#[derive(Debug, Clone)]
pub struct ChipsTransferResult {
    pub from_character: String,
    pub to_character: String,
    pub amount: i64,
    pub from_balance: i64,
    pub to_balance: i64,
}

impl CardLedger {
    /// Create a new card ledger with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Open the store at the given path, creating the file and schema if needed.
    pub async fn open(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        debug!(path = database_path, "opened card store");
        Ok(Self::new(repo))
    }

    /// Connect to an existing store.
    pub async fn connect(database_path: &str) -> Result<Self, LedgerError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Close the store. Call once at process end.
    pub async fn close(self) {
        self.repo.close().await;
    }

    // ========================
    // Setup
    // ========================

    /// Replace the canonical card set with the 52 standard cards.
    pub async fn create_cards(&self) -> Result<(), LedgerError> {
        let mut tx = self.repo.begin().await?;
        self.reset_cards(&mut tx).await?;
        tx.commit().await.context("Failed to commit card setup")?;
        Ok(())
    }

    /// Wipe every character record and holding.
    pub async fn create_stats(&self) -> Result<(), LedgerError> {
        let mut tx = self.repo.begin().await?;
        self.repo.reset_stats(&mut tx).await?;
        tx.commit().await.context("Failed to commit stats reset")?;
        info!("stats reset, all characters removed");
        Ok(())
    }

    /// Register `name` with an empty hand and no chips. Re-registering an
    /// existing character discards its cards and chips.
    pub async fn create_character(&self, name: &str) -> Result<CharacterStats, LedgerError> {
        let mut tx = self.repo.begin().await?;
        let stats = self.register(&mut tx, name).await?;
        tx.commit()
            .await
            .context("Failed to commit character registration")?;
        Ok(stats)
    }

    pub async fn create_dealer(&self) -> Result<CharacterStats, LedgerError> {
        self.create_character(DEALER).await
    }

    pub async fn create_player(&self) -> Result<CharacterStats, LedgerError> {
        self.create_character(PLAYER).await
    }

    pub async fn create_custom(&self, name: &str) -> Result<CharacterStats, LedgerError> {
        self.create_character(name).await
    }

    /// Cards, then stats, then dealer and player, in one transaction.
    pub async fn init(&self) -> Result<(), LedgerError> {
        let mut tx = self.repo.begin().await?;
        self.reset_cards(&mut tx).await?;
        self.repo.reset_stats(&mut tx).await?;
        self.register(&mut tx, DEALER).await?;
        self.register(&mut tx, PLAYER).await?;
        tx.commit().await.context("Failed to commit init")?;
        info!("card store initialized");
        Ok(())
    }

    /// Drop all persisted state. Irrecoverable.
    pub async fn teardown(&self) -> Result<(), LedgerError> {
        self.repo.teardown().await?;
        warn!("card store torn down");
        Ok(())
    }

    async fn reset_cards(&self, conn: &mut SqliteConnection) -> Result<(), LedgerError> {
        let deck = canonical_deck();
        self.repo.reset_cards(conn, &deck).await?;
        debug!(cards = deck.len(), "canonical deck written");
        Ok(())
    }

    async fn register(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<CharacterStats, LedgerError> {
        if !is_valid_character_name(name) {
            return Err(LedgerError::InvalidCharacterName(name.to_string()));
        }
        let id = self.repo.register_character(conn, name).await?;
        info!(character = name, "character registered");
        Ok(self.repo.get_stats(conn, id).await?)
    }

    /// Resolve a name through the registry. No storage access happens for
    /// names that fail validation.
    async fn resolve(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<CharacterId, LedgerError> {
        if !is_valid_character_name(name) {
            return Err(LedgerError::InvalidCharacterName(name.to_string()));
        }
        self.repo
            .find_character(conn, name)
            .await?
            .ok_or_else(|| LedgerError::UnknownCharacter(name.to_string()))
    }

    // ========================
    // Shuffle
    // ========================

    /// Replace the dealer's hand with all 52 cards in a fresh random order.
    /// Returns the cards in deal order.
    pub async fn shuffle_cards_dealer(&self) -> Result<Vec<Card>, LedgerError> {
        let order = shuffle_numbers(DECK_SIZE, &mut rand::thread_rng())?;
        self.deal_to_dealer(&order).await
    }

    /// Same as [`CardLedger::shuffle_cards_dealer`] with a reproducible order.
    pub async fn shuffle_cards_dealer_seeded(&self, seed: u64) -> Result<Vec<Card>, LedgerError> {
        let order = shuffle_numbers(DECK_SIZE, &mut StdRng::seed_from_u64(seed))?;
        self.deal_to_dealer(&order).await
    }

    async fn deal_to_dealer(&self, order: &[CardId]) -> Result<Vec<Card>, LedgerError> {
        let mut tx = self.repo.begin().await?;
        let dealer = self.resolve(&mut tx, DEALER).await?;

        let deck = self.repo.list_cards(&mut tx).await?;
        let found = deck.len() as i64;
        if deck.len() != DECK_SIZE {
            return Err(LedgerError::DeckIncomplete { found });
        }
        let by_id: HashMap<CardId, Card> = deck.iter().map(|c| (c.id, c.card)).collect();

        self.repo.clear_holdings(&mut tx, dealer).await?;

        let mut dealt = Vec::with_capacity(order.len());
        for card_id in order {
            let card = by_id
                .get(card_id)
                .copied()
                .ok_or(LedgerError::DeckIncomplete { found })?;
            self.repo.insert_holding(&mut tx, dealer, card).await?;
            dealt.push(card);
        }

        self.repo.refresh_total_cards(&mut tx, dealer).await?;
        let mut entry = LedgerEntry::new(EntryKind::Shuffle, DEALER, DEALER, dealt.len() as i64);
        self.repo.save_entry(&mut tx, &mut entry).await?;
        tx.commit().await.context("Failed to commit shuffle")?;

        info!(cards = dealt.len(), "dealer deck shuffled");
        Ok(dealt)
    }

    // ========================
    // Transfers
    // ========================

    /// Move the `count` lowest-id (next to be dealt) cards from `from` to `to`.
    ///
    /// All or nothing: if `from` holds fewer than `count` cards nothing moves.
    pub async fn card_transfer(
        &self,
        from: &str,
        to: &str,
        count: usize,
    ) -> Result<TransferResult, LedgerError> {
        let mut tx = self.repo.begin().await?;
        let from_id = self.resolve(&mut tx, from).await?;
        let to_id = self.resolve(&mut tx, to).await?;
        if from_id == to_id {
            return Err(LedgerError::SameCharacter(from.to_string()));
        }

        let requested = i64::try_from(count)
            .map_err(|_| LedgerError::InvalidAmount(format!("Card count too large: {}", count)))?;
        let moving = self.repo.list_holdings(&mut tx, from_id, Some(requested)).await?;
        if (moving.len() as i64) < requested {
            return Err(LedgerError::InsufficientCards {
                character: from.to_string(),
                available: moving.len() as i64,
                requested,
            });
        }

        for holding in &moving {
            self.repo.insert_holding(&mut tx, to_id, holding.card).await?;
        }
        if let Some(last) = moving.last() {
            self.repo
                .delete_holdings_through(&mut tx, from_id, last.id)
                .await?;
        }

        let from_total = self.repo.refresh_total_cards(&mut tx, from_id).await?;
        let to_total = self.repo.refresh_total_cards(&mut tx, to_id).await?;

        if !moving.is_empty() {
            let mut entry = LedgerEntry::new(EntryKind::Cards, from, to, requested);
            self.repo.save_entry(&mut tx, &mut entry).await?;
        }
        tx.commit().await.context("Failed to commit card transfer")?;

        debug!(from, to, count, "cards transferred");
        Ok(TransferResult {
            from_character: from.to_string(),
            to_character: to.to_string(),
            cards: moving.into_iter().map(|h| h.card).collect(),
            from_total,
            to_total,
        })
    }

    /// Move `amount` chips from `from` to `to`. Balances never go negative.
    pub async fn chips_transfer(
        &self,
        from: &str,
        to: &str,
        amount: i64,
    ) -> Result<ChipsTransferResult, LedgerError> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(
                "Chip amount must not be negative".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;
        let from_id = self.resolve(&mut tx, from).await?;
        let to_id = self.resolve(&mut tx, to).await?;
        if from_id == to_id {
            return Err(LedgerError::SameCharacter(from.to_string()));
        }

        let from_balance = self.repo.get_chips(&mut tx, from_id).await?;
        if from_balance < amount {
            return Err(LedgerError::InsufficientChips {
                character: from.to_string(),
                balance: from_balance,
                requested: amount,
            });
        }
        let to_balance = self.repo.get_chips(&mut tx, to_id).await?;
        let new_to = to_balance.checked_add(amount).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("Balance of {} would overflow", to))
        })?;
        let new_from = from_balance - amount;

        self.repo.set_chips(&mut tx, from_id, new_from).await?;
        self.repo.set_chips(&mut tx, to_id, new_to).await?;

        let mut entry = LedgerEntry::new(EntryKind::Chips, from, to, amount);
        self.repo.save_entry(&mut tx, &mut entry).await?;
        tx.commit().await.context("Failed to commit chip transfer")?;

        debug!(from, to, amount, "chips transferred");
        Ok(ChipsTransferResult {
            from_character: from.to_string(),
            to_character: to.to_string(),
            amount,
            from_balance: new_from,
            to_balance: new_to,
        })
    }

    // ========================
    // Queries
    // ========================

    /// Number of cards `name` holds, or `None` if no such character is registered.
    pub async fn get_card_amount(&self, name: &str) -> Result<Option<i64>, LedgerError> {
        if !is_valid_character_name(name) {
            return Ok(None);
        }
        let mut conn = self.repo.acquire().await?;
        match self.repo.find_character(&mut conn, name).await? {
            Some(id) => Ok(Some(self.repo.count_holdings(&mut conn, id).await?)),
            None => Ok(None),
        }
    }

    /// Recompute every character's cached card total. Returns how many
    /// characters were refreshed.
    pub async fn update_stats(&self) -> Result<u64, LedgerError> {
        let mut tx = self.repo.begin().await?;
        let refreshed = self.repo.refresh_all_totals(&mut tx).await?;
        tx.commit().await.context("Failed to commit stats refresh")?;
        debug!(characters = refreshed, "stats refreshed");
        Ok(refreshed)
    }

    pub async fn get_chips(&self, name: &str) -> Result<i64, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        let id = self.resolve(&mut conn, name).await?;
        Ok(self.repo.get_chips(&mut conn, id).await?)
    }

    /// Overwrite a character's chip balance.
    pub async fn set_chips(&self, name: &str, amount: i64) -> Result<(), LedgerError> {
        if amount < 0 {
            return Err(LedgerError::InvalidAmount(
                "Chip balance must not be negative".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;
        let id = self.resolve(&mut tx, name).await?;
        let previous = self.repo.get_chips(&mut tx, id).await?;
        self.repo.set_chips(&mut tx, id, amount).await?;

        let mut entry = LedgerEntry::new(EntryKind::Balance, name, name, amount - previous);
        self.repo.save_entry(&mut tx, &mut entry).await?;
        tx.commit().await.context("Failed to commit chip balance")?;

        debug!(character = name, chips = amount, "chip balance set");
        Ok(())
    }

    /// Overwrite a character's chip balance. Same as [`CardLedger::set_chips`].
    pub async fn add_chips(&self, name: &str, amount: i64) -> Result<(), LedgerError> {
        self.set_chips(name, amount).await
    }

    /// Adjust a character's chip balance by `delta`. Returns the new balance.
    pub async fn adjust_chips(&self, name: &str, delta: i64) -> Result<i64, LedgerError> {
        let mut tx = self.repo.begin().await?;
        let id = self.resolve(&mut tx, name).await?;
        let balance = self.repo.get_chips(&mut tx, id).await?;

        let updated = balance.checked_add(delta).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("Balance of {} would overflow", name))
        })?;
        if updated < 0 {
            return Err(LedgerError::InsufficientChips {
                character: name.to_string(),
                balance,
                requested: -delta,
            });
        }

        self.repo.set_chips(&mut tx, id, updated).await?;
        let mut entry = LedgerEntry::new(EntryKind::Balance, name, name, delta);
        self.repo.save_entry(&mut tx, &mut entry).await?;
        tx.commit().await.context("Failed to commit chip adjustment")?;

        debug!(character = name, delta, balance = updated, "chip balance adjusted");
        Ok(updated)
    }

    /// Stats rows for every registered character, ordered by name.
    pub async fn list_stats(&self) -> Result<Vec<CharacterStats>, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        Ok(self.repo.list_stats(&mut conn).await?)
    }

    pub async fn get_stats(&self, name: &str) -> Result<CharacterStats, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        let id = self.resolve(&mut conn, name).await?;
        Ok(self.repo.get_stats(&mut conn, id).await?)
    }

    /// The canonical deck in id order.
    pub async fn list_cards(&self) -> Result<Vec<CanonicalCard>, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        Ok(self.repo.list_cards(&mut conn).await?)
    }

    /// A character's full hand in deal order.
    pub async fn get_hand(&self, name: &str) -> Result<Vec<Holding>, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        let id = self.resolve(&mut conn, name).await?;
        Ok(self.repo.list_holdings(&mut conn, id, None).await?)
    }

    /// A character's hand as a bordered grid, in deal order.
    pub async fn render_hand(&self, name: &str) -> Result<String, LedgerError> {
        let hand = self.get_hand(name).await?;
        Ok(render_holdings(&hand))
    }

    /// The first `count` cards of a character's hand in deal order.
    /// Asking for more cards than are held is an error, not a short read.
    pub async fn reveal(&self, name: &str, count: usize) -> Result<Vec<Holding>, LedgerError> {
        let requested = i64::try_from(count)
            .map_err(|_| LedgerError::InvalidAmount(format!("Card count too large: {}", count)))?;

        let mut conn = self.repo.acquire().await?;
        let id = self.resolve(&mut conn, name).await?;
        let holdings = self.repo.list_holdings(&mut conn, id, Some(requested)).await?;
        if (holdings.len() as i64) < requested {
            return Err(LedgerError::InsufficientCards {
                character: name.to_string(),
                available: holdings.len() as i64,
                requested,
            });
        }
        Ok(holdings)
    }

    /// Every character's hand, ordered by character name.
    /// Characters with no cards are included with an empty hand.
    pub async fn list_hands(&self) -> Result<Vec<(String, Vec<Holding>)>, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        let stats = self.repo.list_stats(&mut conn).await?;
        let index: HashMap<String, usize> = stats
            .iter()
            .enumerate()
            .map(|(i, s)| (s.character.clone(), i))
            .collect();
        let mut hands: Vec<(String, Vec<Holding>)> = stats
            .into_iter()
            .map(|s| (s.character, Vec::new()))
            .collect();

        for (character, holding) in self.repo.list_all_holdings(&mut conn).await? {
            if let Some(&i) = index.get(&character) {
                hands[i].1.push(holding);
            }
        }
        Ok(hands)
    }

    /// Journal entries, newest first.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<LedgerEntry>, LedgerError> {
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let mut conn = self.repo.acquire().await?;
        Ok(self.repo.list_entries(&mut conn, limit).await?)
    }

    // ========================
    // Integrity
    // ========================

    /// Check the canonical deck, cached totals and duplicate card copies.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, LedgerError> {
        let mut conn = self.repo.acquire().await?;
        let canonical = self.repo.count_cards(&mut conn).await?;
        let stats = self.repo.list_stats(&mut conn).await?;
        let counts = self.repo.count_all_holdings(&mut conn).await?;
        let held: Vec<Card> = self
            .repo
            .list_all_holdings(&mut conn)
            .await?
            .into_iter()
            .map(|(_, h)| h.card)
            .collect();

        let report = build_integrity_report(canonical, &stats, &counts, &held);
        for issue in &report.issues {
            warn!(issue = issue.as_str(), "integrity issue");
        }
        Ok(report)
    }
}
