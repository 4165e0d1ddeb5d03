use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::CardLedger;
use crate::domain::{CanonicalCard, CharacterStats, LedgerEntry};

/// A card copy as it appears in exports, tagged with its holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub character: String,
    pub id: i64,
    pub rank: String,
    pub suit: String,
}

/// Full store snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub cards: Vec<CanonicalCard>,
    pub stats: Vec<CharacterStats>,
    pub holdings: Vec<HoldingRecord>,
    pub journal: Vec<LedgerEntry>,
}

/// Exporter for converting ledger data to CSV or JSON
pub struct Exporter<'a> {
    ledger: &'a CardLedger,
}

impl<'a> Exporter<'a> {
    pub fn new(ledger: &'a CardLedger) -> Self {
        Self { ledger }
    }

    /// Export stats to CSV format
    pub async fn export_stats_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let stats = self.ledger.list_stats().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["character", "total_cards", "chips"])?;

        for s in &stats {
            csv_writer.write_record([
                s.character.clone(),
                s.total_cards.to_string(),
                s.chips.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(stats.len())
    }

    /// Export every held card to CSV format, grouped by character in deal order
    pub async fn export_holdings_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let records = self.holding_records().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["character", "id", "rank", "suit"])?;

        for record in &records {
            csv_writer.write_record([
                record.character.clone(),
                record.id.to_string(),
                record.rank.clone(),
                record.suit.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(records.len())
    }

    /// Export the journal to CSV format, oldest first
    pub async fn export_journal_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut entries = self.ledger.history(None).await?;
        entries.reverse();
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "sequence",
            "id",
            "kind",
            "from",
            "to",
            "quantity",
            "recorded_at",
        ])?;

        for entry in &entries {
            csv_writer.write_record([
                entry.sequence.to_string(),
                entry.id.to_string(),
                entry.kind.as_str().to_string(),
                entry.from_character.clone(),
                entry.to_character.clone(),
                entry.quantity.to_string(),
                entry.recorded_at.to_rfc3339(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }

    /// Export the full store as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<StoreSnapshot> {
        let mut journal = self.ledger.history(None).await?;
        journal.reverse();

        let snapshot = StoreSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            cards: self.ledger.list_cards().await?,
            stats: self.ledger.list_stats().await?,
            holdings: self.holding_records().await?,
            journal,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }

    async fn holding_records(&self) -> Result<Vec<HoldingRecord>> {
        let hands = self.ledger.list_hands().await?;
        Ok(hands
            .into_iter()
            .flat_map(|(character, hand)| {
                hand.into_iter().map(move |h| HoldingRecord {
                    character: character.clone(),
                    id: h.id,
                    rank: h.card.rank.code().to_string(),
                    suit: h.card.suit.symbol().to_string(),
                })
            })
            .collect())
    }
}
