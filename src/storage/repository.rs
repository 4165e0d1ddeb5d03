use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{
    CanonicalCard, Card, CharacterId, CharacterStats, EntryKind, Holding, LedgerEntry, Rank, Suit,
};

use super::{MIGRATION_001_INITIAL, SCHEMA_TEARDOWN};

/// Repository for persisting and querying cards, holdings, stats and the journal.
///
/// Query methods take an explicit connection so the caller decides the
/// transaction boundary: pass a `Transaction` from [`Repository::begin`] for
/// anything that mutates, or a pooled connection from [`Repository::acquire`]
/// for plain reads.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Start a transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    /// Check out a connection for read-only work.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire connection")
    }

    /// Drop every table. All persisted state is lost.
    pub async fn teardown(&self) -> Result<()> {
        sqlx::query(SCHEMA_TEARDOWN)
            .execute(&self.pool)
            .await
            .context("Failed to drop tables")?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Canonical cards
    // ========================

    /// Replace the canonical card set.
    pub async fn reset_cards(&self, conn: &mut SqliteConnection, deck: &[CanonicalCard]) -> Result<()> {
        sqlx::query("DELETE FROM cards")
            .execute(&mut *conn)
            .await
            .context("Failed to clear cards")?;

        for entry in deck {
            sqlx::query("INSERT INTO cards (id, rank, suit) VALUES (?, ?, ?)")
                .bind(i64::from(entry.id))
                .bind(entry.card.rank.code())
                .bind(entry.card.suit.symbol())
                .execute(&mut *conn)
                .await
                .context("Failed to insert card")?;
        }
        Ok(())
    }

    /// List the canonical cards ordered by id.
    pub async fn list_cards(&self, conn: &mut SqliteConnection) -> Result<Vec<CanonicalCard>> {
        let rows = sqlx::query("SELECT id, rank, suit FROM cards ORDER BY id")
            .fetch_all(&mut *conn)
            .await
            .context("Failed to list cards")?;

        rows.iter()
            .map(|row| -> Result<CanonicalCard> {
                let id: i64 = row.get("id");
                Ok(CanonicalCard {
                    id: u32::try_from(id).context("Invalid card id")?,
                    card: Self::row_to_card(row)?,
                })
            })
            .collect()
    }

    pub async fn count_cards(&self, conn: &mut SqliteConnection) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM cards")
            .fetch_one(&mut *conn)
            .await
            .context("Failed to count cards")?;
        Ok(row.get("count"))
    }

    // ========================
    // Character registry
    // ========================

    /// Resolve a character name to its storage handle.
    pub async fn find_character(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Option<CharacterId>> {
        let row = sqlx::query("SELECT id FROM stats WHERE character = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to look up character")?;

        Ok(row.map(|row| CharacterId(row.get("id"))))
    }

    /// Register a character, or reset an existing one to zero cards and chips.
    /// The character keeps its handle when re-registered.
    pub async fn register_character(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<CharacterId> {
        let row = sqlx::query(
            r#"
            INSERT INTO stats (character, total_cards, chips)
            VALUES (?, 0, 0)
            ON CONFLICT(character) DO UPDATE SET total_cards = 0, chips = 0
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to register character")?;

        let id = CharacterId(row.get("id"));
        self.clear_holdings(conn, id).await?;
        Ok(id)
    }

    /// Remove every character and every holding.
    pub async fn reset_stats(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query("DELETE FROM holdings")
            .execute(&mut *conn)
            .await
            .context("Failed to clear holdings")?;
        sqlx::query("DELETE FROM stats")
            .execute(&mut *conn)
            .await
            .context("Failed to clear stats")?;
        Ok(())
    }

    pub async fn get_stats(
        &self,
        conn: &mut SqliteConnection,
        id: CharacterId,
    ) -> Result<CharacterStats> {
        let row = sqlx::query("SELECT character, total_cards, chips FROM stats WHERE id = ?")
            .bind(id.0)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to fetch stats")?;
        Ok(Self::row_to_stats(&row))
    }

    /// List all stats rows ordered by character name.
    pub async fn list_stats(&self, conn: &mut SqliteConnection) -> Result<Vec<CharacterStats>> {
        let rows = sqlx::query("SELECT character, total_cards, chips FROM stats ORDER BY character")
            .fetch_all(&mut *conn)
            .await
            .context("Failed to list stats")?;
        Ok(rows.iter().map(Self::row_to_stats).collect())
    }

    /// Recompute one character's cached card total from its holdings.
    pub async fn refresh_total_cards(
        &self,
        conn: &mut SqliteConnection,
        id: CharacterId,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE stats
            SET total_cards = (SELECT COUNT(*) FROM holdings WHERE character_id = stats.id)
            WHERE id = ?
            RETURNING total_cards
            "#,
        )
        .bind(id.0)
        .fetch_one(&mut *conn)
        .await
        .context("Failed to refresh card total")?;
        Ok(row.get("total_cards"))
    }

    /// Recompute every character's cached card total. Returns rows updated.
    pub async fn refresh_all_totals(&self, conn: &mut SqliteConnection) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE stats
            SET total_cards = (SELECT COUNT(*) FROM holdings WHERE character_id = stats.id)
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to refresh card totals")?;
        Ok(result.rows_affected())
    }

    pub async fn get_chips(&self, conn: &mut SqliteConnection, id: CharacterId) -> Result<i64> {
        let row = sqlx::query("SELECT chips FROM stats WHERE id = ?")
            .bind(id.0)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to fetch chips")?;
        Ok(row.get("chips"))
    }

    pub async fn set_chips(
        &self,
        conn: &mut SqliteConnection,
        id: CharacterId,
        chips: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE stats SET chips = ? WHERE id = ?")
            .bind(chips)
            .bind(id.0)
            .execute(&mut *conn)
            .await
            .context("Failed to update chips")?;
        Ok(())
    }

    // ========================
    // Holdings
    // ========================

    /// Append a card copy to a character. Returns the new holding id.
    pub async fn insert_holding(
        &self,
        conn: &mut SqliteConnection,
        id: CharacterId,
        card: Card,
    ) -> Result<i64> {
        let row = sqlx::query(
            "INSERT INTO holdings (character_id, rank, suit) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(id.0)
        .bind(card.rank.code())
        .bind(card.suit.symbol())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to insert holding")?;
        Ok(row.get("id"))
    }

    /// List a character's holdings in deal order, optionally only the first `limit`.
    pub async fn list_holdings(
        &self,
        conn: &mut SqliteConnection,
        id: CharacterId,
        limit: Option<i64>,
    ) -> Result<Vec<Holding>> {
        // SQLite treats a negative LIMIT as "no limit"
        let rows = sqlx::query(
            r#"
            SELECT id, rank, suit
            FROM holdings
            WHERE character_id = ?
            ORDER BY id
            LIMIT ?
            "#,
        )
        .bind(id.0)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list holdings")?;

        rows.iter().map(Self::row_to_holding).collect()
    }

    pub async fn count_holdings(&self, conn: &mut SqliteConnection, id: CharacterId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM holdings WHERE character_id = ?")
            .bind(id.0)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to count holdings")?;
        Ok(row.get("count"))
    }

    /// Delete a character's holdings up to and including `max_id`.
    pub async fn delete_holdings_through(
        &self,
        conn: &mut SqliteConnection,
        id: CharacterId,
        max_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM holdings WHERE character_id = ? AND id <= ?")
            .bind(id.0)
            .bind(max_id)
            .execute(&mut *conn)
            .await
            .context("Failed to delete holdings")?;
        Ok(result.rows_affected())
    }

    pub async fn clear_holdings(&self, conn: &mut SqliteConnection, id: CharacterId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM holdings WHERE character_id = ?")
            .bind(id.0)
            .execute(&mut *conn)
            .await
            .context("Failed to clear holdings")?;
        Ok(result.rows_affected())
    }

    /// Actual holdings count per registered character.
    pub async fn count_all_holdings(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<HashMap<String, i64>> {
        let rows = sqlx::query(
            r#"
            SELECT s.character as character, COUNT(h.id) as count
            FROM stats s
            LEFT JOIN holdings h ON h.character_id = s.id
            GROUP BY s.id
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .context("Failed to count holdings")?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("character"), row.get::<i64, _>("count")))
            .collect())
    }

    /// Every holding of every character, grouped by character name then deal order.
    pub async fn list_all_holdings(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<(String, Holding)>> {
        let rows = sqlx::query(
            r#"
            SELECT s.character as character, h.id as id, h.rank as rank, h.suit as suit
            FROM holdings h
            JOIN stats s ON s.id = h.character_id
            ORDER BY s.character, h.id
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list all holdings")?;

        rows.iter()
            .map(|row| -> Result<(String, Holding)> {
                Ok((row.get("character"), Self::row_to_holding(row)?))
            })
            .collect()
    }

    // ========================
    // Journal
    // ========================

    /// Append a journal entry, assigning its sequence number.
    pub async fn save_entry(&self, conn: &mut SqliteConnection, entry: &mut LedgerEntry) -> Result<()> {
        let row = sqlx::query(
            r#"
            INSERT INTO journal (id, kind, from_character, to_character, quantity, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING sequence
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.kind.as_str())
        .bind(&entry.from_character)
        .bind(&entry.to_character)
        .bind(entry.quantity)
        .bind(entry.recorded_at.to_rfc3339())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to save journal entry")?;

        entry.sequence = row.get("sequence");
        Ok(())
    }

    /// List journal entries, newest first.
    pub async fn list_entries(
        &self,
        conn: &mut SqliteConnection,
        limit: Option<i64>,
    ) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT sequence, id, kind, from_character, to_character, quantity, recorded_at
            FROM journal
            ORDER BY sequence DESC
            LIMIT ?
            "#,
        )
        .bind(limit.unwrap_or(-1))
        .fetch_all(&mut *conn)
        .await
        .context("Failed to list journal entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    fn row_to_card(row: &sqlx::sqlite::SqliteRow) -> Result<Card> {
        let rank_str: String = row.get("rank");
        let suit_str: String = row.get("suit");

        Ok(Card::new(
            Rank::from_code(&rank_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid rank: {}", rank_str))?,
            Suit::from_symbol(&suit_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid suit: {}", suit_str))?,
        ))
    }

    fn row_to_holding(row: &sqlx::sqlite::SqliteRow) -> Result<Holding> {
        Ok(Holding {
            id: row.get("id"),
            card: Self::row_to_card(row)?,
        })
    }

    fn row_to_stats(row: &sqlx::sqlite::SqliteRow) -> CharacterStats {
        CharacterStats {
            character: row.get("character"),
            total_cards: row.get("total_cards"),
            chips: row.get("chips"),
        }
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid journal entry ID")?,
            sequence: row.get("sequence"),
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry kind: {}", kind_str))?,
            from_character: row.get("from_character"),
            to_character: row.get("to_character"),
            quantity: row.get("quantity"),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
