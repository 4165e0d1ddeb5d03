mod common;

use anyhow::Result;
use card_ledger::domain::EntryKind;
use card_ledger::io::{render_holdings, render_table, Exporter, StoreSnapshot};
use common::{shuffled_ledger, test_ledger};

#[tokio::test]
async fn test_deal_two_hands_end_to_end() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_custom("userone").await?;

    ledger.shuffle_cards_dealer().await?;
    ledger.card_transfer("dealer", "player", 2).await?;
    ledger.card_transfer("dealer", "userone", 2).await?;
    ledger.update_stats().await?;

    assert_eq!(ledger.get_card_amount("dealer").await?, Some(48));
    assert_eq!(ledger.get_card_amount("player").await?, Some(2));
    assert_eq!(ledger.get_card_amount("userone").await?, Some(2));
    assert_eq!(ledger.get_card_amount("nonexistent").await?, None);

    let stats = ledger.list_stats().await?;
    let totals: Vec<(&str, i64)> = stats
        .iter()
        .map(|s| (s.character.as_str(), s.total_cards))
        .collect();
    assert_eq!(totals, vec![("dealer", 48), ("player", 2), ("userone", 2)]);

    let revealed = ledger.reveal("dealer", 5).await?;
    assert_eq!(revealed.len(), 5);
    Ok(())
}

#[tokio::test]
async fn test_get_card_amount_for_invalid_name_is_not_found() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    assert_eq!(ledger.get_card_amount("no such name!").await?, None);
    Ok(())
}

#[tokio::test]
async fn test_journal_records_operations_newest_first() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(30).await?;
    ledger.card_transfer("dealer", "player", 3).await?;
    ledger.set_chips("dealer", 200).await?;
    ledger.chips_transfer("dealer", "player", 50).await?;

    let entries = ledger.history(None).await?;
    let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            EntryKind::Chips,
            EntryKind::Balance,
            EntryKind::Cards,
            EntryKind::Shuffle
        ]
    );

    assert_eq!(entries[0].from_character, "dealer");
    assert_eq!(entries[0].to_character, "player");
    assert_eq!(entries[0].quantity, 50);
    assert_eq!(entries[1].quantity, 200);
    assert_eq!(entries[2].quantity, 3);
    assert_eq!(entries[3].quantity, 52);
    assert!(entries.windows(2).all(|w| w[0].sequence > w[1].sequence));

    let limited = ledger.history(Some(2)).await?;
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].id, entries[0].id);
    Ok(())
}

#[tokio::test]
async fn test_failed_operations_leave_no_journal_entry() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(31).await?;

    assert!(ledger.card_transfer("player", "dealer", 1).await.is_err());
    assert!(ledger.chips_transfer("player", "dealer", 1).await.is_err());

    assert_eq!(ledger.history(None).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_integrity_flags_duplicate_copies_after_reshuffle() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(32).await?;
    ledger.card_transfer("dealer", "player", 2).await?;
    assert!(ledger.check_integrity().await?.is_healthy());

    // The dealer gets a full deck again while the player still holds two
    ledger.shuffle_cards_dealer_seeded(33).await?;

    let report = ledger.check_integrity().await?;
    assert!(!report.is_healthy());
    assert_eq!(report.total_holdings, 54);
    assert_eq!(report.duplicates.len(), 2);
    assert!(report.drift.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_render_table_lists_every_character() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(34).await?;
    ledger.create_custom("userone").await?;
    ledger.card_transfer("dealer", "userone", 2).await?;

    let hands = ledger.list_hands().await?;
    let names: Vec<&str> = hands.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["dealer", "player", "userone"]);

    let out = render_table(&hands);
    assert!(out.contains("dealer (50 cards)"));
    assert!(out.contains("player (0 cards)\n(no cards)"));
    assert!(out.contains("userone (2 cards)"));

    let hand = ledger.get_hand("userone").await?;
    let grid = ledger.render_hand("userone").await?;
    assert_eq!(grid, render_holdings(&hand));
    let cell_line = grid.lines().nth(1).unwrap();
    assert!(cell_line.contains(&hand[0].card.code()));
    assert!(cell_line.contains(&hand[1].card.code()));
    Ok(())
}

#[tokio::test]
async fn test_export_stats_csv() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(35).await?;
    ledger.card_transfer("dealer", "player", 5).await?;
    ledger.set_chips("player", 40).await?;

    let mut buf = Vec::new();
    let count = Exporter::new(&ledger).export_stats_csv(&mut buf).await?;
    assert_eq!(count, 2);

    let csv = String::from_utf8(buf)?;
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines, vec!["character,total_cards,chips", "dealer,47,0", "player,5,40"]);
    Ok(())
}

#[tokio::test]
async fn test_export_holdings_csv_in_deal_order() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(36).await?;
    ledger.card_transfer("dealer", "player", 2).await?;
    let player_hand = ledger.get_hand("player").await?;

    let mut buf = Vec::new();
    let count = Exporter::new(&ledger)
        .export_holdings_csv(&mut buf)
        .await?;
    assert_eq!(count, 52);

    let csv = String::from_utf8(buf)?;
    let player_lines: Vec<&str> = csv.lines().filter(|l| l.starts_with("player,")).collect();
    assert_eq!(player_lines.len(), 2);
    assert_eq!(
        player_lines[0],
        format!(
            "player,{},{},{}",
            player_hand[0].id,
            player_hand[0].card.rank.code(),
            player_hand[0].card.suit.symbol()
        )
    );
    Ok(())
}

#[tokio::test]
async fn test_export_full_json_snapshot() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(37).await?;
    ledger.card_transfer("dealer", "player", 4).await?;

    let mut buf = Vec::new();
    let snapshot = Exporter::new(&ledger).export_full_json(&mut buf).await?;
    assert_eq!(snapshot.cards.len(), 52);
    assert_eq!(snapshot.holdings.len(), 52);
    assert_eq!(snapshot.journal.len(), 2);

    let parsed: StoreSnapshot = serde_json::from_slice(&buf)?;
    assert_eq!(parsed.stats, snapshot.stats);
    assert_eq!(parsed.journal[0].kind, EntryKind::Shuffle);
    Ok(())
}

#[tokio::test]
async fn test_list_hands_groups_interleaved_deals() -> Result<()> {
    let (ledger, _temp) = shuffled_ledger(38).await?;
    ledger.create_custom("userone").await?;
    ledger.card_transfer("dealer", "player", 2).await?;
    ledger.card_transfer("dealer", "userone", 3).await?;
    ledger.card_transfer("dealer", "player", 1).await?;

    let hands = ledger.list_hands().await?;
    assert_eq!(hands.len(), 3);
    for (name, hand) in &hands {
        assert_eq!(*hand, ledger.get_hand(name).await?);
    }
    let sizes: Vec<usize> = hands.iter().map(|(_, h)| h.len()).collect();
    assert_eq!(sizes, vec![46, 3, 3]);
    Ok(())
}
