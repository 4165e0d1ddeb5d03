mod common;

use anyhow::Result;
use card_ledger::application::LedgerError;
use common::test_ledger;

#[tokio::test]
async fn test_new_characters_have_no_chips() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    assert_eq!(ledger.get_chips("dealer").await?, 0);
    assert_eq!(ledger.get_chips("player").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_set_chips_overwrites_balance() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger.set_chips("player", 250).await?;
    ledger.set_chips("player", 100).await?;

    assert_eq!(ledger.get_chips("player").await?, 100);
    Ok(())
}

#[tokio::test]
async fn test_set_negative_chips_rejected() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    let result = ledger.set_chips("player", -1).await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    Ok(())
}

#[tokio::test]
async fn test_add_chips_overwrites_balance() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    ledger.set_chips("player", 50).await?;
    ledger.add_chips("player", 100).await?;
    assert_eq!(ledger.get_chips("player").await?, 100);

    ledger.add_chips("player", 0).await?;
    assert_eq!(ledger.get_chips("player").await?, 0);

    let result = ledger.add_chips("player", -5).await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    assert_eq!(ledger.get_chips("player").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_adjust_chips_applies_delta() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;

    assert_eq!(ledger.adjust_chips("player", 100).await?, 100);
    assert_eq!(ledger.adjust_chips("player", -40).await?, 60);

    let result = ledger.adjust_chips("player", -61).await;
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientChips {
            balance: 60,
            requested: 61,
            ..
        })
    ));
    assert_eq!(ledger.get_chips("player").await?, 60);
    Ok(())
}

#[tokio::test]
async fn test_chips_transfer_conserves_total() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.set_chips("dealer", 1000).await?;
    ledger.set_chips("player", 50).await?;

    let result = ledger.chips_transfer("dealer", "player", 300).await?;

    assert_eq!(result.from_balance, 700);
    assert_eq!(result.to_balance, 350);
    assert_eq!(ledger.get_chips("dealer").await?, 700);
    assert_eq!(ledger.get_chips("player").await?, 350);
    assert_eq!(result.from_balance + result.to_balance, 1050);
    Ok(())
}

#[tokio::test]
async fn test_chips_transfer_entire_balance() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.set_chips("player", 80).await?;

    ledger.chips_transfer("player", "dealer", 80).await?;

    assert_eq!(ledger.get_chips("player").await?, 0);
    assert_eq!(ledger.get_chips("dealer").await?, 80);
    Ok(())
}

#[tokio::test]
async fn test_insufficient_chips_changes_nothing() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.set_chips("dealer", 100).await?;
    ledger.set_chips("player", 10).await?;

    let result = ledger.chips_transfer("player", "dealer", 11).await;
    match result {
        Err(LedgerError::InsufficientChips {
            character,
            balance,
            requested,
        }) => {
            assert_eq!(character, "player");
            assert_eq!(balance, 10);
            assert_eq!(requested, 11);
        }
        other => panic!("expected InsufficientChips, got {:?}", other),
    }

    assert_eq!(ledger.get_chips("dealer").await?, 100);
    assert_eq!(ledger.get_chips("player").await?, 10);
    Ok(())
}

#[tokio::test]
async fn test_negative_chip_transfer_rejected() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.set_chips("dealer", 100).await?;

    let result = ledger.chips_transfer("player", "dealer", -50).await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    assert_eq!(ledger.get_chips("dealer").await?, 100);
    assert_eq!(ledger.get_chips("player").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_chip_transfer_unknown_character() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.set_chips("dealer", 100).await?;

    let result = ledger.chips_transfer("dealer", "ghost", 10).await;
    assert!(matches!(result, Err(LedgerError::UnknownCharacter(_))));
    assert_eq!(ledger.get_chips("dealer").await?, 100);

    let result = ledger.get_chips("ghost").await;
    assert!(matches!(result, Err(LedgerError::UnknownCharacter(_))));
    Ok(())
}

#[tokio::test]
async fn test_chip_transfer_to_self_rejected() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.set_chips("dealer", 100).await?;

    let result = ledger.chips_transfer("dealer", "dealer", 10).await;
    assert!(matches!(result, Err(LedgerError::SameCharacter(_))));
    Ok(())
}

#[tokio::test]
async fn test_custom_characters_carry_chips() -> Result<()> {
    let (ledger, _temp) = test_ledger().await?;
    ledger.create_custom("userone").await?;
    ledger.set_chips("player", 500).await?;

    ledger.chips_transfer("player", "userone", 125).await?;

    let stats = ledger.get_stats("userone").await?;
    assert_eq!(stats.chips, 125);
    assert_eq!(stats.total_cards, 0);
    Ok(())
}
