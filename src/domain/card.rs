use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of cards in the canonical deck.
pub const DECK_SIZE: usize = 52;

/// Canonical card ids run from 1 to 52.
pub type CardId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Ace,
    King,
    Queen,
    Jack,
    Ten,
    Nine,
    Eight,
    Seven,
    Six,
    Five,
    Four,
    Three,
    Two,
}

impl Rank {
    /// Ranks in canonical deck order: royals first, then 10 down to 2.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::King,
        Rank::Queen,
        Rank::Jack,
        Rank::Ten,
        Rank::Nine,
        Rank::Eight,
        Rank::Seven,
        Rank::Six,
        Rank::Five,
        Rank::Four,
        Rank::Three,
        Rank::Two,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::King => "K",
            Rank::Queen => "Q",
            Rank::Jack => "J",
            Rank::Ten => "10",
            Rank::Nine => "9",
            Rank::Eight => "8",
            Rank::Seven => "7",
            Rank::Six => "6",
            Rank::Five => "5",
            Rank::Four => "4",
            Rank::Three => "3",
            Rank::Two => "2",
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" | "ACE" => Some(Rank::Ace),
            "K" | "KING" => Some(Rank::King),
            "Q" | "QUEEN" => Some(Rank::Queen),
            "J" | "JACK" => Some(Rank::Jack),
            "10" | "T" => Some(Rank::Ten),
            "9" => Some(Rank::Nine),
            "8" => Some(Rank::Eight),
            "7" => Some(Rank::Seven),
            "6" => Some(Rank::Six),
            "5" => Some(Rank::Five),
            "4" => Some(Rank::Four),
            "3" => Some(Rank::Three),
            "2" => Some(Rank::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Heart,
    Diamond,
    Club,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Heart => "♥",
            Suit::Diamond => "♦",
            Suit::Club => "♣",
            Suit::Spade => "♠",
        }
    }

    /// Accepts the stored symbol as well as the suit name.
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim() {
            "♥" => Some(Suit::Heart),
            "♦" => Some(Suit::Diamond),
            "♣" => Some(Suit::Club),
            "♠" => Some(Suit::Spade),
            other => match other.to_lowercase().as_str() {
                "heart" | "hearts" | "h" => Some(Suit::Heart),
                "diamond" | "diamonds" | "d" => Some(Suit::Diamond),
                "club" | "clubs" | "c" => Some(Suit::Club),
                "spade" | "spades" | "s" => Some(Suit::Spade),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A rank/suit pair. Holdings carry copies of these, never references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Short code such as `A♥` or `10♠`.
    pub fn code(&self) -> String {
        format!("{}{}", self.rank.code(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// One of the 52 fixed reference cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalCard {
    pub id: CardId,
    pub card: Card,
}

/// Build the canonical deck with ids 1..=52.
///
/// Ordering is by rank (A, K, Q, J, 10 .. 2), and by suit within a rank
/// (heart, diamond, club, spade), so id 1 is `A♥` and id 52 is `2♠`.
pub fn canonical_deck() -> Vec<CanonicalCard> {
    Rank::ALL
        .iter()
        .flat_map(|&rank| Suit::ALL.iter().map(move |&suit| Card::new(rank, suit)))
        .zip(1..)
        .map(|(card, id)| CanonicalCard { id, card })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_canonical_deck_has_52_unique_cards() {
        let deck = canonical_deck();
        assert_eq!(deck.len(), DECK_SIZE);

        let ids: HashSet<CardId> = deck.iter().map(|c| c.id).collect();
        assert_eq!(ids, (1..=52).collect());

        let cards: HashSet<Card> = deck.iter().map(|c| c.card).collect();
        assert_eq!(cards.len(), DECK_SIZE);
    }

    #[test]
    fn test_canonical_order() {
        let deck = canonical_deck();
        assert_eq!(deck[0].card, Card::new(Rank::Ace, Suit::Heart));
        assert_eq!(deck[3].card, Card::new(Rank::Ace, Suit::Spade));
        assert_eq!(deck[4].card, Card::new(Rank::King, Suit::Heart));
        assert_eq!(deck[51].card, Card::new(Rank::Two, Suit::Spade));
    }

    #[test]
    fn test_rank_code_roundtrip() {
        for rank in Rank::ALL {
            assert_eq!(Rank::from_code(rank.code()), Some(rank));
        }
        assert_eq!(Rank::from_code("ace"), Some(Rank::Ace));
        assert_eq!(Rank::from_code("11"), None);
    }

    #[test]
    fn test_suit_parsing() {
        for suit in Suit::ALL {
            assert_eq!(Suit::from_symbol(suit.symbol()), Some(suit));
        }
        assert_eq!(Suit::from_symbol("Spade"), Some(Suit::Spade));
        assert_eq!(Suit::from_symbol("x"), None);
    }

    #[test]
    fn test_card_code() {
        assert_eq!(Card::new(Rank::Ten, Suit::Club).code(), "10♣");
        assert_eq!(Card::new(Rank::Queen, Suit::Diamond).to_string(), "Q♦");
    }
}
